use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{MetricsError, Result};
use crate::core::record::ReadReferencePair;
use crate::core::types::{LevelKey, LevelKind};

/// The sample and library declared for a read group in the `@RG` header lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadGroupInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
}

impl ReadGroupInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sample: None,
            library: None,
        }
    }

    #[must_use]
    pub fn with_sample(mut self, sample: impl Into<String>) -> Self {
        self.sample = Some(sample.into());
        self
    }

    #[must_use]
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }
}

/// Which aggregation levels a collector reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    levels: Vec<LevelKind>,
}

impl CollectorConfig {
    /// Levels are de-duplicated and kept in `ALL, SAMPLE, LIBRARY, READ_GROUP` order.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidConfiguration` if no level is given.
    pub fn new(levels: impl IntoIterator<Item = LevelKind>) -> Result<Self> {
        let mut levels: Vec<LevelKind> = levels.into_iter().collect();
        levels.sort_unstable();
        levels.dedup();

        if levels.is_empty() {
            return Err(MetricsError::invalid(
                "levels",
                "at least one accumulation level must be enabled",
            ));
        }

        Ok(Self { levels })
    }

    #[must_use]
    pub fn levels(&self) -> &[LevelKind] {
        &self.levels
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            levels: vec![LevelKind::All],
        }
    }
}

/// Derives the aggregation buckets a record belongs to.
///
/// Levels whose identifier is missing from the record or its read group are
/// silently skipped, so partial metadata yields fewer keys rather than an error.
#[derive(Debug, Clone)]
pub struct GroupKeyExtractor {
    config: CollectorConfig,
    read_groups: HashMap<String, ReadGroupInfo>,
}

impl GroupKeyExtractor {
    pub fn new(config: CollectorConfig, read_groups: impl IntoIterator<Item = ReadGroupInfo>) -> Self {
        let read_groups = read_groups
            .into_iter()
            .map(|rg| (rg.id.clone(), rg))
            .collect();
        Self {
            config,
            read_groups,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Keys for `pair`, in level order
    #[must_use]
    pub fn keys_for(&self, pair: &ReadReferencePair<'_>) -> Vec<LevelKey> {
        let read_group_id = pair.read.read_group.as_deref();
        let read_group = read_group_id.and_then(|id| self.read_groups.get(id));

        if let (Some(id), None) = (read_group_id, read_group) {
            debug!(read = %pair.read.name, read_group = %id, "Read group not declared in header");
        }

        let mut keys = Vec::with_capacity(self.config.levels.len());
        for kind in &self.config.levels {
            let key = match kind {
                LevelKind::All => Some(LevelKey::All),
                LevelKind::Sample => read_group
                    .and_then(|rg| rg.sample.clone())
                    .map(LevelKey::Sample),
                LevelKind::Library => read_group
                    .and_then(|rg| rg.library.clone())
                    .map(LevelKey::Library),
                LevelKind::ReadGroup => read_group_id.map(|id| LevelKey::ReadGroup(id.to_string())),
            };
            keys.extend(key);
        }
        keys
    }
}
