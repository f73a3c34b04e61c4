use serde::{Deserialize, Serialize};

/// A dimension at which metrics are aggregated
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LevelKind {
    /// Every record, unconditionally
    All,
    /// Records sharing the `SM` of their read group
    Sample,
    /// Records sharing the `LB` of their read group
    Library,
    /// Records sharing an `RG` tag
    ReadGroup,
}

impl std::fmt::Display for LevelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "ALL"),
            Self::Sample => write!(f, "SAMPLE"),
            Self::Library => write!(f, "LIBRARY"),
            Self::ReadGroup => write!(f, "READ_GROUP"),
        }
    }
}

/// Identifies one aggregation bucket: a level kind plus the identifier within it.
///
/// Ordering is by kind first and identifier second, matching the declaration
/// order of [`LevelKind`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "level", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LevelKey {
    All,
    Sample(String),
    Library(String),
    ReadGroup(String),
}

impl LevelKey {
    #[must_use]
    pub fn kind(&self) -> LevelKind {
        match self {
            Self::All => LevelKind::All,
            Self::Sample(_) => LevelKind::Sample,
            Self::Library(_) => LevelKind::Library,
            Self::ReadGroup(_) => LevelKind::ReadGroup,
        }
    }

    /// The identifier within the level, `None` for [`LevelKey::All`]
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Sample(id) | Self::Library(id) | Self::ReadGroup(id) => Some(id),
        }
    }
}

impl std::fmt::Display for LevelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.identifier() {
            Some(id) => write!(f, "{}:{id}", self.kind()),
            None => write!(f, "{}", self.kind()),
        }
    }
}
