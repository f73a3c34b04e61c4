//! Metric families and the suite that runs them together.
//!
//! Each family is a [`MetricAccumulator`] implementation driven by its own
//! [`MultiLevelCollector`], so every family is reported at every enabled
//! level from a single pass over the alignments.
//!
//! - [`flow_bias`]: read-start distribution over template flow length
//! - [`gc_bias`]: read-start distribution over window GC content
//! - [`summary`]: read counts that need no reference
//!
//! Bias families need genome-wide window tables from
//! [`profile::ReferenceProfile`], which must be prepared before the suite is
//! built.

pub mod flow_bias;
pub mod gc_bias;
pub mod profile;
pub mod summary;
pub mod writer;

use serde::{Deserialize, Serialize};

use crate::collector::{CollectorDiagnostics, GroupKeyExtractor, LevelMetric, MultiLevelCollector};
use crate::core::error::{MetricsError, Result};
use crate::core::record::{AlignedRead, ReadReferencePair};

use self::flow_bias::{FlowBiasAccumulator, FlowBiasMetric};
use self::gc_bias::{GcBiasAccumulator, GcBiasMetric};
use self::profile::ReferenceProfile;
use self::summary::{AlignmentSummaryAccumulator, AlignmentSummaryMetric};

/// A finished metric that can be written as a named section
pub trait Metric: Serialize {
    /// Human readable name used as the section title in text and TSV output
    fn metric_name() -> &'static str;
}

/// Reads that count toward bias metrics: aligned primary records that pass
/// vendor quality checks.
pub(crate) fn is_bias_candidate(read: &AlignedRead) -> bool {
    read.is_mapped() && read.flags.is_primary() && !read.flags.qc_fail
}

/// Observed over expected read starts for one bin.
///
/// `(read_starts / windows) / (total_reads / total_windows)`, or `0.0` when any
/// denominator is zero.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn normalized_coverage(
    read_starts: u64,
    windows: u64,
    total_reads: u64,
    total_windows: u64,
) -> f64 {
    if windows == 0 || total_reads == 0 || total_windows == 0 {
        return 0.0;
    }
    let mean = total_reads as f64 / total_windows as f64;
    (read_starts as f64 / windows as f64) / mean
}

/// Metric families that can be requested on the command line
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MetricFamily {
    FlowBias,
    GcBias,
    Summary,
}

/// Finished metrics of one family, one entry per level
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", content = "metrics", rename_all = "snake_case")]
pub enum FamilyMetrics {
    FlowBias(Vec<LevelMetric<FlowBiasMetric>>),
    GcBias(Vec<LevelMetric<GcBiasMetric>>),
    Summary(Vec<LevelMetric<AlignmentSummaryMetric>>),
}

impl FamilyMetrics {
    #[must_use]
    pub fn family(&self) -> MetricFamily {
        match self {
            Self::FlowBias(_) => MetricFamily::FlowBias,
            Self::GcBias(_) => MetricFamily::GcBias,
            Self::Summary(_) => MetricFamily::Summary,
        }
    }

    /// Number of levels reported
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::FlowBias(m) => m.len(),
            Self::GcBias(m) => m.len(),
            Self::Summary(m) => m.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One collector per requested family, all fed from the same record stream
pub struct MetricSuite {
    extractor: GroupKeyExtractor,
    flow_bias: Option<MultiLevelCollector<FlowBiasAccumulator>>,
    gc_bias: Option<MultiLevelCollector<GcBiasAccumulator>>,
    summary: Option<MultiLevelCollector<AlignmentSummaryAccumulator>>,
}

impl MetricSuite {
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidConfiguration` if no family is requested,
    /// or if a bias family is requested but `profile` lacks its window table.
    pub fn new(
        families: &[MetricFamily],
        extractor: &GroupKeyExtractor,
        profile: &ReferenceProfile,
    ) -> Result<Self> {
        if families.is_empty() {
            return Err(MetricsError::invalid(
                "metrics",
                "at least one metric family must be requested",
            ));
        }

        let mut suite = Self {
            extractor: extractor.clone(),
            flow_bias: None,
            gc_bias: None,
            summary: None,
        };

        if families.contains(&MetricFamily::FlowBias) {
            let windows = profile.flow().ok_or_else(|| {
                MetricsError::invalid(
                    "flow-order",
                    "flow bias needs a flow order and flow count",
                )
            })?;
            suite.flow_bias = Some(MultiLevelCollector::new(extractor.clone(), move |_| {
                FlowBiasAccumulator::new(windows.clone())
            }));
        }

        if families.contains(&MetricFamily::GcBias) {
            let windows = profile.gc().ok_or_else(|| {
                MetricsError::invalid("gc-window", "GC bias needs a prepared GC window table")
            })?;
            suite.gc_bias = Some(MultiLevelCollector::new(extractor.clone(), move |_| {
                GcBiasAccumulator::new(windows.clone())
            }));
        }

        if families.contains(&MetricFamily::Summary) {
            suite.summary = Some(MultiLevelCollector::new(extractor.clone(), |_| {
                AlignmentSummaryAccumulator::default()
            }));
        }

        Ok(suite)
    }

    /// Feed one record to every family; its keys are derived once and shared
    pub fn consume(&mut self, pair: &ReadReferencePair<'_>) {
        let keys = self.extractor.keys_for(pair);
        if let Some(collector) = self.flow_bias.as_mut() {
            collector.consume_keyed(pair, &keys);
        }
        if let Some(collector) = self.gc_bias.as_mut() {
            collector.consume_keyed(pair, &keys);
        }
        if let Some(collector) = self.summary.as_mut() {
            collector.consume_keyed(pair, &keys);
        }
    }

    /// Diagnostics per active family
    #[must_use]
    pub fn diagnostics(&self) -> Vec<(MetricFamily, CollectorDiagnostics)> {
        let mut diagnostics = Vec::new();
        if let Some(c) = &self.flow_bias {
            diagnostics.push((MetricFamily::FlowBias, c.diagnostics()));
        }
        if let Some(c) = &self.gc_bias {
            diagnostics.push((MetricFamily::GcBias, c.diagnostics()));
        }
        if let Some(c) = &self.summary {
            diagnostics.push((MetricFamily::Summary, c.diagnostics()));
        }
        diagnostics
    }

    /// Finish every family, in `flow bias, GC bias, summary` order
    #[must_use]
    pub fn finish(self) -> Vec<FamilyMetrics> {
        let mut results = Vec::new();
        if let Some(c) = self.flow_bias {
            results.push(FamilyMetrics::FlowBias(c.finish()));
        }
        if let Some(c) = self.gc_bias {
            results.push(FamilyMetrics::GcBias(c.finish()));
        }
        if let Some(c) = self.summary {
            results.push(FamilyMetrics::Summary(c.finish()));
        }
        results
    }
}
