//! Multi-level metric aggregation.
//!
//! This module provides the single-pass engine that computes the same metric at
//! several aggregation levels at once:
//!
//! - [`GroupKeyExtractor`]: Decides which levels a record belongs to
//! - [`LevelRegistry`]: Lazily creates and owns one accumulator per level key
//! - [`MetricAccumulator`]: The capability every metric family implements
//! - [`MultiLevelCollector`]: Drives records through the above and finishes
//!   every accumulator at the end
//!
//! ## Example
//!
//! ```rust
//! use flow_metrics::collector::{CollectorConfig, GroupKeyExtractor, MultiLevelCollector, ReadGroupInfo};
//! use flow_metrics::core::record::{AlignedRead, ReadReferencePair};
//! use flow_metrics::core::types::LevelKind;
//! use flow_metrics::metrics::summary::AlignmentSummaryAccumulator;
//!
//! let config = CollectorConfig::new([LevelKind::All, LevelKind::Sample]).unwrap();
//! let extractor = GroupKeyExtractor::new(config, vec![ReadGroupInfo::new("rg1").with_sample("s1")]);
//! let mut collector = MultiLevelCollector::new(extractor, |_| AlignmentSummaryAccumulator::default());
//!
//! let read = AlignedRead::new("r1", b"ACGT".to_vec()).with_read_group("rg1");
//! collector.consume(&ReadReferencePair::new(&read, None));
//!
//! let metrics = collector.finish();
//! assert_eq!(metrics.len(), 2);
//! assert_eq!(metrics[1].metric.total_reads, 1);
//! ```

pub mod accumulator;
pub mod engine;
pub mod keys;
pub mod registry;

pub use accumulator::MetricAccumulator;
pub use engine::{CollectorDiagnostics, LevelMetric, MultiLevelCollector};
pub use keys::{CollectorConfig, GroupKeyExtractor, ReadGroupInfo};
pub use registry::LevelRegistry;
