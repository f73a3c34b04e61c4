//! # flow-metrics
//!
//! A library for computing flow-order bias and related QC metrics from aligned
//! reads, at several aggregation levels in a single pass.
//!
//! Flow-based sequencers extend a read by cycling through a fixed order of
//! nucleotide flows; a homopolymer run is consumed by one flow. How far a
//! template gets in a given number of flows therefore depends on its sequence,
//! and reads are over- or under-represented accordingly. `flow-metrics`
//! measures that bias against the genome-wide expectation.
//!
//! ## Features
//!
//! - **Flow scan**: Bases consumed from a template by a flow order
//! - **Multi-level collection**: One accumulator per whole file, sample,
//!   library, and read group, all fed from one pass
//! - **Metric families**: Flow bias, GC bias, and an alignment summary
//! - **Two-phase design**: Genome-wide window tables are built before any read
//!   is processed
//!
//! ## Example
//!
//! ```rust
//! use flow_metrics::{FlowConfig, FlowScanner};
//!
//! let config = FlowConfig::new("TGCA", 4).unwrap();
//! let scanner = FlowScanner::new(config);
//!
//! // T consumes the run TT, then G, C, and A one base each
//! assert_eq!(scanner.scan(b"TTGCAC"), 5);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Flow scan, records, level keys, and errors
//! - [`collector`]: Multi-level aggregation engine
//! - [`metrics`]: Metric families, reference profile, and output
//! - [`parsing`]: FASTA and SAM/BAM readers
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod collector;
pub mod core;
pub mod metrics;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use collector::{CollectorConfig, GroupKeyExtractor, MetricAccumulator, MultiLevelCollector};
pub use core::error::{MalformedRecord, MetricsError};
pub use core::flow::{scan_length, FlowConfig, FlowOrder, FlowScanner};
pub use core::record::{AlignedRead, ReadReferencePair, ReferenceWindowSource};
pub use core::types::*;
pub use metrics::profile::ReferenceProfile;
