//! Core data types for multi-level metric collection.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`LevelKind`], [`LevelKey`]: Aggregation levels and the buckets within them
//! - [`AlignedRead`], [`ReadReferencePair`]: Decoded records and their reference context
//! - [`ReferenceWindowSource`]: Access to reference bases by contig name
//! - [`FlowOrder`], [`FlowConfig`], [`FlowScanner`]: Flow-order scanning
//! - [`MetricsError`], [`MalformedRecord`]: Error types
//!
//! ## Aggregation Levels
//!
//! | Level        | Identifier                      |
//! |--------------|---------------------------------|
//! | `ALL`        | none                            |
//! | `SAMPLE`     | `SM` of the read's `@RG` line   |
//! | `LIBRARY`    | `LB` of the read's `@RG` line   |
//! | `READ_GROUP` | `RG` tag on the record          |
//!
//! [`LevelKind`]: types::LevelKind
//! [`LevelKey`]: types::LevelKey
//! [`AlignedRead`]: record::AlignedRead
//! [`ReadReferencePair`]: record::ReadReferencePair
//! [`ReferenceWindowSource`]: record::ReferenceWindowSource
//! [`FlowOrder`]: flow::FlowOrder
//! [`FlowConfig`]: flow::FlowConfig
//! [`FlowScanner`]: flow::FlowScanner
//! [`MetricsError`]: error::MetricsError
//! [`MalformedRecord`]: error::MalformedRecord

pub mod error;
pub mod flow;
pub mod record;
pub mod sequence;
pub mod types;
