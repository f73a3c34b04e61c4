//! Command-line interface for flow-metrics.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **collect**: Compute flow bias, GC bias, and summary metrics from a
//!   SAM/BAM file at several aggregation levels in one pass
//! - **flow-length**: Histogram of flow-derived read lengths over every
//!   window of a reference
//!
//! ## Usage
//!
//! ```text
//! # Flow bias and summary per sample and read group
//! flow-metrics collect sample.bam -r ref.fa --flow-order TGCA --flow-count 380 \
//!     --levels all,sample,read-group
//!
//! # Pipe SAM from samtools, TSV output
//! samtools view -h sample.bam | flow-metrics collect - -r ref.fa --metrics gc-bias --format tsv
//!
//! # Reference-only flow length distribution
//! flow-metrics flow-length ref.fa --flow-order TGCA --flow-count 380 --format json
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};

pub mod collect;
pub mod scan;

#[derive(Parser)]
#[command(name = "flow-metrics")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Flow-order bias and related QC metrics at sample, library, and read group level")]
#[command(
    long_about = "flow-metrics computes QC metrics for flow-based sequencing data.\n\nFor every read it derives how far the flow order would sequence into the reference template at the read's 5' end, and compares the distribution of read starts against the genome-wide distribution. Metrics are reported for the whole file and, on request, per sample, library, and read group, all from a single pass."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect metrics from a SAM/BAM file against a reference
    Collect(collect::CollectArgs),

    /// Histogram of flow-derived read lengths across a reference
    FlowLength(scan::FlowLengthArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Buffered writer to `path`, or to stdout when no path is given
///
/// # Errors
///
/// Returns an error if the output file cannot be created.
pub fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
