//! Flow-length command - distribution of flow-derived read lengths over a reference.
//!
//! Every window of `flow_count` bases is scanned with the flow order; the
//! result is how many bases a read starting there would contain after
//! `flow_count` flows. No alignments are involved.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cli::{open_output, OutputFormat};
use crate::core::flow::{FlowConfig, FlowScanner};
use crate::core::record::ReferenceWindowSource;
use crate::core::sequence::reverse_complement;
use crate::parsing::fasta::ReferenceSequences;

#[derive(Args)]
pub struct FlowLengthArgs {
    /// Reference FASTA (optionally gzip compressed)
    #[arg(required = true)]
    pub reference: PathBuf,

    /// Flow order used in sequencing, repeated cyclically (e.g. TGCA)
    #[arg(long)]
    pub flow_order: String,

    /// Number of flows the sequencer ran; also the window size
    #[arg(long)]
    pub flow_count: usize,

    /// Also scan the reverse complement of every contig
    #[arg(long)]
    pub both_strands: bool,

    /// Write the histogram here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Flow-length histogram of one contig, or of the whole reference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowLengthHistogram {
    pub contig: String,
    pub windows: u64,
    pub mean_length: f64,
    /// Window counts indexed by flow length, `0..=flow_count`
    pub counts: Vec<u64>,
}

impl FlowLengthHistogram {
    fn new(contig: impl Into<String>, counts: Vec<u64>) -> Self {
        let windows: u64 = counts.iter().sum();
        let weighted: u64 = counts
            .iter()
            .enumerate()
            .map(|(length, &count)| length as u64 * count)
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let mean_length = if windows == 0 {
            0.0
        } else {
            weighted as f64 / windows as f64
        };
        Self {
            contig: contig.into(),
            windows,
            mean_length,
            counts,
        }
    }
}

#[derive(Debug, Serialize)]
struct FlowLengthReport<'a> {
    flow_order: String,
    flow_count: usize,
    both_strands: bool,
    contigs: &'a [FlowLengthHistogram],
    total: &'a FlowLengthHistogram,
}

/// Per-contig histograms in reference order, followed by the overall histogram
pub fn flow_length_histograms<S>(
    source: &S,
    config: &FlowConfig,
    both_strands: bool,
) -> (Vec<FlowLengthHistogram>, FlowLengthHistogram)
where
    S: ReferenceWindowSource + ?Sized,
{
    let scanner = FlowScanner::new(config.clone());
    let mut total = vec![0u64; config.flow_count + 1];
    let mut per_contig = Vec::new();

    for name in source.contig_names() {
        let Some(bases) = source.sequence(name) else {
            continue;
        };
        let mut counts = scanner.histogram(bases);
        if both_strands {
            let reverse = scanner.histogram(&reverse_complement(bases));
            for (sum, count) in counts.iter_mut().zip(reverse) {
                *sum += count;
            }
        }
        for (sum, count) in total.iter_mut().zip(&counts) {
            *sum += count;
        }
        per_contig.push(FlowLengthHistogram::new(name, counts));
    }

    (per_contig, FlowLengthHistogram::new("ALL", total))
}

/// Execute the flow-length command
///
/// # Errors
///
/// Returns an error if the flow parameters are invalid, the reference cannot
/// be parsed, or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: FlowLengthArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = FlowConfig::new(&args.flow_order, args.flow_count)?;
    let reference = ReferenceSequences::from_path(&args.reference).with_context(|| {
        format!("Failed to load reference: {}", args.reference.display())
    })?;

    if verbose {
        eprintln!(
            "Loaded {} contigs ({} bases) from {}",
            reference.len(),
            reference.total_bases(),
            args.reference.display()
        );
    }

    let (contigs, total) = flow_length_histograms(&reference, &config, args.both_strands);
    info!(windows = total.windows, "Scanned reference windows");

    let mut out = open_output(args.output.as_deref())?;
    match format {
        OutputFormat::Text => {
            writeln!(
                out,
                "Flow order {} x {} flows: {} windows, mean length {:.2}",
                config.flow_order, config.flow_count, total.windows, total.mean_length
            )?;
            for histogram in contigs.iter().chain(std::iter::once(&total)) {
                writeln!(
                    out,
                    "   {}: {} windows, mean length {:.2}",
                    histogram.contig, histogram.windows, histogram.mean_length
                )?;
            }
        }
        OutputFormat::Json => {
            let report = FlowLengthReport {
                flow_order: config.flow_order.to_string(),
                flow_count: config.flow_count,
                both_strands: args.both_strands,
                contigs: &contigs,
                total: &total,
            };
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Tsv => {
            writeln!(out, "contig\tflow_length\twindows")?;
            for histogram in contigs.iter().chain(std::iter::once(&total)) {
                for (length, count) in histogram.counts.iter().enumerate() {
                    writeln!(out, "{}\t{length}\t{count}", histogram.contig)?;
                }
            }
        }
    }
    out.flush()?;

    Ok(())
}
