//! Collect command - stream alignments through every requested metric family.

use std::collections::HashSet;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use crate::cli::{open_output, OutputFormat};
use crate::collector::{CollectorConfig, GroupKeyExtractor};
use crate::core::flow::FlowConfig;
use crate::core::record::{ReadReferencePair, ReferenceWindowSource};
use crate::core::types::LevelKind;
use crate::metrics::gc_bias::{GcConfig, DEFAULT_GC_WINDOW};
use crate::metrics::profile::ReferenceProfile;
use crate::metrics::writer::{write_json, write_text, write_tsv, MetricsReport};
use crate::metrics::{MetricFamily, MetricSuite};
use crate::parsing::fasta::ReferenceSequences;
use crate::parsing::sam::AlignmentReader;

/// Records between progress messages
const PROGRESS_INTERVAL: u64 = 1_000_000;

#[derive(Args)]
pub struct CollectArgs {
    /// Input SAM or BAM file. Use '-' for SAM on stdin
    #[arg(required = true)]
    pub input: PathBuf,

    /// Reference FASTA the reads were aligned to (optionally gzip compressed)
    #[arg(short, long)]
    pub reference: PathBuf,

    /// Flow order used in sequencing, repeated cyclically (e.g. TGCA)
    #[arg(long, requires = "flow_count")]
    pub flow_order: Option<String>,

    /// Number of flows the sequencer ran
    #[arg(long, requires = "flow_order")]
    pub flow_count: Option<usize>,

    /// Window size for GC bias
    #[arg(long, default_value_t = DEFAULT_GC_WINDOW)]
    pub gc_window: usize,

    /// Aggregation levels to report
    #[arg(long, value_enum, value_delimiter = ',', default_value = "all")]
    pub levels: Vec<LevelKind>,

    /// Metric families to compute
    /// [default: flow-bias,gc-bias,summary with a flow order, gc-bias,summary without]
    #[arg(long, value_enum, value_delimiter = ',')]
    pub metrics: Option<Vec<MetricFamily>>,

    /// Write metrics here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CollectArgs {
    fn flow_config(&self) -> anyhow::Result<Option<FlowConfig>> {
        match (&self.flow_order, self.flow_count) {
            (Some(order), Some(count)) => Ok(Some(FlowConfig::new(order, count)?)),
            (None, None) => Ok(None),
            _ => anyhow::bail!("--flow-order and --flow-count must be given together"),
        }
    }

    fn families(&self, has_flow: bool) -> Vec<MetricFamily> {
        let mut families = match &self.metrics {
            Some(requested) => requested.clone(),
            None if has_flow => vec![
                MetricFamily::FlowBias,
                MetricFamily::GcBias,
                MetricFamily::Summary,
            ],
            None => vec![MetricFamily::GcBias, MetricFamily::Summary],
        };
        families.sort_unstable();
        families.dedup();
        families
    }
}

/// Execute the collect command
///
/// # Errors
///
/// Returns an error if the configuration is invalid, an input cannot be
/// parsed, or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CollectArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let flow = args.flow_config()?;
    let families = args.families(flow.is_some());
    let gc = families
        .contains(&MetricFamily::GcBias)
        .then(|| GcConfig::new(args.gc_window))
        .transpose()?;
    let flow = flow.filter(|_| families.contains(&MetricFamily::FlowBias));
    let levels = CollectorConfig::new(args.levels.iter().copied())?;

    let reference = ReferenceSequences::from_path(&args.reference).with_context(|| {
        format!("Failed to load reference: {}", args.reference.display())
    })?;
    let profile = ReferenceProfile::prepare(&reference, flow.as_ref(), gc.as_ref());

    let reader = open_alignments(&args.input)?;
    for name in reader.contig_names() {
        if reference.sequence(name).is_none() {
            warn!(contig = %name, "Header contig missing from reference");
        }
    }

    let extractor = GroupKeyExtractor::new(levels, reader.read_groups().to_vec());
    let mut suite = MetricSuite::new(&families, &extractor, &profile)?;

    if verbose {
        eprintln!(
            "Collecting {} at levels {}",
            families
                .iter()
                .map(|f| format!("{f:?}"))
                .collect::<Vec<_>>()
                .join(", "),
            extractor
                .config()
                .levels()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let mut records = 0u64;
    let mut missing_contigs: HashSet<String> = HashSet::new();
    for result in reader {
        let read = result.with_context(|| format!("Failed to read {}", args.input.display()))?;
        records += 1;

        let bases = reference.sequence_for(&read);
        if bases.is_none() && read.is_mapped() {
            if let Some(contig) = &read.contig {
                if missing_contigs.insert(contig.clone()) {
                    warn!(contig = %contig, "Reads aligned to a contig missing from the reference");
                }
            }
        }

        suite.consume(&ReadReferencePair::new(&read, bases));

        if records % PROGRESS_INTERVAL == 0 {
            info!(records, "Processed records");
        }
    }
    info!(records, "Finished reading alignments");

    let diagnostics = suite.diagnostics();
    if verbose {
        for (family, d) in &diagnostics {
            eprintln!(
                "{family:?}: {} records, {} unassigned, {} malformed",
                d.records, d.unassigned, d.malformed
            );
        }
    }

    let report = MetricsReport {
        records,
        reference_contigs: profile.contigs,
        reference_bases: profile.bases,
        diagnostics,
        families: suite.finish(),
    };

    let mut out = open_output(args.output.as_deref())?;
    match format {
        OutputFormat::Text => write_text(&mut out, &report)?,
        OutputFormat::Json => write_json(&mut out, &report)?,
        OutputFormat::Tsv => write_tsv(&mut out, &report.families)?,
    }
    out.flush()?;

    Ok(())
}

fn open_alignments(input: &Path) -> anyhow::Result<AlignmentReader> {
    let reader = if input == Path::new("-") {
        AlignmentReader::from_sam_reader(BufReader::new(io::stdin()))
    } else {
        AlignmentReader::from_path(input)
    };
    reader.with_context(|| format!("Failed to open alignments: {}", input.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(metrics: Option<Vec<MetricFamily>>) -> CollectArgs {
        CollectArgs {
            input: PathBuf::from("in.sam"),
            reference: PathBuf::from("ref.fa"),
            flow_order: None,
            flow_count: None,
            gc_window: DEFAULT_GC_WINDOW,
            levels: vec![LevelKind::All],
            metrics,
            output: None,
        }
    }

    #[test]
    fn test_default_families() {
        let a = args(None);
        assert_eq!(
            a.families(false),
            vec![MetricFamily::GcBias, MetricFamily::Summary]
        );
        assert_eq!(
            a.families(true),
            vec![
                MetricFamily::FlowBias,
                MetricFamily::GcBias,
                MetricFamily::Summary
            ]
        );
    }

    #[test]
    fn test_requested_families_deduplicated() {
        let a = args(Some(vec![
            MetricFamily::Summary,
            MetricFamily::FlowBias,
            MetricFamily::Summary,
        ]));
        assert_eq!(
            a.families(true),
            vec![MetricFamily::FlowBias, MetricFamily::Summary]
        );
    }

    #[test]
    fn test_flow_config_pairing() {
        let mut a = args(None);
        assert!(a.flow_config().unwrap().is_none());

        a.flow_order = Some("TGCA".to_string());
        assert!(a.flow_config().is_err());

        a.flow_count = Some(4);
        assert_eq!(a.flow_config().unwrap().unwrap().flow_count, 4);

        a.flow_count = Some(0);
        assert!(a.flow_config().is_err());
    }
}
