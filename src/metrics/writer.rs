//! Rendering finished metrics as text, JSON, or TSV.
//!
//! TSV output is a series of sections, one per family, each introduced by a
//! `## METRICS CLASS` line naming the family followed by a header row and one
//! row per (level, bin). Summary rows have no bins and are one row per level.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use super::flow_bias::FlowBiasMetric;
use super::gc_bias::GcBiasMetric;
use super::summary::AlignmentSummaryMetric;
use super::{FamilyMetrics, Metric, MetricFamily};
use crate::collector::{CollectorDiagnostics, LevelMetric};

/// Everything a `collect` run reports
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Records read from the alignment input
    pub records: u64,
    /// Contigs in the reference
    pub reference_contigs: usize,
    /// Bases in the reference
    pub reference_bases: u64,
    pub diagnostics: Vec<(MetricFamily, CollectorDiagnostics)>,
    pub families: Vec<FamilyMetrics>,
}

/// Write the report as pretty-printed JSON
///
/// # Errors
///
/// Returns an error if serialization or the underlying write fails.
pub fn write_json<W: Write>(out: &mut W, report: &MetricsReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report).context("Failed to serialize metrics")?;
    writeln!(out)?;
    Ok(())
}

/// Write every family as a titled TSV section
///
/// # Errors
///
/// Returns an error if the underlying write fails.
pub fn write_tsv<W: Write>(out: &mut W, families: &[FamilyMetrics]) -> Result<()> {
    for (i, family) in families.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        match family {
            FamilyMetrics::FlowBias(metrics) => write_flow_bias_tsv(out, metrics)?,
            FamilyMetrics::GcBias(metrics) => write_gc_bias_tsv(out, metrics)?,
            FamilyMetrics::Summary(metrics) => write_summary_tsv(out, metrics)?,
        }
    }
    Ok(())
}

fn section_header<M: Metric, W: Write>(out: &mut W, columns: &[&str]) -> Result<()> {
    writeln!(out, "## METRICS CLASS\t{}", M::metric_name())?;
    writeln!(out, "level\tid\t{}", columns.join("\t"))?;
    Ok(())
}

fn level_columns<M>(metric: &LevelMetric<M>) -> (String, &str) {
    (
        metric.level.kind().to_string(),
        metric.level.identifier().unwrap_or(""),
    )
}

fn write_flow_bias_tsv<W: Write>(
    out: &mut W,
    metrics: &[LevelMetric<FlowBiasMetric>],
) -> Result<()> {
    section_header::<FlowBiasMetric, _>(
        out,
        &[
            "flow_order",
            "flow_count",
            "total_windows",
            "total_reads",
            "mean_flow_length",
            "flow_length",
            "windows",
            "read_starts",
            "normalized_coverage",
        ],
    )?;
    for level_metric in metrics {
        let (level, id) = level_columns(level_metric);
        let m = &level_metric.metric;
        for bin in &m.bins {
            writeln!(
                out,
                "{level}\t{id}\t{}\t{}\t{}\t{}\t{:.4}\t{}\t{}\t{}\t{:.6}",
                m.flow_order,
                m.flow_count,
                m.total_windows,
                m.total_reads,
                m.mean_flow_length,
                bin.flow_length,
                bin.windows,
                bin.read_starts,
                bin.normalized_coverage,
            )?;
        }
    }
    Ok(())
}

fn write_gc_bias_tsv<W: Write>(
    out: &mut W,
    metrics: &[LevelMetric<GcBiasMetric>],
) -> Result<()> {
    section_header::<GcBiasMetric, _>(
        out,
        &[
            "window_size",
            "total_windows",
            "total_reads",
            "reads_without_gc",
            "gc",
            "windows",
            "read_starts",
            "normalized_coverage",
        ],
    )?;
    for level_metric in metrics {
        let (level, id) = level_columns(level_metric);
        let m = &level_metric.metric;
        for bin in &m.bins {
            writeln!(
                out,
                "{level}\t{id}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.6}",
                m.window_size,
                m.total_windows,
                m.total_reads,
                m.reads_without_gc,
                bin.gc,
                bin.windows,
                bin.read_starts,
                bin.normalized_coverage,
            )?;
        }
    }
    Ok(())
}

fn write_summary_tsv<W: Write>(
    out: &mut W,
    metrics: &[LevelMetric<AlignmentSummaryMetric>],
) -> Result<()> {
    section_header::<AlignmentSummaryMetric, _>(
        out,
        &[
            "total_reads",
            "qc_failed_reads",
            "non_primary_reads",
            "aligned_reads",
            "duplicate_reads",
            "total_bases",
            "aligned_reference_bases",
            "mean_read_length",
            "fraction_aligned",
            "fraction_duplicate",
        ],
    )?;
    for level_metric in metrics {
        let (level, id) = level_columns(level_metric);
        let m = &level_metric.metric;
        writeln!(
            out,
            "{level}\t{id}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.4}\t{:.4}",
            m.total_reads,
            m.qc_failed_reads,
            m.non_primary_reads,
            m.aligned_reads,
            m.duplicate_reads,
            m.total_bases,
            m.aligned_reference_bases,
            m.mean_read_length,
            m.fraction_aligned,
            m.fraction_duplicate,
        )?;
    }
    Ok(())
}

/// Write a human readable overview: one block per family, one line per level
///
/// # Errors
///
/// Returns an error if the underlying write fails.
pub fn write_text<W: Write>(out: &mut W, report: &MetricsReport) -> Result<()> {
    writeln!(
        out,
        "Processed {} records against {} contigs ({} bases)",
        report.records, report.reference_contigs, report.reference_bases
    )?;

    for family in &report.families {
        writeln!(out)?;
        match family {
            FamilyMetrics::FlowBias(metrics) => {
                writeln!(out, "{}", FlowBiasMetric::metric_name())?;
                for lm in metrics {
                    let m = &lm.metric;
                    writeln!(
                        out,
                        "   {}: {} reads, mean flow length {:.2} of {} ({})",
                        lm.level, m.total_reads, m.mean_flow_length, m.flow_count, m.flow_order
                    )?;
                }
            }
            FamilyMetrics::GcBias(metrics) => {
                writeln!(out, "{}", GcBiasMetric::metric_name())?;
                for lm in metrics {
                    let m = &lm.metric;
                    writeln!(
                        out,
                        "   {}: {} reads over {} windows of {} bp",
                        lm.level, m.total_reads, m.total_windows, m.window_size
                    )?;
                }
            }
            FamilyMetrics::Summary(metrics) => {
                writeln!(out, "{}", AlignmentSummaryMetric::metric_name())?;
                for lm in metrics {
                    let m = &lm.metric;
                    writeln!(
                        out,
                        "   {}: {} reads, {:.1}% aligned, {:.1}% duplicate",
                        lm.level,
                        m.total_reads,
                        m.fraction_aligned * 100.0,
                        m.fraction_duplicate * 100.0
                    )?;
                }
            }
        }
    }

    let malformed: u64 = report.diagnostics.iter().map(|(_, d)| d.malformed).sum();
    if malformed > 0 {
        writeln!(out, "\nSkipped {malformed} malformed record/metric pairs")?;
    }
    Ok(())
}
