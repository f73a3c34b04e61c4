//! Flow bias: how read starts are distributed across the flow length of the
//! template at the read's 5' end, relative to the genome-wide distribution.
//!
//! Templates that a flow order covers quickly (long flow length) and templates
//! it stalls on (short flow length) are sequenced with different efficiency;
//! normalized coverage per flow length makes that visible.

use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collector::accumulator::MetricAccumulator;
use crate::core::error::MalformedRecord;
use crate::core::flow::scan_length;
use crate::core::record::ReadReferencePair;
use crate::core::sequence::reverse_complement;
use crate::metrics::profile::FlowWindows;
use crate::metrics::{is_bias_candidate, normalized_coverage, Metric};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowBiasBin {
    pub flow_length: usize,
    pub windows: u64,
    pub read_starts: u64,
    pub normalized_coverage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowBiasMetric {
    pub flow_order: String,
    pub flow_count: usize,
    pub total_windows: u64,
    pub total_reads: u64,
    /// Mean flow length of the templates reads started on
    pub mean_flow_length: f64,
    pub bins: Vec<FlowBiasBin>,
}

impl Metric for FlowBiasMetric {
    fn metric_name() -> &'static str {
        "flow bias"
    }
}

#[derive(Debug)]
pub struct FlowBiasAccumulator {
    windows: Arc<FlowWindows>,
    read_starts: Vec<u64>,
}

impl FlowBiasAccumulator {
    #[must_use]
    pub fn new(windows: Arc<FlowWindows>) -> Self {
        let bins = windows.counts.len();
        Self {
            windows,
            read_starts: vec![0; bins],
        }
    }
}

impl MetricAccumulator for FlowBiasAccumulator {
    type Metric = FlowBiasMetric;

    fn accept(&mut self, pair: &ReadReferencePair<'_>) -> Result<(), MalformedRecord> {
        if !is_bias_candidate(pair.read) {
            return Ok(());
        }
        let config = &self.windows.config;
        let Some(window) = pair.five_prime_window(config.window_size())? else {
            return Ok(());
        };

        // Reverse-strand reads are sequenced from the opposite strand
        let template: Cow<'_, [u8]> = if pair.read.flags.reverse {
            Cow::Owned(reverse_complement(window))
        } else {
            Cow::Borrowed(window)
        };

        let length = scan_length(&template, &config.flow_order, config.flow_count);
        self.read_starts[length] += 1;
        Ok(())
    }

    fn finish(self) -> FlowBiasMetric {
        let total_windows = self.windows.total();
        let total_reads: u64 = self.read_starts.iter().sum();

        let weighted: u64 = self
            .read_starts
            .iter()
            .enumerate()
            .map(|(length, &count)| length as u64 * count)
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let mean_flow_length = if total_reads == 0 {
            0.0
        } else {
            weighted as f64 / total_reads as f64
        };

        let bins = self
            .windows
            .counts
            .iter()
            .zip(&self.read_starts)
            .enumerate()
            .map(|(flow_length, (&windows, &read_starts))| FlowBiasBin {
                flow_length,
                windows,
                read_starts,
                normalized_coverage: normalized_coverage(
                    read_starts,
                    windows,
                    total_reads,
                    total_windows,
                ),
            })
            .collect();

        FlowBiasMetric {
            flow_order: self.windows.config.flow_order.to_string(),
            flow_count: self.windows.config.flow_count,
            total_windows,
            total_reads,
            mean_flow_length,
            bins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flow::FlowConfig;
    use crate::core::record::{AlignedRead, ReadFlags};
    use crate::metrics::profile::ReferenceProfile;

    const CONTIG: &[u8] = b"TGCATTTTGGGG";

    fn accumulator() -> FlowBiasAccumulator {
        let reference = vec![("chr1".to_string(), CONTIG.to_vec())];
        let flow = FlowConfig::new("TGCA", 4).unwrap();
        let profile = ReferenceProfile::prepare(&reference, Some(&flow), None);
        FlowBiasAccumulator::new(profile.flow().unwrap())
    }

    fn read(start: usize, end: usize, flags: ReadFlags) -> AlignedRead {
        AlignedRead::new("r", b"ACGT".to_vec())
            .mapped_to("chr1", start, end)
            .with_flags(flags)
    }

    #[test]
    fn test_forward_read_uses_reference_at_start() {
        let mut acc = accumulator();
        // TGCA => 4
        let r = read(0, 4, ReadFlags::default());
        acc.accept(&ReadReferencePair::new(&r, Some(CONTIG))).unwrap();
        // TTTT => 4 (one T flow, window exhausted)
        let r = read(4, 8, ReadFlags::default());
        acc.accept(&ReadReferencePair::new(&r, Some(CONTIG))).unwrap();
        // GGGG => 4 (T flow consumes nothing, G flow consumes the run)
        let r = read(8, 12, ReadFlags::default());
        acc.accept(&ReadReferencePair::new(&r, Some(CONTIG))).unwrap();
        // CATT => T,G nothing; C => 1; A => 2
        let r = read(2, 6, ReadFlags::default());
        acc.accept(&ReadReferencePair::new(&r, Some(CONTIG))).unwrap();

        let metric = acc.finish();
        assert_eq!(metric.total_reads, 4);
        assert_eq!(metric.bins[4].read_starts, 3);
        assert_eq!(metric.bins[2].read_starts, 1);
        assert!((metric.mean_flow_length - 3.5).abs() < 1e-9);
        assert_eq!(metric.flow_order, "TGCA");
        assert_eq!(metric.flow_count, 4);
    }

    #[test]
    fn test_reverse_read_uses_reverse_complement_at_end() {
        let mut acc = accumulator();
        // window [4,8) = TTTT, reverse complement AAAA => T,G,C nothing; A => 4
        let flags = ReadFlags {
            reverse: true,
            ..ReadFlags::default()
        };
        let r = read(2, 8, flags);
        acc.accept(&ReadReferencePair::new(&r, Some(CONTIG))).unwrap();
        let metric = acc.finish();
        assert_eq!(metric.bins[4].read_starts, 1);
    }

    #[test]
    fn test_non_primary_and_unmapped_ignored() {
        let mut acc = accumulator();
        let secondary = read(
            0,
            4,
            ReadFlags {
                secondary: true,
                ..ReadFlags::default()
            },
        );
        acc.accept(&ReadReferencePair::new(&secondary, Some(CONTIG)))
            .unwrap();
        let unmapped = AlignedRead::new("u", b"ACGT".to_vec());
        acc.accept(&ReadReferencePair::new(&unmapped, None)).unwrap();

        assert_eq!(acc.finish().total_reads, 0);
    }

    #[test]
    fn test_window_past_end_is_malformed() {
        let mut acc = accumulator();
        let r = read(10, 12, ReadFlags::default());
        assert!(acc.accept(&ReadReferencePair::new(&r, Some(CONTIG))).is_err());
        assert_eq!(acc.finish().total_reads, 0);
    }

    #[test]
    fn test_finish_without_reads_has_all_bins() {
        let metric = accumulator().finish();
        assert_eq!(metric.bins.len(), 5);
        assert_eq!(metric.total_windows, 18);
        assert_eq!(metric.total_reads, 0);
        assert!(metric.mean_flow_length.abs() < f64::EPSILON);
    }
}
