//! GC bias: how read starts are distributed across reference windows of
//! differing GC content, relative to how often each GC content occurs in the
//! genome.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collector::accumulator::MetricAccumulator;
use crate::core::error::{MalformedRecord, MetricsError, Result};
use crate::core::record::ReadReferencePair;
use crate::core::sequence::gc_percent;
use crate::metrics::profile::GcWindows;
use crate::metrics::{is_bias_candidate, normalized_coverage, Metric};

/// One bin per integer GC percentage, `0..=100`
pub const GC_BINS: usize = 101;

/// Default window size, matching the window conventionally used for GC bias
pub const DEFAULT_GC_WINDOW: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcConfig {
    window_size: usize,
}

impl GcConfig {
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidConfiguration` if `window_size` is zero.
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(MetricsError::invalid("gc-window", "must be at least 1"));
        }
        Ok(Self { window_size })
    }

    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_GC_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcBiasBin {
    pub gc: usize,
    pub windows: u64,
    pub read_starts: u64,
    pub normalized_coverage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcBiasMetric {
    pub window_size: usize,
    pub total_windows: u64,
    pub total_reads: u64,
    /// Reads whose window was mostly uncalled bases
    pub reads_without_gc: u64,
    pub bins: Vec<GcBiasBin>,
}

impl Metric for GcBiasMetric {
    fn metric_name() -> &'static str {
        "GC bias"
    }
}

#[derive(Debug)]
pub struct GcBiasAccumulator {
    windows: Arc<GcWindows>,
    read_starts: Vec<u64>,
    reads_without_gc: u64,
}

impl GcBiasAccumulator {
    #[must_use]
    pub fn new(windows: Arc<GcWindows>) -> Self {
        Self {
            windows,
            read_starts: vec![0; GC_BINS],
            reads_without_gc: 0,
        }
    }
}

impl MetricAccumulator for GcBiasAccumulator {
    type Metric = GcBiasMetric;

    fn accept(&mut self, pair: &ReadReferencePair<'_>) -> std::result::Result<(), MalformedRecord> {
        if !is_bias_candidate(pair.read) {
            return Ok(());
        }
        let Some(window) = pair.five_prime_window(self.windows.config.window_size())? else {
            return Ok(());
        };

        // GC content is strand symmetric, so no reverse complement is needed
        match gc_percent(window) {
            Some(gc) => self.read_starts[gc] += 1,
            None => self.reads_without_gc += 1,
        }
        Ok(())
    }

    fn finish(self) -> GcBiasMetric {
        let total_windows = self.windows.total();
        let total_reads: u64 = self.read_starts.iter().sum();

        let bins = self
            .windows
            .counts
            .iter()
            .zip(&self.read_starts)
            .enumerate()
            .map(|(gc, (&windows, &read_starts))| GcBiasBin {
                gc,
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

        GcBiasMetric {
            window_size: self.windows.config.window_size(),
            total_windows,
            total_reads,
            reads_without_gc: self.reads_without_gc,
            bins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::AlignedRead;
    use crate::metrics::profile::ReferenceProfile;

    const CONTIG: &[u8] = b"GGGGAAAANNNNCCCC";

    fn accumulator(window: usize) -> GcBiasAccumulator {
        let reference = vec![("chr1".to_string(), CONTIG.to_vec())];
        let config = GcConfig::new(window).unwrap();
        let profile = ReferenceProfile::prepare(&reference, None, Some(&config));
        GcBiasAccumulator::new(profile.gc().unwrap())
    }

    fn read_at(start: usize) -> AlignedRead {
        AlignedRead::new(format!("r{start}"), b"ACGT".to_vec()).mapped_to("chr1", start, start + 4)
    }

    #[test]
    fn test_config_rejects_zero_window() {
        assert!(GcConfig::new(0).is_err());
        assert_eq!(GcConfig::default().window_size(), 100);
    }

    #[test]
    fn test_reads_binned_by_window_gc() {
        let mut acc = accumulator(4);
        for start in [0, 2, 4] {
            let read = read_at(start);
            acc.accept(&ReadReferencePair::new(&read, Some(CONTIG))).unwrap();
        }
        let metric = acc.finish();
        assert_eq!(metric.total_reads, 3);
        assert_eq!(metric.bins[100].read_starts, 1);
        assert_eq!(metric.bins[50].read_starts, 1);
        assert_eq!(metric.bins[0].read_starts, 1);
        assert_eq!(metric.bins.len(), GC_BINS);
    }

    #[test]
    fn test_uncalled_window_counted_separately() {
        let mut acc = accumulator(4);
        let read = read_at(8);
        acc.accept(&ReadReferencePair::new(&read, Some(CONTIG))).unwrap();
        let metric = acc.finish();
        assert_eq!(metric.total_reads, 0);
        assert_eq!(metric.reads_without_gc, 1);
    }

    #[test]
    fn test_window_past_end_is_malformed() {
        let mut acc = accumulator(4);
        let read = read_at(14);
        let result = acc.accept(&ReadReferencePair::new(&read, Some(CONTIG)));
        assert!(result.is_err());
        assert_eq!(acc.finish().total_reads, 0);
    }

    #[test]
    fn test_normalized_coverage_uniform() {
        // Every window gets exactly one read start => coverage 1.0 everywhere
        let mut acc = accumulator(4);
        for start in 0..=12 {
            let read = read_at(start);
            acc.accept(&ReadReferencePair::new(&read, Some(CONTIG))).unwrap();
        }
        let metric = acc.finish();
        assert_eq!(metric.total_windows, metric.total_reads);
        for bin in metric.bins.iter().filter(|b| b.windows > 0) {
            assert!((bin.normalized_coverage - 1.0).abs() < 1e-9, "gc {}", bin.gc);
        }
    }

    #[test]
    fn test_finish_without_reads() {
        let metric = accumulator(4).finish();
        assert_eq!(metric.total_reads, 0);
        assert!(metric.bins.iter().all(|b| b.normalized_coverage == 0.0));
    }
}
