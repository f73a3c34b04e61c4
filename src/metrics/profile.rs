//! Genome-wide window tables computed before any read is processed.
//!
//! Bias metrics compare where reads start against where they *could* start.
//! The denominator is a histogram over every window of the whole reference,
//! built once by [`ReferenceProfile::prepare`]. It has to cover every contig,
//! not only those that reads happen to align to, so it is computed up front
//! rather than lazily during the pass.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::flow::{FlowConfig, FlowScanner};
use crate::core::record::ReferenceWindowSource;
use crate::core::sequence::{gc_percent, reverse_complement};
use crate::metrics::gc_bias::{GcConfig, GC_BINS};

/// Windows of the reference grouped by flow length, both strands
#[derive(Debug, Clone, Serialize)]
pub struct FlowWindows {
    pub config: FlowConfig,
    /// Indexed by flow length, `0..=flow_count`
    pub counts: Vec<u64>,
}

impl FlowWindows {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Windows of the reference grouped by GC percentage
#[derive(Debug, Clone, Serialize)]
pub struct GcWindows {
    pub config: GcConfig,
    /// Indexed by GC percentage, `0..=100`
    pub counts: Vec<u64>,
}

impl GcWindows {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Immutable lookup tables shared by every accumulator of a run
#[derive(Debug, Clone, Default)]
pub struct ReferenceProfile {
    pub contigs: usize,
    pub bases: u64,
    flow: Option<Arc<FlowWindows>>,
    gc: Option<Arc<GcWindows>>,
}

impl ReferenceProfile {
    /// Walk every contig of `source` once, building the tables for the
    /// requested families. Contigs shorter than a window contribute nothing.
    pub fn prepare<S>(source: &S, flow: Option<&FlowConfig>, gc: Option<&GcConfig>) -> Self
    where
        S: ReferenceWindowSource + ?Sized,
    {
        let scanner = flow.cloned().map(FlowScanner::new);
        let mut flow_counts = flow.map(|config| vec![0u64; config.flow_count + 1]);
        let mut gc_counts = gc.map(|_| vec![0u64; GC_BINS]);

        let mut profile = Self::default();
        for name in source.contig_names() {
            let Some(bases) = source.sequence(name) else {
                continue;
            };
            profile.contigs += 1;
            profile.bases += bases.len() as u64;

            if let (Some(scanner), Some(counts)) = (&scanner, flow_counts.as_mut()) {
                add_histogram(counts, &scanner.histogram(bases));
                add_histogram(counts, &scanner.histogram(&reverse_complement(bases)));
            }

            if let (Some(config), Some(counts)) = (gc, gc_counts.as_mut()) {
                for window in bases.windows(config.window_size()) {
                    if let Some(gc) = gc_percent(window) {
                        counts[gc] += 1;
                    }
                }
            }

            debug!(contig = name, length = bases.len(), "Profiled contig");
        }

        profile.flow = flow.zip(flow_counts).map(|(config, counts)| {
            Arc::new(FlowWindows {
                config: config.clone(),
                counts,
            })
        });
        profile.gc = gc.zip(gc_counts).map(|(config, counts)| {
            Arc::new(GcWindows {
                config: config.clone(),
                counts,
            })
        });

        info!(
            contigs = profile.contigs,
            bases = profile.bases,
            "Prepared reference profile"
        );
        profile
    }

    /// Flow-length window table, if flow parameters were given to `prepare`
    #[must_use]
    pub fn flow(&self) -> Option<Arc<FlowWindows>> {
        self.flow.clone()
    }

    /// GC window table, if a GC configuration was given to `prepare`
    #[must_use]
    pub fn gc(&self) -> Option<Arc<GcWindows>> {
        self.gc.clone()
    }
}

fn add_histogram(total: &mut [u64], counts: &[u64]) {
    for (sum, count) in total.iter_mut().zip(counts) {
        *sum += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Vec<(String, Vec<u8>)> {
        vec![
            ("chr1".to_string(), b"TGCATG".to_vec()),
            ("chr2".to_string(), b"GG".to_vec()),
        ]
    }

    #[test]
    fn test_prepare_flow_windows_both_strands() {
        let flow = FlowConfig::new("TGCA", 4).unwrap();
        let profile = ReferenceProfile::prepare(&reference(), Some(&flow), None);

        assert_eq!(profile.contigs, 2);
        assert_eq!(profile.bases, 8);
        assert!(profile.gc().is_none());

        let windows = profile.flow().unwrap();
        // chr1 has 3 windows per strand, chr2 is shorter than the window
        assert_eq!(windows.total(), 6);
        assert_eq!(windows.counts.len(), 5);
        // forward: TGCA=4, GCAT=3, CATG=2; reverse (CATGCA): CATG=2, ATGC=1, TGCA=4
        assert_eq!(windows.counts, vec![0, 1, 2, 1, 2]);
    }

    #[test]
    fn test_prepare_gc_windows() {
        let gc = GcConfig::new(2).unwrap();
        let profile = ReferenceProfile::prepare(&reference(), None, Some(&gc));
        let windows = profile.gc().unwrap();

        assert_eq!(windows.counts.len(), GC_BINS);
        // chr1: TG GC CA AT TG => 50,100,50,0,50 ; chr2: GG => 100
        assert_eq!(windows.counts[0], 1);
        assert_eq!(windows.counts[50], 3);
        assert_eq!(windows.counts[100], 2);
        assert_eq!(windows.total(), 6);
    }

    #[test]
    fn test_prepare_short_reference() {
        let flow = FlowConfig::new("TGCA", 100).unwrap();
        let reference = vec![("chrM".to_string(), b"ACGT".to_vec())];
        let profile = ReferenceProfile::prepare(&reference, Some(&flow), None);
        assert_eq!(profile.flow().unwrap().total(), 0);
    }
}
