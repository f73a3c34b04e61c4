use serde::{Deserialize, Serialize};

use crate::collector::accumulator::MetricAccumulator;
use crate::core::error::MalformedRecord;
use crate::core::record::ReadReferencePair;
use crate::metrics::Metric;

/// Read-level counts that need no reference context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSummaryMetric {
    /// All records seen
    pub total_reads: u64,

    /// Records failing platform/vendor quality checks
    pub qc_failed_reads: u64,

    /// Secondary and supplementary records
    pub non_primary_reads: u64,

    /// Primary records with an alignment
    pub aligned_reads: u64,

    /// Primary records marked as duplicates
    pub duplicate_reads: u64,

    /// Bases across primary records
    pub total_bases: u64,

    /// Reference bases spanned by primary aligned records
    pub aligned_reference_bases: u64,

    /// Mean length of primary records
    pub mean_read_length: f64,

    /// Fraction of primary records that are aligned
    pub fraction_aligned: f64,

    /// Fraction of primary records marked as duplicates
    pub fraction_duplicate: f64,
}

impl Metric for AlignmentSummaryMetric {
    fn metric_name() -> &'static str {
        "alignment summary"
    }
}

#[derive(Debug, Default)]
pub struct AlignmentSummaryAccumulator {
    total: u64,
    qc_failed: u64,
    non_primary: u64,
    aligned: u64,
    duplicates: u64,
    bases: u64,
    reference_bases: u64,
}

impl MetricAccumulator for AlignmentSummaryAccumulator {
    type Metric = AlignmentSummaryMetric;

    fn accept(&mut self, pair: &ReadReferencePair<'_>) -> Result<(), MalformedRecord> {
        let read = pair.read;
        let span = if read.is_mapped() {
            read.reference_span()?
        } else {
            0
        };

        self.total += 1;
        if read.flags.qc_fail {
            self.qc_failed += 1;
        }
        if !read.flags.is_primary() {
            self.non_primary += 1;
            return Ok(());
        }

        self.bases += read.bases.len() as u64;
        if read.flags.duplicate {
            self.duplicates += 1;
        }
        if read.is_mapped() {
            self.aligned += 1;
            self.reference_bases += span as u64;
        }
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> AlignmentSummaryMetric {
        let primary = self.total - self.non_primary;
        let ratio = |numerator: u64| {
            if primary == 0 {
                0.0
            } else {
                numerator as f64 / primary as f64
            }
        };

        AlignmentSummaryMetric {
            total_reads: self.total,
            qc_failed_reads: self.qc_failed,
            non_primary_reads: self.non_primary,
            aligned_reads: self.aligned,
            duplicate_reads: self.duplicates,
            total_bases: self.bases,
            aligned_reference_bases: self.reference_bases,
            mean_read_length: ratio(self.bases),
            fraction_aligned: ratio(self.aligned),
            fraction_duplicate: ratio(self.duplicates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{AlignedRead, ReadFlags};

    #[test]
    fn test_summary_counts() {
        let reads = vec![
            AlignedRead::new("r1", b"ACGTACGTAC".to_vec()).mapped_to("chr1", 0, 10),
            AlignedRead::new("r2", b"ACGTAC".to_vec()),
            AlignedRead::new("r3", b"ACGT".to_vec())
                .mapped_to("chr1", 5, 9)
                .with_flags(ReadFlags {
                    duplicate: true,
                    qc_fail: true,
                    ..ReadFlags::default()
                }),
            AlignedRead::new("r4", b"ACGTACGT".to_vec())
                .mapped_to("chr1", 0, 8)
                .with_flags(ReadFlags {
                    supplementary: true,
                    ..ReadFlags::default()
                }),
        ];

        let mut acc = AlignmentSummaryAccumulator::default();
        for read in &reads {
            acc.accept(&ReadReferencePair::new(read, None)).unwrap();
        }
        let metric = acc.finish();

        assert_eq!(metric.total_reads, 4);
        assert_eq!(metric.non_primary_reads, 1);
        assert_eq!(metric.qc_failed_reads, 1);
        assert_eq!(metric.aligned_reads, 2);
        assert_eq!(metric.duplicate_reads, 1);
        assert_eq!(metric.total_bases, 20);
        assert_eq!(metric.aligned_reference_bases, 14);
        assert!((metric.mean_read_length - 20.0 / 3.0).abs() < 1e-9);
        assert!((metric.fraction_aligned - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_alignment_is_malformed() {
        let mut acc = AlignmentSummaryAccumulator::default();
        let read = AlignedRead::new("bad", b"ACGT".to_vec()).mapped_to("chr1", 9, 3);
        assert!(acc.accept(&ReadReferencePair::new(&read, None)).is_err());
        assert_eq!(acc.finish(), AlignmentSummaryMetric::default());
    }

    #[test]
    fn test_empty_summary() {
        let metric = AlignmentSummaryAccumulator::default().finish();
        assert_eq!(metric.total_reads, 0);
        assert!(metric.mean_read_length.abs() < f64::EPSILON);
    }
}
