use crate::core::error::MalformedRecord;
use crate::core::record::ReadReferencePair;

/// Running statistics for one aggregation bucket.
///
/// An accumulator is created once per [`LevelKey`](crate::core::types::LevelKey),
/// fed every matching record through [`accept`](Self::accept) and drained by
/// [`finish`](Self::finish). `finish` takes `self` by value, so an accumulator
/// cannot be finished twice or fed after it has been finished.
pub trait MetricAccumulator {
    /// The immutable summary produced by `finish`
    type Metric;

    /// Fold one record into the running statistics.
    ///
    /// Records the metric family does not apply to (for example unmapped reads
    /// for a reference-based metric) are ignored and return `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` when a record the family should use cannot be
    /// interpreted. The state must be left unchanged in that case.
    fn accept(&mut self, pair: &ReadReferencePair<'_>) -> Result<(), MalformedRecord>;

    /// Produce the summary. Called exactly once, possibly after zero `accept`s.
    fn finish(self) -> Self::Metric;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Counts records and the bases they carry
    #[derive(Debug, Default)]
    pub struct CountingAccumulator {
        pub records: u64,
        pub bases: u64,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Counts {
        pub records: u64,
        pub bases: u64,
    }

    impl MetricAccumulator for CountingAccumulator {
        type Metric = Counts;

        fn accept(&mut self, pair: &ReadReferencePair<'_>) -> Result<(), MalformedRecord> {
            pair.read.reference_span()?;
            self.records += 1;
            self.bases += pair.read.bases.len() as u64;
            Ok(())
        }

        fn finish(self) -> Counts {
            Counts {
                records: self.records,
                bases: self.bases,
            }
        }
    }
}
