use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collector::accumulator::MetricAccumulator;
use crate::collector::keys::GroupKeyExtractor;
use crate::collector::registry::LevelRegistry;
use crate::core::record::ReadReferencePair;
use crate::core::types::LevelKey;

/// Builds a fresh accumulator for a newly seen key
pub type AccumulatorFactory<A> = Box<dyn FnMut(&LevelKey) -> A>;

/// A finished metric tagged with the bucket it summarizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelMetric<M> {
    #[serde(flatten)]
    pub level: LevelKey,
    #[serde(flatten)]
    pub metric: M,
}

/// Counters describing what the collector did with its input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorDiagnostics {
    /// Records passed to `consume`
    pub records: u64,
    /// Records that mapped to no enabled level
    pub unassigned: u64,
    /// Total `accept` calls across all levels
    pub accepts: u64,
    /// `accept` calls rejected as malformed
    pub malformed: u64,
}

/// Routes each record to the accumulators of every level it belongs to.
///
/// One pass over the input costs one `accept` per (record, key) pair instead of
/// one full pass per level. Accumulators are created lazily the first time a
/// key is seen and finished together, in first-seen order, by
/// [`finish`](Self::finish), which consumes the collector.
pub struct MultiLevelCollector<A: MetricAccumulator> {
    extractor: GroupKeyExtractor,
    factory: AccumulatorFactory<A>,
    registry: LevelRegistry<A>,
    diagnostics: CollectorDiagnostics,
}

impl<A: MetricAccumulator> MultiLevelCollector<A> {
    pub fn new(extractor: GroupKeyExtractor, factory: impl FnMut(&LevelKey) -> A + 'static) -> Self {
        Self {
            extractor,
            factory: Box::new(factory),
            registry: LevelRegistry::new(),
            diagnostics: CollectorDiagnostics::default(),
        }
    }

    /// Feed one record to every matching accumulator.
    ///
    /// A malformed record is skipped only for the accumulator that rejected it;
    /// its keys still exist and still appear in the output.
    pub fn consume(&mut self, pair: &ReadReferencePair<'_>) {
        let keys = self.extractor.keys_for(pair);
        self.consume_keyed(pair, &keys);
    }

    /// Feed one record whose keys were already derived.
    ///
    /// Lets several collectors share one `keys_for` call per record; `keys`
    /// must come from an extractor with the same levels and read groups.
    pub fn consume_keyed(&mut self, pair: &ReadReferencePair<'_>, keys: &[LevelKey]) {
        self.diagnostics.records += 1;

        if keys.is_empty() {
            self.diagnostics.unassigned += 1;
            return;
        }

        let factory = &mut self.factory;
        for key in keys {
            let accumulator = self.registry.get_or_create(key, |k| factory(k));
            self.diagnostics.accepts += 1;
            if let Err(reason) = accumulator.accept(pair) {
                self.diagnostics.malformed += 1;
                debug!(level = %key, %reason, "Skipping malformed record");
            }
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> CollectorDiagnostics {
        self.diagnostics
    }

    /// Finish every accumulator exactly once, in the order keys were first seen
    #[must_use]
    pub fn finish(self) -> Vec<LevelMetric<A::Metric>> {
        debug!(
            levels = self.registry.len(),
            records = self.diagnostics.records,
            malformed = self.diagnostics.malformed,
            "Finishing collector"
        );
        self.registry
            .into_entries()
            .map(|(level, accumulator)| LevelMetric {
                level,
                metric: accumulator.finish(),
            })
            .collect()
    }
}
