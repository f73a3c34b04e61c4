use std::collections::HashMap;

use crate::core::types::LevelKey;

/// Owns one accumulator per [`LevelKey`], created on first use.
///
/// Accumulators live in an arena in insertion order with a hash index on the
/// key, so lookups are O(1) and iteration order is deterministic. Nothing is
/// ever evicted.
#[derive(Debug)]
pub struct LevelRegistry<A> {
    entries: Vec<(LevelKey, A)>,
    index: HashMap<LevelKey, usize>,
}

impl<A> LevelRegistry<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// The accumulator for `key`, building it with `factory` the first time
    /// the key is seen. `factory` is never called for a key already present.
    pub fn get_or_create<F>(&mut self, key: &LevelKey, factory: F) -> &mut A
    where
        F: FnOnce(&LevelKey) -> A,
    {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                let accumulator = factory(key);
                self.entries.push((key.clone(), accumulator));
                self.index.insert(key.clone(), slot);
                slot
            }
        };
        &mut self.entries[slot].1
    }

    #[must_use]
    pub fn get(&self, key: &LevelKey) -> Option<&A> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    #[must_use]
    pub fn contains(&self, key: &LevelKey) -> bool {
        self.index.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys and accumulators in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (&LevelKey, &A)> {
        self.entries.iter().map(|(key, acc)| (key, acc))
    }

    /// Consume the registry, yielding entries in insertion order
    pub fn into_entries(self) -> impl Iterator<Item = (LevelKey, A)> {
        self.entries.into_iter()
    }
}

impl<A> Default for LevelRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}
