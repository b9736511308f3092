//! Identity map: original object -> its clone
//!
//! Keyed by address. Each entry also holds the original, so no address can be
//! freed and reused by a different object while the call is running.

use replica_value::{ObjectRef, Value};
use rustc_hash::FxHashMap;

#[derive(Default)]
pub(crate) struct IdentityMap {
    entries: FxHashMap<usize, (ObjectRef, Value)>,
    hits: usize,
}

impl IdentityMap {
    /// Clone registered for `original`, counting the hit
    pub(crate) fn get(&mut self, original: &ObjectRef) -> Option<Value> {
        let clone = self.entries.get(&original.id()).map(|(_, c)| c.clone());
        if clone.is_some() {
            self.hits += 1;
        }
        clone
    }

    /// Register a clone; the first registration wins
    pub(crate) fn insert(&mut self, original: &ObjectRef, clone: Value) {
        self.entries
            .entry(original.id())
            .or_insert_with(|| (original.clone(), clone));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn hits(&self) -> usize {
        self.hits
    }
}
