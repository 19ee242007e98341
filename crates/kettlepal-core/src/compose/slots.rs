//! Ordered, key-addressed storage for exercise drafts.
//!
//! Keys come from a per-store counter and are never handed out twice, so an
//! update aimed at a removed slot can never land on a different one.

use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::draft::{ExerciseDraft, ExerciseEdit};

/// Stable identifier of one slot for the lifetime of its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct SlotKey(u64);

impl SlotKey {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exercise-{}", self.0)
    }
}

/// One exercise entry plus its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub key: SlotKey,
    pub draft: ExerciseDraft,
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Slot", 2)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("exercise", &self.draft)?;
        state.end()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SlotStore {
    slots: Vec<Slot>,
    next_key: u64,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn keys(&self) -> Vec<SlotKey> {
        self.slots.iter().map(|s| s.key).collect()
    }

    /// Resolve a display position to the key currently at that position.
    pub fn key_at(&self, index: usize) -> Option<SlotKey> {
        self.slots.get(index).map(|s| s.key)
    }

    pub fn position(&self, key: SlotKey) -> Option<usize> {
        self.slots.iter().position(|s| s.key == key)
    }

    pub fn get(&self, key: SlotKey) -> Option<&ExerciseDraft> {
        self.slots.iter().find(|s| s.key == key).map(|s| &s.draft)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append an empty exercise; it always becomes the last slot.
    pub fn add_slot(&mut self) -> SlotKey {
        self.push(ExerciseDraft::default())
    }

    /// Append a prefilled exercise (used when loading a saved workout).
    pub fn push(&mut self, draft: ExerciseDraft) -> SlotKey {
        let key = SlotKey(self.next_key);
        self.next_key += 1;
        self.slots.push(Slot { key, draft });
        key
    }

    /// Replace one field on the slot with `key`.
    ///
    /// Returns `false` and leaves the store untouched when no such slot exists.
    pub fn update_slot(&mut self, key: SlotKey, edit: ExerciseEdit) -> bool {
        match self.slots.iter_mut().find(|s| s.key == key) {
            Some(slot) => {
                slot.draft.apply(edit);
                true
            }
            None => false,
        }
    }

    /// Remove the slot with `key`, preserving the order of the others.
    pub fn remove_slot(&mut self, key: SlotKey) -> Option<ExerciseDraft> {
        let index = self.position(key)?;
        Some(self.slots.remove(index).draft)
    }

    /// Drop every slot. The key counter keeps running.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl Serialize for SlotStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_appends_with_fresh_keys() {
        let mut store = SlotStore::new();
        let a = store.add_slot();
        let b = store.add_slot();
        assert_ne!(a, b);
        assert_eq!(store.keys(), vec![a, b]);
        assert_eq!(store.get(b), Some(&ExerciseDraft::default()));
    }

    #[test]
    fn remove_keeps_order_and_keys() {
        let mut store = SlotStore::new();
        let a = store.add_slot();
        let b = store.add_slot();
        let c = store.add_slot();
        assert!(store.remove_slot(b).is_some());
        assert_eq!(store.keys(), vec![a, c]);
        assert_eq!(store.key_at(1), Some(c));
    }

    #[test]
    fn keys_are_not_reused_after_removal() {
        let mut store = SlotStore::new();
        let a = store.add_slot();
        store.remove_slot(a);
        store.clear();
        let b = store.add_slot();
        assert_ne!(a, b);
    }

    #[test]
    fn update_unknown_key_is_noop() {
        let mut store = SlotStore::new();
        let a = store.add_slot();
        store.remove_slot(a);
        let b = store.add_slot();
        assert!(!store.update_slot(a, ExerciseEdit::Title("Snatch".into())));
        assert_eq!(store.get(b).unwrap().title, "");
    }

    #[test]
    fn update_touches_only_target_slot() {
        let mut store = SlotStore::new();
        let a = store.add_slot();
        let b = store.add_slot();
        assert!(store.update_slot(b, ExerciseEdit::Title("Goblet Squat".into())));
        assert_eq!(store.get(a).unwrap().title, "");
        assert_eq!(store.get(b).unwrap().title, "Goblet Squat");
        assert_eq!(store.keys(), vec![a, b]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Add), (0usize..16).prop_map(Op::Remove)]
    }

    proptest! {
        #[test]
        fn keys_unique_and_order_is_insertion_minus_removed(ops in prop::collection::vec(op(), 0..64)) {
            let mut store = SlotStore::new();
            let mut model: Vec<SlotKey> = Vec::new();
            let mut ever_issued: Vec<SlotKey> = Vec::new();

            for op in ops {
                match op {
                    Op::Add => {
                        let key = store.add_slot();
                        prop_assert!(!ever_issued.contains(&key));
                        ever_issued.push(key);
                        model.push(key);
                    }
                    Op::Remove(i) => {
                        if let Some(key) = store.key_at(i) {
                            store.remove_slot(key);
                            model.retain(|k| *k != key);
                        }
                    }
                }
            }

            let keys = store.keys();
            let mut dedup = keys.clone();
            dedup.sort();
            dedup.dedup();
            prop_assert_eq!(dedup.len(), keys.len());
            prop_assert_eq!(keys, model);
        }
    }
}
