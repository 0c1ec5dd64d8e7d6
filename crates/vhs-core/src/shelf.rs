//! Fixed-capacity display shelf.
//!
//! Ownership is a projection over the slots: a title is owned exactly when
//! it sits in one of them, so there is no separate set to drift.

use crate::{Catalog, GameError, RandomSource, Title, TitleId};
use serde::Serialize;
use std::collections::BTreeSet;

/// Number of shelf positions.
pub const SHELF_SLOTS: usize = 10;

/// Ten slots addressable 0-9; `None` is an empty slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Shelf {
    slots: [Option<Title>; SHELF_SLOTS],
}

impl Shelf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill every slot with distinct titles drawn uniformly from the catalog.
    pub fn stocked<R: RandomSource>(rng: &mut R, catalog: &Catalog) -> Self {
        let mut pool: Vec<&Title> = catalog.titles.iter().collect();
        rng.shuffle(&mut pool);
        let mut shelf = Self::new();
        for (slot, title) in shelf.slots.iter_mut().zip(pool) {
            *slot = Some(title.clone());
        }
        shelf
    }

    pub fn slots(&self) -> &[Option<Title>] {
        &self.slots
    }

    pub fn get(&self, slot: usize) -> Option<&Title> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Put `title` into the first empty slot.
    pub fn place(&mut self, title: Title) -> Result<usize, GameError> {
        if self.is_owned(&title.id) {
            return Err(GameError::AlreadyOwned(title.id));
        }
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(GameError::NoEmptySlot)?;
        self.slots[slot] = Some(title);
        Ok(slot)
    }

    /// Take the title out of `slot`, leaving it empty.
    pub fn remove(&mut self, slot: usize) -> Result<Title, GameError> {
        self.slots
            .get_mut(slot)
            .and_then(Option::take)
            .ok_or(GameError::InvalidSlotSelection(slot))
    }

    pub fn is_owned(&self, id: &TitleId) -> bool {
        self.titles().any(|t| &t.id == id)
    }

    pub fn owned_ids(&self) -> BTreeSet<TitleId> {
        self.titles().map(|t| t.id.clone()).collect()
    }

    pub fn titles(&self) -> impl Iterator<Item = &Title> {
        self.slots.iter().flatten()
    }

    pub fn empty_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    pub fn is_full(&self) -> bool {
        self.empty_slots() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{small_catalog, title};
    use crate::{SeededRandom, SequenceRandom};
    use proptest::prelude::*;

    #[test]
    fn stocked_shelf_is_full_and_distinct() {
        let catalog = small_catalog();
        let mut rng = SeededRandom::from_seed(42);
        let shelf = Shelf::stocked(&mut rng, &catalog);
        assert!(shelf.is_full());
        assert_eq!(shelf.owned_ids().len(), SHELF_SLOTS);
    }

    #[test]
    fn stocked_shelf_follows_shuffle() {
        let catalog = small_catalog();
        // All-zero draws rotate the pool left by one.
        let mut rng = SequenceRandom::default();
        let shelf = Shelf::stocked(&mut rng, &catalog);
        assert_eq!(shelf.get(0).unwrap().id, TitleId::new("t1"));
        assert_eq!(shelf.get(9).unwrap().id, TitleId::new("t10"));
    }

    #[test]
    fn place_and_remove() {
        let mut shelf = Shelf::new();
        assert_eq!(shelf.place(title("a", 10, &[])), Ok(0));
        assert_eq!(shelf.place(title("b", 10, &[])), Ok(1));
        let removed = shelf.remove(0).unwrap();
        assert_eq!(removed.id, TitleId::new("a"));
        assert!(!shelf.is_owned(&TitleId::new("a")));
        assert_eq!(shelf.place(title("c", 10, &[])), Ok(0));
        assert_eq!(shelf.empty_slots(), SHELF_SLOTS - 2);
    }

    #[test]
    fn duplicate_placement_rejected() {
        let mut shelf = Shelf::new();
        shelf.place(title("a", 10, &[])).unwrap();
        assert_eq!(
            shelf.place(title("a", 10, &[])),
            Err(GameError::AlreadyOwned(TitleId::new("a")))
        );
    }

    #[test]
    fn full_shelf_rejects_placement() {
        let mut shelf = Shelf::new();
        for i in 0..SHELF_SLOTS {
            shelf.place(title(&format!("t{i}"), 10, &[])).unwrap();
        }
        assert_eq!(shelf.place(title("x", 10, &[])), Err(GameError::NoEmptySlot));
    }

    #[test]
    fn removing_empty_or_out_of_range_slot_fails() {
        let mut shelf = Shelf::new();
        assert_eq!(shelf.remove(3), Err(GameError::InvalidSlotSelection(3)));
        assert_eq!(shelf.remove(10), Err(GameError::InvalidSlotSelection(10)));
    }

    #[test]
    fn serializes_slots_in_order() {
        let mut shelf = Shelf::new();
        shelf.place(title("a", 10, &[])).unwrap();
        let json = serde_json::to_value(&shelf).unwrap();
        let slots = json["slots"].as_array().unwrap();
        assert_eq!(slots.len(), SHELF_SLOTS);
        assert_eq!(slots[0]["id"], "a");
        assert!(slots[1..].iter().all(|s| s.is_null()));
    }

    proptest! {
        #[test]
        fn ownership_tracks_slots(ops in proptest::collection::vec((any::<bool>(), 0usize..12), 0..64)) {
            let mut shelf = Shelf::new();
            for (place, n) in ops {
                if place {
                    let _ = shelf.place(title(&format!("t{n}"), 10, &[]));
                } else {
                    let _ = shelf.remove(n);
                }
                let in_slots: Vec<TitleId> = shelf.slots().iter().flatten().map(|t| t.id.clone()).collect();
                let owned = shelf.owned_ids();
                prop_assert_eq!(in_slots.len(), owned.len());
                prop_assert!(in_slots.iter().all(|id| owned.contains(id)));
            }
        }
    }
}
