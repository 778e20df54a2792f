//! The bottom tray: fixed slots, triple matching and left compaction.

use super::events::TrayEvent;
#[cfg(debug_assertions)]
use super::invariants::{InvariantSet, TrayInvariants, describe};
use super::types::{Item, ItemId, MatchKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Result of a successful [`Tray::try_add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Slot the item landed in, before any match cleared it.
    pub slot: usize,
    /// Key of the group consumed by this add, if one completed.
    pub matched: Option<MatchKey>,
    /// Events in the order they happened.
    pub events: Vec<TrayEvent>,
}

/// Result of a successful [`Tray::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// The item, handed back to the caller.
    pub item: Item,
    /// Slot it was removed from.
    pub slot: usize,
    /// Events in the order they happened.
    pub events: Vec<TrayEvent>,
}

/// Errors reported by tray operations.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum TrayError {
    /// No slot is free; the rejected item is handed back untouched.
    #[display("Tray is full ({} slots)", capacity)]
    Full {
        /// The item that did not fit.
        item: Item,
        /// Tray capacity.
        capacity: usize,
    },
    /// The item is not in the tray.
    #[display("Item {} is not in the tray", _0)]
    NotFound(ItemId),
}

impl std::error::Error for TrayError {}

impl TrayError {
    /// The event a presentation layer should see for this error, if any.
    pub fn event(&self) -> Option<TrayEvent> {
        match self {
            TrayError::Full { .. } => Some(TrayEvent::Full),
            TrayError::NotFound(_) => None,
        }
    }
}

/// Fixed-capacity ordered slot array.
///
/// Occupied slots always form a prefix once an operation returns, and no
/// key ever rests in the tray with `match_size` or more items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tray {
    slots: Vec<Option<Item>>,
    match_size: usize,
}

impl Tray {
    /// Creates an empty tray.
    #[instrument]
    pub fn new(capacity: usize, match_size: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            match_size,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Group size consumed as a match.
    pub fn match_size(&self) -> usize {
        self.match_size
    }

    /// Returns true if every slot is taken.
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Returns true if no slot is taken.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Number of occupied slots.
    pub fn count_filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Raw slot view, index order.
    pub fn slots(&self) -> &[Option<Item>] {
        &self.slots
    }

    /// Occupied items, index order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.slots.iter().flatten()
    }

    /// Looks an item up by identity.
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items().find(|item| item.id() == id)
    }

    /// Returns true if the item is in the tray.
    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Number of items with the given key.
    pub fn count_of(&self, key: MatchKey) -> usize {
        self.items().filter(|item| item.match_key() == key).count()
    }

    /// Places an item in the first free slot, then resolves matches.
    #[instrument(skip(self, item), fields(item = %item.id(), key = %item.match_key()))]
    pub fn try_add(&mut self, item: Item) -> Result<Placement, TrayError> {
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            warn!(capacity = self.capacity(), "Tray full, add refused");
            return Err(TrayError::Full {
                item,
                capacity: self.capacity(),
            });
        };

        let mut events = vec![TrayEvent::ItemAdded {
            item: item.id(),
            kind: item.kind(),
            slot,
        }];
        self.slots[slot] = Some(item);
        debug!(slot, "Item placed");

        let matched = self.resolve_matches(&mut events);
        events.push(TrayEvent::Changed {
            filled: self.count_filled(),
        });

        self.debug_check();
        Ok(Placement {
            slot,
            matched,
            events,
        })
    }

    /// Removes an item by identity and compacts the remaining slots.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: ItemId) -> Result<Removal, TrayError> {
        let slot = self
            .slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|item| item.id() == id))
            .ok_or(TrayError::NotFound(id))?;

        let item = self.slots[slot].take().ok_or(TrayError::NotFound(id))?;
        self.compact();
        debug!(slot, "Item removed");

        self.debug_check();
        Ok(Removal {
            item,
            slot,
            events: vec![TrayEvent::Changed {
                filled: self.count_filled(),
            }],
        })
    }

    /// Keys present with fewer than `match_size` items, first-seen order.
    #[instrument(skip(self))]
    pub fn needed_keys(&self) -> Vec<MatchKey> {
        self.key_counts()
            .into_iter()
            .filter(|(_, count)| *count < self.match_size)
            .map(|(key, _)| key)
            .collect()
    }

    /// The needed key closest to completing a group.
    ///
    /// Ties go to the key seen first in slot order.
    #[instrument(skip(self))]
    pub fn most_needed_key(&self) -> Option<MatchKey> {
        let mut best: Option<(MatchKey, usize)> = None;
        for (key, count) in self.key_counts() {
            if count >= self.match_size {
                continue;
            }
            if best.is_none_or(|(_, top)| count > top) {
                best = Some((key, count));
            }
        }
        best.map(|(key, _)| key)
    }

    /// Empties every slot, dropping the items.
    #[instrument(skip(self))]
    pub fn clear_all(&mut self) -> Vec<TrayEvent> {
        let dropped = self.count_filled();
        self.slots.iter_mut().for_each(|slot| *slot = None);
        debug!(dropped, "Tray cleared");
        vec![TrayEvent::Cleared { dropped }, TrayEvent::Changed { filled: 0 }]
    }

    /// Puts an item back at the slot it was removed from, shifting the
    /// items after it right. Undoes a [`Tray::remove`].
    #[instrument(skip(self, item), fields(item = %item.id()))]
    pub(crate) fn reinsert(&mut self, slot: usize, item: Item) {
        let slot = slot.min(self.count_filled());
        self.slots.insert(slot, Some(item));
        match self.slots.iter().rposition(Option::is_none) {
            Some(free) => {
                self.slots.remove(free);
            }
            None => {
                warn!(slot, "Reinsert into a full tray, last item dropped");
                self.slots.pop();
            }
        }
        self.debug_check();
    }

    /// Per-key counts in first-seen slot order.
    fn key_counts(&self) -> Vec<(MatchKey, usize)> {
        let mut counts: Vec<(MatchKey, usize)> = Vec::new();
        for item in self.items() {
            let key = item.match_key();
            match counts.iter_mut().find(|(k, _)| *k == key) {
                Some((_, count)) => *count += 1,
                None => counts.push((key, 1)),
            }
        }
        counts
    }

    /// Clears any group that reached `match_size`, then compacts.
    fn resolve_matches(&mut self, events: &mut Vec<TrayEvent>) -> Option<MatchKey> {
        let mut matched = None;

        for (key, count) in self.key_counts() {
            if count != self.match_size {
                continue;
            }

            let indices: Vec<usize> = self
                .slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.as_ref().is_some_and(|item| item.match_key() == key))
                .map(|(i, _)| i)
                .collect();

            let mut cleared = Vec::with_capacity(indices.len());
            for &index in indices.iter().rev() {
                self.slots[index] = None;
                cleared.push(index);
            }

            debug!(%key, slots = ?cleared, "Match consumed");
            events.push(TrayEvent::Matched {
                key,
                slots: cleared,
            });
            matched = Some(key);
        }

        if matched.is_some() {
            self.compact();
        }
        matched
    }

    /// Stable left-pack.
    fn compact(&mut self) {
        let mut write = 0;
        for read in 0..self.slots.len() {
            if self.slots[read].is_some() {
                if read != write {
                    self.slots[write] = self.slots[read].take();
                }
                write += 1;
            }
        }
    }

    fn debug_check(&self) {
        #[cfg(debug_assertions)]
        if let Err(violations) = TrayInvariants::check_all(self) {
            debug_assert!(false, "Tray invariant violated: {}", describe(&violations));
        }
    }
}
