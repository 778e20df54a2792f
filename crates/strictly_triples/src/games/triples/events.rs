//! Notifications for the presentation layer.
//!
//! Mutating operations return their events instead of calling observers
//! inline; the game flow forwards them to an optional channel.

use super::phases::GamePhase;
use super::types::{Cell, ItemId, ItemKind, MatchKey};
use serde::{Deserialize, Serialize};

/// Something that happened inside the tray.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrayEvent {
    /// An item landed in a slot.
    ItemAdded {
        /// The item.
        item: ItemId,
        /// Its kind.
        kind: ItemKind,
        /// Slot index it was placed in.
        slot: usize,
    },
    /// A full group was consumed. Slots are listed in clearing order.
    Matched {
        /// Key of the consumed group.
        key: MatchKey,
        /// Slots that were cleared, highest index first.
        slots: Vec<usize>,
    },
    /// An add was refused because every slot is taken.
    Full,
    /// All slots were emptied.
    Cleared {
        /// Number of items dropped.
        dropped: usize,
    },
    /// Slot contents changed.
    Changed {
        /// Occupied slot count after the change.
        filled: usize,
    },
}

/// Notification emitted by the game flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Forwarded tray event.
    Tray(TrayEvent),
    /// A board item was moved to the tray.
    MoveExecuted {
        /// Source cell.
        cell: Cell,
        /// The moved item.
        item: ItemId,
    },
    /// A tray item went back to its board cell.
    ItemReturned {
        /// The returned item.
        item: ItemId,
        /// The cell it went back to.
        cell: Cell,
    },
    /// The game phase changed.
    PhaseChanged {
        /// Phase before.
        from: GamePhase,
        /// Phase after.
        to: GamePhase,
    },
    /// The autoplay loop stopped without reaching a terminal phase.
    AutoplayHalted {
        /// Human-readable reason.
        reason: String,
    },
}

impl From<TrayEvent> for GameEvent {
    fn from(event: TrayEvent) -> Self {
        GameEvent::Tray(event)
    }
}
