//! Triple-trigger invariant: a complete group never rests in the tray.

use super::super::Tray;
use super::Invariant;

/// Invariant: every key has fewer than `match_size` items in the tray.
pub struct NoResidentMatchInvariant;

impl Invariant<Tray> for NoResidentMatchInvariant {
    fn holds(tray: &Tray) -> bool {
        tray.items()
            .all(|item| tray.count_of(item.match_key()) < tray.match_size())
    }

    fn description() -> &'static str {
        "No key rests in the tray with a full match group"
    }
}
