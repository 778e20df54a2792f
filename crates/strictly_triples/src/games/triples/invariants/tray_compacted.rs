//! Compaction invariant: occupied tray slots form a prefix.

use super::super::Tray;
use super::Invariant;

/// Invariant: no empty slot sits before an occupied one.
pub struct TrayCompactedInvariant;

impl Invariant<Tray> for TrayCompactedInvariant {
    fn holds(tray: &Tray) -> bool {
        let filled = tray.count_filled();
        tray.slots()[..filled].iter().all(Option::is_some)
    }

    fn description() -> &'static str {
        "Occupied tray slots are contiguous from index 0"
    }
}
