//! Conservation invariant: items are never duplicated or lost mid-game.

use super::super::{BoardFacade, GameFlow};
use super::Invariant;

/// Invariant: board items + tray items + consumed items = dealt items.
///
/// Only meaningful while the level is live; teardown on a terminal phase
/// drops the remaining items on purpose.
pub struct ItemsConservedInvariant;

impl<B: BoardFacade> Invariant<GameFlow<B>> for ItemsConservedInvariant {
    fn holds(flow: &GameFlow<B>) -> bool {
        if flow.phase().is_terminal() {
            return true;
        }
        let live = flow.board().occupied_cells().len() + flow.tray().count_filled();
        live + flow.consumed() == flow.dealt()
    }

    fn description() -> &'static str {
        "Every dealt item is on the board, in the tray, or consumed"
    }
}
