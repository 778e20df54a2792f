//! Move selection for autoplay.
//!
//! Both objectives are pure functions of the board and tray: the same
//! position always yields the same choice.

use super::board::BoardFacade;
use super::tray::Tray;
use super::types::{Cell, MatchKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// What the autoplay is steering towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Objective {
    /// Clear the board.
    ForceWin,
    /// Overflow the tray.
    ForceLose,
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Objective::ForceWin => write!(f, "winning"),
            Objective::ForceLose => write!(f, "losing"),
        }
    }
}

/// Which heuristic produced a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceRule {
    /// The cell holds a key the tray is already collecting.
    CompletesGroup,
    /// Nothing to complete; the tray still has room.
    KeepPlaying,
    /// Last resort so the loop does not stall.
    SafeFallback,
    /// Any item, to push the tray over.
    Overflow,
}

/// A selected move.
///
/// Only `primary` is executed. `secondary` is advisory and kept for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveChoice {
    /// Cell to take an item from.
    pub primary: Cell,
    /// Companion cell, if the heuristic names one.
    pub secondary: Option<Cell>,
    /// Heuristic that fired.
    pub rule: ChoiceRule,
}

/// Deterministic move picker for one objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSolver {
    objective: Objective,
}

impl MoveSolver {
    /// Creates a solver for the given objective.
    pub fn new(objective: Objective) -> Self {
        Self { objective }
    }

    /// Returns the objective.
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Picks a move, or `None` if the board has nothing to take.
    #[instrument(skip(board, tray), fields(objective = %self.objective))]
    pub fn choose(&self, board: &dyn BoardFacade, tray: &Tray) -> Option<MoveChoice> {
        let choice = match self.objective {
            Objective::ForceWin => find_winning_move(board, tray),
            Objective::ForceLose => find_losing_move(board),
        };
        debug!(?choice, "Solver decision");
        choice
    }
}

/// Force-win heuristic.
///
/// 1. Take an item whose key the tray is collecting, most-needed key first.
/// 2. Otherwise take the first item while the tray has room.
/// 3. Otherwise take the first item anyway.
///
/// Steps 2 and 3 make no provable progress towards a match.
#[instrument(skip(board, tray))]
pub fn find_winning_move(board: &dyn BoardFacade, tray: &Tray) -> Option<MoveChoice> {
    let cells = board.occupied_cells();
    if cells.is_empty() {
        return None;
    }

    let key_of = |cell: &Cell| board.item_at(*cell).map(|item| item.match_key());
    let needed = tray.needed_keys();
    if !needed.is_empty() {
        let preferred = tray
            .most_needed_key()
            .and_then(|key| cells.iter().find(|c| key_of(*c) == Some(key)));
        let any_needed = || {
            cells
                .iter()
                .find(|c| key_of(*c).is_some_and(|k: MatchKey| needed.contains(&k)))
        };

        if let Some(&primary) = preferred.or_else(any_needed) {
            let secondary = cells
                .iter()
                .find(|&&c| c != primary && board.is_neighbor(primary, c))
                .or_else(|| cells.iter().find(|&&c| c != primary))
                .copied();
            return Some(MoveChoice {
                primary,
                secondary,
                rule: ChoiceRule::CompletesGroup,
            });
        }
    }

    if !board.is_empty() && tray.count_filled() < tray.capacity() {
        return Some(MoveChoice {
            primary: cells[0],
            secondary: None,
            rule: ChoiceRule::KeepPlaying,
        });
    }

    find_safe_move(&cells)
}

/// Force-lose heuristic: any item will do.
#[instrument(skip(board))]
pub fn find_losing_move(board: &dyn BoardFacade) -> Option<MoveChoice> {
    board.occupied_cells().first().map(|&primary| MoveChoice {
        primary,
        secondary: None,
        rule: ChoiceRule::Overflow,
    })
}

fn find_safe_move(cells: &[Cell]) -> Option<MoveChoice> {
    let primary = *cells.first()?;
    Some(MoveChoice {
        primary,
        secondary: cells.get(1).copied(),
        rule: ChoiceRule::SafeFallback,
    })
}
