//! Game phases, turn edges and verdicts.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Phase of a session.
///
/// `AutoplayWin` and `AutoplayLose` are sub-modes of `Playing` in which the
/// solver picks moves. `GameOver` and `GameComplete` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Collaborators wired, nothing shown yet.
    Setup,
    /// Waiting for a level to be started.
    MainMenu,
    /// Level live, moves come from input.
    Playing,
    /// Level suspended, moves rejected.
    Paused,
    /// Level live, the solver drives towards a win.
    AutoplayWin,
    /// Level live, the solver drives towards a loss.
    AutoplayLose,
    /// Lost.
    GameOver,
    /// Won.
    GameComplete,
}

impl GamePhase {
    /// Returns true once the session has an outcome.
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::GameComplete)
    }

    /// Returns true if move requests may be executed in this phase.
    pub fn accepts_moves(self) -> bool {
        matches!(
            self,
            GamePhase::Playing | GamePhase::AutoplayWin | GamePhase::AutoplayLose
        )
    }

    /// Returns true if the level is live (including its autoplay sub-modes).
    pub fn is_live(self) -> bool {
        self.accepts_moves()
    }

    /// Returns true if `to` is a legal edge from this phase.
    #[instrument]
    pub fn can_transition_to(self, to: GamePhase) -> bool {
        use GamePhase::*;
        match (self, to) {
            (Setup, MainMenu) => true,
            (MainMenu, Playing) => true,
            (Playing, Paused) | (Paused, Playing) => true,
            (Playing, AutoplayWin) | (Playing, AutoplayLose) => true,
            (AutoplayWin, Playing) | (AutoplayLose, Playing) => true,
            (Playing | AutoplayWin | AutoplayLose, GameOver | GameComplete) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Busy flag as an explicit two-state edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnState {
    /// A move may be started.
    #[default]
    Idle,
    /// A move is in flight.
    Settling,
}

/// Why a session was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossReason {
    /// An item could not be placed in the tray.
    TrayOverflow,
    /// The tray ended a move full with items left on the board.
    TrayFull,
    /// The move budget ran out.
    OutOfMoves,
    /// The level timer ran out.
    OutOfTime,
}

/// Outcome of evaluating the table after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Play on.
    Continue,
    /// Board cleared.
    Won,
    /// Session lost.
    Lost(LossReason),
}

impl Verdict {
    /// Returns true for won or lost.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Verdict::Continue)
    }

    /// The terminal phase this verdict leads to.
    pub fn phase(self) -> Option<GamePhase> {
        match self {
            Verdict::Continue => None,
            Verdict::Won => Some(GamePhase::GameComplete),
            Verdict::Lost(_) => Some(GamePhase::GameOver),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Continue => write!(f, "In progress"),
            Verdict::Won => write!(f, "Board cleared"),
            Verdict::Lost(reason) => write!(f, "Lost ({:?})", reason),
        }
    }
}
