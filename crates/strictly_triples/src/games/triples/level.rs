//! Level budgets: a move allowance or a countdown.

use crate::settings::LevelMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Remaining budget for the live level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelCondition {
    /// No budget.
    Unlimited,
    /// Moves left before the level is lost.
    Moves {
        /// Remaining moves.
        remaining: u32,
    },
    /// Time left before the level is lost.
    Timer {
        /// Remaining time.
        remaining: Duration,
    },
}

impl LevelCondition {
    /// Builds the condition for a level mode.
    #[instrument]
    pub fn new(mode: LevelMode, moves: u32, time: Duration) -> Self {
        match mode {
            LevelMode::Unlimited => LevelCondition::Unlimited,
            LevelMode::Moves => LevelCondition::Moves { remaining: moves },
            LevelMode::Timer => LevelCondition::Timer { remaining: time },
        }
    }

    /// Spends one move. Other budgets ignore moves.
    pub fn record_move(&mut self) {
        if let LevelCondition::Moves { remaining } = self {
            *remaining = remaining.saturating_sub(1);
            debug!(remaining = *remaining, "Move spent");
        }
    }

    /// Spends time. Other budgets ignore time.
    pub fn tick(&mut self, elapsed: Duration) {
        if let LevelCondition::Timer { remaining } = self {
            *remaining = remaining.saturating_sub(elapsed);
        }
    }

    /// Returns true once the budget is gone.
    pub fn is_exhausted(&self) -> bool {
        match self {
            LevelCondition::Unlimited => false,
            LevelCondition::Moves { remaining } => *remaining == 0,
            LevelCondition::Timer { remaining } => remaining.is_zero(),
        }
    }
}
