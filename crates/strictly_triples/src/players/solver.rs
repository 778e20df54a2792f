//! Player backed by the move solver.

use super::Player;
use crate::games::triples::{BoardFacade, MoveRequest, MoveSolver, Objective, Tray};
use anyhow::Result;
use tracing::{debug, instrument};

/// Plays whatever the solver picks for its objective.
#[derive(Debug, Clone)]
pub struct SolverPlayer {
    name: String,
    solver: MoveSolver,
}

impl SolverPlayer {
    /// Creates a solver-driven player.
    pub fn new(objective: Objective) -> Self {
        Self {
            name: format!("Solver ({})", objective),
            solver: MoveSolver::new(objective),
        }
    }
}

#[async_trait::async_trait]
impl Player for SolverPlayer {
    #[instrument(skip(self, board, tray), fields(player = %self.name))]
    async fn next_request(
        &mut self,
        board: &dyn BoardFacade,
        tray: &Tray,
    ) -> Result<Option<MoveRequest>> {
        let choice = self.solver.choose(board, tray);
        debug!(?choice, "Solver player chose");
        Ok(choice.map(|choice| MoveRequest::Take(choice.primary)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
