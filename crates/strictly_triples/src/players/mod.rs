//! Player trait and implementations.

mod scripted;
mod solver;

pub use scripted::ScriptedPlayer;
pub use solver::SolverPlayer;

use crate::games::triples::{BoardFacade, MoveRequest, Tray};
use anyhow::Result;

/// Anything that can produce move requests for a session.
#[async_trait::async_trait]
pub trait Player: Send {
    /// Gets the next request for the given position.
    ///
    /// `None` means the player has nothing more to play.
    async fn next_request(
        &mut self,
        board: &dyn BoardFacade,
        tray: &Tray,
    ) -> Result<Option<MoveRequest>>;

    /// Returns the player's display name.
    fn name(&self) -> &str;
}
