//! Move requests and the errors they can be rejected with.
//!
//! Rejections are ordinary values: nothing about a rejected request
//! changes the session.

use super::phases::GamePhase;
use super::types::{Cell, ItemId};
use serde::{Deserialize, Serialize};

/// A request from an input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRequest {
    /// Move the item on a board cell to the tray.
    Take(Cell),
    /// Send a tray item back to the cell it came from.
    Return(ItemId),
}

impl std::fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveRequest::Take(cell) => write!(f, "take {}", cell),
            MoveRequest::Return(item) => write!(f, "return {}", item),
        }
    }
}

/// Why a move request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// A previous move is still settling.
    #[display("A move is already in progress")]
    Busy,

    /// The current phase does not accept moves.
    #[display("Moves are not accepted while {}", _0)]
    NotAcceptingMoves(GamePhase),

    /// The board cell holds nothing.
    #[display("Cell {} is empty", _0)]
    EmptyCell(Cell),

    /// The item is not in the tray.
    #[display("Item {} is not in the tray", _0)]
    UnknownItem(ItemId),

    /// The item never came from the board.
    #[display("Item {} has no board cell to return to", _0)]
    NoOrigin(ItemId),

    /// The item's board cell is taken.
    #[display("Cell {} is occupied", _0)]
    OriginOccupied(Cell),

    /// A postcondition failed.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),

    /// The move's outcome needed a phase edge that was refused.
    #[display("{}", _0)]
    Transition(TransitionError),
}

impl std::error::Error for MoveError {}

impl From<TransitionError> for MoveError {
    fn from(err: TransitionError) -> Self {
        MoveError::Transition(err)
    }
}

/// An illegal phase edge was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Cannot go from {} to {}", from, to)]
pub struct TransitionError {
    /// Current phase.
    pub from: GamePhase,
    /// Requested phase.
    pub to: GamePhase,
}
