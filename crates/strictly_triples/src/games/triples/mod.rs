//! Tray-and-triples tile puzzle.
//!
//! Items move from a grid board into a fixed tray; a full group of one key
//! in the tray is consumed. Clearing the board wins, filling the tray loses.

mod action;
mod autoplay;
mod board;
mod contracts;
mod events;
mod flow;
pub mod invariants;
mod level;
mod phases;
mod snapshot;
mod solver;
mod tray;
mod types;

pub use action::{MoveError, MoveRequest, TransitionError};
pub use autoplay::{AutoplayHandle, AutoplayOutcome, StopSignal};
pub use board::{BoardFacade, GridBoard};
pub use contracts::{
    AcceptsMoves, CellOccupied, Contract, LegalRequest, NotBusy, OriginVacant, TurnContract,
};
pub use events::{GameEvent, TrayEvent};
pub use flow::{GameFlow, GameFlowBuilder, SetupError, TurnReport};
pub use level::LevelCondition;
pub use phases::{GamePhase, LossReason, TurnState, Verdict};
pub use snapshot::{BoardEntry, GameSnapshot};
pub use solver::{
    ChoiceRule, MoveChoice, MoveSolver, Objective, find_losing_move, find_winning_move,
};
pub use tray::{Placement, Removal, Tray, TrayError};
pub use types::{BonusType, Cell, Item, ItemId, ItemKind, MatchKey, NormalType};
