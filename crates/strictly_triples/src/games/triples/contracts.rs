//! Contract-based validation for turns.
//!
//! Preconditions decide whether a request may run at all; the
//! postcondition re-checks the table once the move has been applied.

use super::action::{MoveError, MoveRequest};
use super::board::BoardFacade;
use super::flow::GameFlow;
use super::invariants::{
    Invariant, InvariantSet, InvariantViolation, ItemsConservedInvariant, TrayInvariants,
    describe,
};
use super::types::{Cell, ItemId};
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// Preconditions and postconditions around an action.
///
/// - Precondition: must hold before the action touches any state.
/// - Postcondition: must hold once the action has been applied.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), MoveError>;

    /// Checks postconditions after applying the action.
    fn post(state: &S) -> Result<(), MoveError>;
}

// ─────────────────────────────────────────────────────────────
//  Turn Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: no move is settling.
pub struct NotBusy;

impl NotBusy {
    /// Rejects with [`MoveError::Busy`] while a move is in flight.
    #[instrument(skip(flow))]
    pub fn check<B: BoardFacade>(flow: &GameFlow<B>) -> Result<(), MoveError> {
        if flow.is_busy() {
            Err(MoveError::Busy)
        } else {
            Ok(())
        }
    }
}

/// Precondition: the phase takes moves.
pub struct AcceptsMoves;

impl AcceptsMoves {
    /// Rejects outside `Playing` and its autoplay sub-modes.
    #[instrument(skip(flow))]
    pub fn check<B: BoardFacade>(flow: &GameFlow<B>) -> Result<(), MoveError> {
        let phase = flow.phase();
        if phase.accepts_moves() {
            Ok(())
        } else {
            Err(MoveError::NotAcceptingMoves(phase))
        }
    }
}

/// Precondition: the cell holds an item.
pub struct CellOccupied;

impl CellOccupied {
    /// Rejects with [`MoveError::EmptyCell`] if nothing sits on `cell`.
    #[instrument(skip(flow))]
    pub fn check<B: BoardFacade>(cell: Cell, flow: &GameFlow<B>) -> Result<(), MoveError> {
        match flow.board().item_at(cell) {
            Some(_) => Ok(()),
            None => Err(MoveError::EmptyCell(cell)),
        }
    }
}

/// Precondition: the item is in the tray and its board cell is free.
pub struct OriginVacant;

impl OriginVacant {
    /// Rejects unknown items, items without an origin, and occupied origins.
    #[instrument(skip(flow))]
    pub fn check<B: BoardFacade>(id: ItemId, flow: &GameFlow<B>) -> Result<(), MoveError> {
        let item = flow.tray().get(id).ok_or(MoveError::UnknownItem(id))?;
        let origin = item.origin().ok_or(MoveError::NoOrigin(id))?;
        if flow.board().item_at(origin).is_some() {
            return Err(MoveError::OriginOccupied(origin));
        }
        Ok(())
    }
}

/// Composite precondition for any move request.
pub struct LegalRequest;

impl LegalRequest {
    /// Validates all preconditions, busy first.
    #[instrument(skip(flow))]
    pub fn check<B: BoardFacade>(
        request: &MoveRequest,
        flow: &GameFlow<B>,
    ) -> Result<(), MoveError> {
        NotBusy::check(flow)?;
        AcceptsMoves::check(flow)?;
        match *request {
            MoveRequest::Take(cell) => CellOccupied::check(cell, flow),
            MoveRequest::Return(id) => OriginVacant::check(id, flow),
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Turn Contract (Pre + Post)
// ─────────────────────────────────────────────────────────────

/// Contract for a single turn.
///
/// Preconditions:
/// - No move is settling
/// - Phase accepts moves
/// - Take: the cell is occupied
/// - Return: the item is in the tray, has an origin, and the origin is free
///
/// Postconditions:
/// - Tray occupied slots form a prefix
/// - No key rests in the tray with a full group
/// - Every dealt item is on the board, in the tray, or consumed
pub struct TurnContract;

impl<B: BoardFacade> Contract<GameFlow<B>, MoveRequest> for TurnContract {
    fn pre(flow: &GameFlow<B>, request: &MoveRequest) -> Result<(), MoveError> {
        LegalRequest::check(request, flow)
            .inspect_err(|e| warn!(%request, error = %e, "Move rejected"))
    }

    fn post(flow: &GameFlow<B>) -> Result<(), MoveError> {
        let mut violations = TrayInvariants::check_all(flow.tray())
            .err()
            .unwrap_or_default();
        if !<ItemsConservedInvariant as Invariant<GameFlow<B>>>::holds(flow) {
            violations.push(InvariantViolation::new(
                <ItemsConservedInvariant as Invariant<GameFlow<B>>>::description(),
            ));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(MoveError::InvariantViolation(format!(
                "Postcondition failed: {}",
                describe(&violations)
            )))
        }
    }
}
