//! Session orchestration: phases, the turn protocol and outcome arbitration.
//!
//! A [`GameFlow`] owns the board and the tray for one session. Moves are
//! serialized by `&mut self` plus an explicit [`TurnState`] edge, so a
//! turn is always applied, settled and evaluated before the next starts.

use super::action::{MoveError, MoveRequest, TransitionError};
use super::board::{BoardFacade, GridBoard};
use super::contracts::{Contract, TurnContract};
use super::events::{GameEvent, TrayEvent};
use super::level::LevelCondition;
use super::phases::{GamePhase, LossReason, TurnState, Verdict};
use super::snapshot::GameSnapshot;
use super::solver::{MoveChoice, MoveSolver, Objective};
use super::tray::{Tray, TrayError};
use super::types::{Cell, ItemId, MatchKey};
use crate::settings::{ConfigError, GameSettings, LevelMode};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Fatal problems while wiring a session.
#[derive(Debug, Clone, derive_more::Display)]
pub enum SetupError {
    /// A required collaborator was not supplied.
    #[display("Missing collaborator: {}", _0)]
    MissingCollaborator(&'static str),

    /// Settings failed validation.
    #[display("{}", _0)]
    Config(ConfigError),
}

impl std::error::Error for SetupError {}

impl From<ConfigError> for SetupError {
    fn from(err: ConfigError) -> Self {
        SetupError::Config(err)
    }
}

/// What one accepted request did.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct TurnReport {
    /// The request that ran.
    pub request: MoveRequest,
    /// Outcome after the move settled.
    pub verdict: Verdict,
    /// Group consumed by the move, if any.
    pub matched: Option<MatchKey>,
    /// Events in emission order.
    pub events: Vec<GameEvent>,
}

/// Wires collaborators into a [`GameFlow`].
pub struct GameFlowBuilder<B: BoardFacade = GridBoard> {
    settings: Option<GameSettings>,
    board: Option<B>,
    events: Option<mpsc::UnboundedSender<GameEvent>>,
}

impl<B: BoardFacade> Default for GameFlowBuilder<B> {
    fn default() -> Self {
        Self {
            settings: None,
            board: None,
            events: None,
        }
    }
}

impl<B: BoardFacade> GameFlowBuilder<B> {
    /// Supplies session settings.
    pub fn settings(mut self, settings: GameSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Supplies the board.
    pub fn board(mut self, board: B) -> Self {
        self.board = Some(board);
        self
    }

    /// Supplies the presentation channel.
    pub fn events(mut self, sender: mpsc::UnboundedSender<GameEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Validates the collaborators and creates a session in `Setup`.
    #[instrument(skip(self))]
    pub fn build(self) -> Result<GameFlow<B>, SetupError> {
        let settings = self
            .settings
            .ok_or(SetupError::MissingCollaborator("settings"))?;
        let board = self.board.ok_or(SetupError::MissingCollaborator("board"))?;
        settings.validate()?;

        let tray = Tray::new(*settings.tray_capacity(), *settings.match_size());
        let level = LevelCondition::new(
            *settings.level_mode(),
            *settings.level_moves(),
            settings.level_time(),
        );
        let dealt = board.occupied_cells().len();
        info!(dealt, "Session wired");

        Ok(GameFlow {
            settings,
            board,
            tray,
            phase: GamePhase::Setup,
            turn: TurnState::Idle,
            level,
            verdict: Verdict::Continue,
            moves: 0,
            consumed: 0,
            dealt,
            events: self.events,
            final_snapshot: None,
        })
    }
}

/// One puzzle session.
pub struct GameFlow<B: BoardFacade = GridBoard> {
    settings: GameSettings,
    board: B,
    tray: Tray,
    phase: GamePhase,
    turn: TurnState,
    level: LevelCondition,
    verdict: Verdict,
    moves: u32,
    consumed: usize,
    dealt: usize,
    events: Option<mpsc::UnboundedSender<GameEvent>>,
    final_snapshot: Option<GameSnapshot>,
}

impl<B: BoardFacade> std::fmt::Debug for GameFlow<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameFlow")
            .field("phase", &self.phase)
            .field("turn", &self.turn)
            .field("verdict", &self.verdict)
            .field("moves", &self.moves)
            .field("tray", &self.tray)
            .finish_non_exhaustive()
    }
}

impl GameFlow<GridBoard> {
    /// Builds a session on a freshly dealt grid board.
    ///
    /// The same seed always deals the same board.
    #[instrument(skip(settings))]
    pub fn seeded(
        settings: GameSettings,
        seed: u64,
        events: Option<mpsc::UnboundedSender<GameEvent>>,
    ) -> Result<Self, SetupError> {
        settings.validate()?;
        let mut board = GridBoard::new(*settings.board_width(), *settings.board_height());
        board.fill(*settings.match_size(), &mut StdRng::seed_from_u64(seed));

        let mut builder = GameFlowBuilder::default().settings(settings).board(board);
        if let Some(sender) = events {
            builder = builder.events(sender);
        }
        builder.build()
    }

    /// Permutes the remaining board items.
    ///
    /// Used when the autoplay finds nothing to take on a non-empty board.
    #[instrument(skip(self, rng))]
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), MoveError> {
        if !(self.phase.accepts_moves() || self.phase == GamePhase::Paused) {
            return Err(MoveError::NotAcceptingMoves(self.phase));
        }
        if self.is_busy() {
            return Err(MoveError::Busy);
        }
        self.board.shuffle(rng);
        Ok(())
    }
}

impl<B: BoardFacade> GameFlow<B> {
    /// Starts wiring a session.
    pub fn builder() -> GameFlowBuilder<B> {
        GameFlowBuilder::default()
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Current turn edge.
    pub fn turn(&self) -> TurnState {
        self.turn
    }

    /// Returns true while a move is settling.
    pub fn is_busy(&self) -> bool {
        self.turn == TurnState::Settling
    }

    /// Latest verdict.
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// The board.
    pub fn board(&self) -> &B {
        &self.board
    }

    /// The tray.
    pub fn tray(&self) -> &Tray {
        &self.tray
    }

    /// Session settings.
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Remaining level budget.
    pub fn level(&self) -> &LevelCondition {
        &self.level
    }

    /// Successful tray adds this level.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Items consumed by matches this level.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Items on the board when the level started.
    pub fn dealt(&self) -> usize {
        self.dealt
    }

    /// Current view; after a terminal phase, the view taken just before
    /// teardown.
    pub fn snapshot(&self) -> GameSnapshot {
        match (&self.final_snapshot, self.phase.is_terminal()) {
            (Some(snapshot), true) => snapshot.clone(),
            _ => GameSnapshot::capture(&*self),
        }
    }

    /// `Setup` → `MainMenu`.
    #[instrument(skip(self))]
    pub fn open_menu(&mut self) -> Result<Vec<GameEvent>, TransitionError> {
        self.transition(GamePhase::MainMenu)
    }

    /// `MainMenu` → `Playing`, arming the level budget.
    #[instrument(skip(self))]
    pub fn start(&mut self, mode: LevelMode) -> Result<Vec<GameEvent>, TransitionError> {
        if self.phase != GamePhase::MainMenu {
            return Err(TransitionError {
                from: self.phase,
                to: GamePhase::Playing,
            });
        }
        self.level = LevelCondition::new(
            mode,
            *self.settings.level_moves(),
            self.settings.level_time(),
        );
        self.moves = 0;
        self.consumed = 0;
        self.dealt = self.board.occupied_cells().len();
        self.verdict = Verdict::Continue;
        info!(%mode, dealt = self.dealt, "Level started");
        self.transition(GamePhase::Playing)
    }

    /// `Playing` → `Paused`.
    #[instrument(skip(self))]
    pub fn pause(&mut self) -> Result<Vec<GameEvent>, TransitionError> {
        self.transition(GamePhase::Paused)
    }

    /// `Paused` → `Playing`.
    #[instrument(skip(self))]
    pub fn resume(&mut self) -> Result<Vec<GameEvent>, TransitionError> {
        if self.phase != GamePhase::Paused {
            return Err(TransitionError {
                from: self.phase,
                to: GamePhase::Playing,
            });
        }
        self.transition(GamePhase::Playing)
    }

    /// `Playing` → the autoplay sub-mode for `objective`.
    #[instrument(skip(self))]
    pub fn enter_autoplay(
        &mut self,
        objective: Objective,
    ) -> Result<Vec<GameEvent>, TransitionError> {
        let to = match objective {
            Objective::ForceWin => GamePhase::AutoplayWin,
            Objective::ForceLose => GamePhase::AutoplayLose,
        };
        if self.phase != GamePhase::Playing {
            return Err(TransitionError {
                from: self.phase,
                to,
            });
        }
        self.transition(to)
    }

    /// Autoplay sub-mode → `Playing`. No-op once the session is terminal.
    #[instrument(skip(self))]
    pub fn leave_autoplay(&mut self) -> Result<Vec<GameEvent>, TransitionError> {
        match self.phase {
            GamePhase::AutoplayWin | GamePhase::AutoplayLose => {
                self.transition(GamePhase::Playing)
            }
            phase if phase.is_terminal() => Ok(Vec::new()),
            from => Err(TransitionError {
                from,
                to: GamePhase::Playing,
            }),
        }
    }

    /// The force-win choice for the current position.
    #[instrument(skip(self))]
    pub fn hint(&self) -> Option<MoveChoice> {
        if !self.phase.accepts_moves() {
            return None;
        }
        MoveSolver::new(Objective::ForceWin).choose(&self.board, &self.tray)
    }

    /// Advances the level timer. Ignored unless the level is live.
    #[instrument(skip(self))]
    pub fn tick(&mut self, elapsed: Duration) -> Result<Vec<GameEvent>, TransitionError> {
        if !self.phase.is_live() {
            return Ok(Vec::new());
        }
        self.level.tick(elapsed);
        match self.evaluate() {
            Verdict::Continue => Ok(Vec::new()),
            verdict => self.finish(verdict),
        }
    }

    /// Executes a move request from any input collaborator.
    pub async fn apply(&mut self, request: MoveRequest) -> Result<TurnReport, MoveError> {
        match request {
            MoveRequest::Take(cell) => self.request_move(cell).await,
            MoveRequest::Return(id) => self.return_to_board(id).await,
        }
    }

    /// Moves the item on `cell` to the tray and settles the outcome.
    ///
    /// If the returned future is dropped while settling, the move still
    /// completes: busy is cleared and the outcome evaluated at once.
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub async fn request_move(&mut self, cell: Cell) -> Result<TurnReport, MoveError> {
        let request = MoveRequest::Take(cell);
        TurnContract::pre(&*self, &request)?;

        let mut turn = TurnGuard::begin(self);
        let Some(mut item) = turn.board.free_cell(cell) else {
            return Err(MoveError::EmptyCell(cell));
        };
        item.set_origin(cell);
        let id = item.id();

        let placement = match turn.tray.try_add(item) {
            Ok(placement) => placement,
            Err(TrayError::Full { item, capacity }) => {
                warn!(%cell, capacity, "Tray overflow, item restored");
                if let Err(item) = turn.board.place_existing(cell, item) {
                    error!(%cell, item = %item.id(), "Could not restore overflowed item");
                }
                let mut events: Vec<GameEvent> = vec![TrayEvent::Full.into()];
                turn.emit(&events);
                turn.end_turn();
                let verdict = Verdict::Lost(LossReason::TrayOverflow);
                events.extend(turn.finish(verdict)?);
                return Ok(TurnReport::new(request, verdict, None, events));
            }
            Err(err) => return Err(MoveError::InvariantViolation(err.to_string())),
        };
        turn.applied = true;

        turn.moves += 1;
        turn.level.record_move();
        turn.consumed += placement
            .events
            .iter()
            .map(|event| match event {
                TrayEvent::Matched { slots, .. } => slots.len(),
                _ => 0,
            })
            .sum::<usize>();
        let matched = placement.matched;
        let mut events = vec![GameEvent::MoveExecuted { cell, item: id }];
        events.extend(placement.events.into_iter().map(GameEvent::from));
        turn.emit(&events);
        debug!(item = %id, ?matched, moves = turn.moves, "Move applied");

        turn.settle().await;
        let verdict = turn.evaluate();
        turn.end_turn();
        turn.check_post()?;
        if verdict.is_terminal() {
            events.extend(turn.finish(verdict)?);
        }
        Ok(TurnReport::new(request, verdict, matched, events))
    }

    /// Sends a tray item back to the cell it was taken from.
    ///
    /// A refused return leaves the tray exactly as it was.
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub async fn return_to_board(&mut self, id: ItemId) -> Result<TurnReport, MoveError> {
        let request = MoveRequest::Return(id);
        TurnContract::pre(&*self, &request)?;

        let mut turn = TurnGuard::begin(self);
        let removal = turn
            .tray
            .remove(id)
            .map_err(|_| MoveError::UnknownItem(id))?;
        let Some(cell) = removal.item.origin() else {
            turn.tray.reinsert(removal.slot, removal.item);
            return Err(MoveError::NoOrigin(id));
        };
        if let Err(item) = turn.board.place_existing(cell, removal.item) {
            turn.tray.reinsert(removal.slot, item);
            return Err(MoveError::OriginOccupied(cell));
        }
        turn.applied = true;

        let mut events: Vec<GameEvent> =
            removal.events.into_iter().map(GameEvent::from).collect();
        events.push(GameEvent::ItemReturned { item: id, cell });
        turn.emit(&events);
        debug!(item = %id, %cell, "Item returned");

        turn.settle().await;
        let verdict = turn.evaluate();
        turn.end_turn();
        turn.check_post()?;
        if verdict.is_terminal() {
            events.extend(turn.finish(verdict)?);
        }
        Ok(TurnReport::new(request, verdict, None, events))
    }

    /// Marks a move as in flight.
    pub(crate) fn begin_turn(&mut self) {
        self.turn = TurnState::Settling;
    }

    /// Clears the in-flight mark.
    pub(crate) fn end_turn(&mut self) {
        self.turn = TurnState::Idle;
    }

    /// Waits out the settle delay.
    async fn settle(&self) {
        let delay = self.settings.settle_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Win is checked before any loss.
    fn evaluate(&self) -> Verdict {
        if self.board.is_empty() {
            return Verdict::Won;
        }
        if self.tray.is_full() {
            return Verdict::Lost(LossReason::TrayFull);
        }
        if self.level.is_exhausted() {
            let reason = match self.level {
                LevelCondition::Timer { .. } => LossReason::OutOfTime,
                _ => LossReason::OutOfMoves,
            };
            return Verdict::Lost(reason);
        }
        Verdict::Continue
    }

    fn check_post(&self) -> Result<(), MoveError> {
        if cfg!(debug_assertions) {
            TurnContract::post(self)
                .inspect_err(|e| error!(error = %e, "Postcondition failed"))?;
        }
        Ok(())
    }

    /// Records a terminal verdict and enters its phase.
    pub(crate) fn finish(&mut self, verdict: Verdict) -> Result<Vec<GameEvent>, TransitionError> {
        self.verdict = verdict;
        match verdict.phase() {
            Some(phase) => {
                info!(%verdict, moves = self.moves, "Session decided");
                self.transition(phase)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Applies a phase edge. Terminal phases tear the table down.
    fn transition(&mut self, to: GamePhase) -> Result<Vec<GameEvent>, TransitionError> {
        let from = self.phase;
        if !from.can_transition_to(to) {
            warn!(%from, %to, "Illegal phase transition refused");
            return Err(TransitionError { from, to });
        }
        self.phase = to;
        info!(%from, %to, "Phase changed");

        let mut events = vec![GameEvent::PhaseChanged { from, to }];
        if to.is_terminal() {
            self.final_snapshot = Some(GameSnapshot::capture(&*self));
            self.turn = TurnState::Idle;
            let dropped = self.board.clear();
            events.extend(self.tray.clear_all().into_iter().map(GameEvent::from));
            debug!(dropped, "Table torn down");
        }
        self.emit(&events);
        Ok(events)
    }

    /// Forwards events to the presentation channel. A closed channel is
    /// not an error.
    pub(crate) fn emit(&self, events: &[GameEvent]) {
        if let Some(sender) = &self.events {
            for event in events {
                if sender.send(event.clone()).is_err() {
                    debug!("Event receiver dropped");
                    break;
                }
            }
        }
    }
}

/// Busy edge for one turn.
///
/// Dropping the guard clears busy on every exit path. When a turn future
/// is dropped mid-settle after its move was applied, the outcome is
/// evaluated on the spot; only the rest of the delay is skipped.
struct TurnGuard<'a, B: BoardFacade> {
    flow: &'a mut GameFlow<B>,
    applied: bool,
}

impl<'a, B: BoardFacade> TurnGuard<'a, B> {
    fn begin(flow: &'a mut GameFlow<B>) -> Self {
        flow.begin_turn();
        Self {
            flow,
            applied: false,
        }
    }
}

impl<B: BoardFacade> Deref for TurnGuard<'_, B> {
    type Target = GameFlow<B>;

    fn deref(&self) -> &GameFlow<B> {
        self.flow
    }
}

impl<B: BoardFacade> DerefMut for TurnGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut GameFlow<B> {
        self.flow
    }
}

impl<B: BoardFacade> Drop for TurnGuard<'_, B> {
    fn drop(&mut self) {
        if !self.flow.is_busy() {
            return;
        }
        self.flow.end_turn();
        if !self.applied {
            return;
        }

        warn!("Turn dropped while settling, evaluating now");
        let verdict = self.flow.evaluate();
        if verdict.is_terminal() {
            if let Err(err) = self.flow.finish(verdict) {
                error!(error = %err, "Could not enter terminal phase");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::triples::{Item, ItemKind, NormalType};

    const A: ItemKind = ItemKind::Normal(NormalType::One);
    const B: ItemKind = ItemKind::Normal(NormalType::Two);

    fn settings() -> GameSettings {
        GameSettings::default().without_delays()
    }

    fn flow_on(board: GridBoard, settings: GameSettings) -> GameFlow<GridBoard> {
        let mut flow = GameFlow::builder()
            .settings(settings)
            .board(board)
            .build()
            .unwrap();
        flow.open_menu().unwrap();
        flow.start(LevelMode::Unlimited).unwrap();
        flow
    }

    #[test]
    fn test_build_requires_board() {
        let err = GameFlowBuilder::<GridBoard>::default()
            .settings(settings())
            .build()
            .unwrap_err();
        assert!(matches!(err, SetupError::MissingCollaborator("board")));
    }

    #[test]
    fn test_build_rejects_invalid_settings() {
        let err = GameFlow::builder()
            .settings(settings().with_tray_capacity(1))
            .board(GridBoard::new(3, 3))
            .build()
            .unwrap_err();
        assert!(matches!(err, SetupError::Config(_)));
    }

    #[test]
    fn test_start_only_from_menu() {
        let mut flow = GameFlow::builder()
            .settings(settings())
            .board(GridBoard::new(3, 3))
            .build()
            .unwrap();
        assert!(flow.start(LevelMode::Unlimited).is_err());
        flow.open_menu().unwrap();
        assert!(flow.start(LevelMode::Unlimited).is_ok());
        assert_eq!(flow.phase(), GamePhase::Playing);
    }

    #[tokio::test]
    async fn test_last_item_wins() {
        let mut board = GridBoard::new(3, 1);
        for x in 0..3 {
            board.place(Cell::new(x, 0), A);
        }
        let mut flow = flow_on(board, settings());

        flow.request_move(Cell::new(0, 0)).await.unwrap();
        flow.request_move(Cell::new(1, 0)).await.unwrap();
        let report = flow.request_move(Cell::new(2, 0)).await.unwrap();

        assert_eq!(report.verdict, Verdict::Won);
        assert_eq!(report.matched, Some(A.match_key()));
        assert_eq!(flow.phase(), GamePhase::GameComplete);
        assert_eq!(flow.consumed(), 3);
        assert!(!flow.is_busy());
    }

    #[tokio::test]
    async fn test_pause_rejects_moves() {
        let mut board = GridBoard::new(2, 1);
        board.place(Cell::new(0, 0), A);
        board.place(Cell::new(1, 0), B);
        let mut flow = flow_on(board, settings());

        flow.pause().unwrap();
        assert_eq!(
            flow.request_move(Cell::new(0, 0)).await.unwrap_err(),
            MoveError::NotAcceptingMoves(GamePhase::Paused)
        );
        flow.resume().unwrap();
        assert!(flow.request_move(Cell::new(0, 0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_return_sends_item_home() {
        let mut board = GridBoard::new(2, 1);
        board.place(Cell::new(0, 0), A);
        board.place(Cell::new(1, 0), B);
        let mut flow = flow_on(board, settings());

        flow.request_move(Cell::new(0, 0)).await.unwrap();
        let id = flow.tray().items().next().map(|item| item.id()).unwrap();
        let report = flow.return_to_board(id).await.unwrap();

        assert!(report.events.contains(&GameEvent::ItemReturned {
            item: id,
            cell: Cell::new(0, 0)
        }));
        assert!(flow.tray().is_empty());
        assert_eq!(flow.board().item_at(Cell::new(0, 0)).map(|i| i.id()), Some(id));
    }

    #[test]
    fn test_timer_ignored_while_paused() {
        let mut board = GridBoard::new(2, 1);
        board.place(Cell::new(0, 0), A);
        let mut flow = GameFlow::builder()
            .settings(settings())
            .board(board)
            .build()
            .unwrap();
        flow.open_menu().unwrap();
        flow.start(LevelMode::Timer).unwrap();

        flow.pause().unwrap();
        flow.tick(Duration::from_secs(3600)).unwrap();
        assert_eq!(flow.phase(), GamePhase::Paused);

        flow.resume().unwrap();
        flow.tick(Duration::from_secs(3600)).unwrap();
        assert_eq!(flow.phase(), GamePhase::GameOver);
        assert_eq!(flow.verdict(), Verdict::Lost(LossReason::OutOfTime));
    }

    #[test]
    fn test_hint_only_while_live() {
        let mut board = GridBoard::new(2, 1);
        board.place(Cell::new(1, 0), A);
        let mut flow = GameFlow::builder()
            .settings(settings())
            .board(board)
            .build()
            .unwrap();
        assert_eq!(flow.hint(), None);
        flow.open_menu().unwrap();
        flow.start(LevelMode::Unlimited).unwrap();
        assert_eq!(flow.hint().map(|c| c.primary), Some(Cell::new(1, 0)));
    }

    #[tokio::test]
    async fn test_return_to_taken_cell_is_refused() {
        let mut board = GridBoard::new(2, 1);
        board.place(Cell::new(0, 0), A);
        board.place(Cell::new(1, 0), B);
        let mut flow = flow_on(board, settings());

        flow.request_move(Cell::new(0, 0)).await.unwrap();
        flow.request_move(Cell::new(1, 0)).await.unwrap();
        let id = flow.tray().items().next().map(|item| item.id()).unwrap();
        flow.board.place(Cell::new(0, 0), B);
        let before = flow.tray().slots().to_vec();

        assert_eq!(
            flow.return_to_board(id).await.unwrap_err(),
            MoveError::OriginOccupied(Cell::new(0, 0))
        );
        assert_eq!(flow.tray().slots(), before.as_slice());
        assert_eq!(flow.board().item_at(Cell::new(0, 0)).map(|i| i.kind()), Some(B));
        assert!(!flow.is_busy());
    }

    #[tokio::test]
    async fn test_return_without_origin_is_refused() {
        let mut board = GridBoard::new(2, 1);
        board.place(Cell::new(0, 0), A);
        board.place(Cell::new(1, 0), B);
        let mut flow = flow_on(board, settings());

        flow.request_move(Cell::new(0, 0)).await.unwrap();
        let stray = ItemId(500);
        flow.tray.try_add(Item::new(stray, B)).unwrap();
        flow.dealt += 1;
        let before = flow.tray().slots().to_vec();

        assert_eq!(
            flow.return_to_board(stray).await.unwrap_err(),
            MoveError::NoOrigin(stray)
        );
        assert_eq!(flow.tray().slots(), before.as_slice());
        assert_eq!(flow.tray().slots()[1].as_ref().map(|i| i.id()), Some(stray));
        assert!(!flow.is_busy());
    }

    #[tokio::test]
    async fn test_overflow_reports_no_executed_move() {
        let mut board = GridBoard::new(2, 1);
        board.place(Cell::new(0, 0), A);
        board.place(Cell::new(1, 0), B);
        let mut flow = flow_on(board, settings().with_tray_capacity(3));
        for (n, normal) in [NormalType::Three, NormalType::Four, NormalType::Five]
            .into_iter()
            .enumerate()
        {
            flow.tray
                .try_add(Item::new(ItemId(900 + n as u32), ItemKind::Normal(normal)))
                .unwrap();
        }

        let report = flow.request_move(Cell::new(0, 0)).await.unwrap();

        assert_eq!(report.verdict, Verdict::Lost(LossReason::TrayOverflow));
        assert!(report.events.contains(&GameEvent::Tray(TrayEvent::Full)));
        assert!(
            !report
                .events
                .iter()
                .any(|event| matches!(event, GameEvent::MoveExecuted { .. }))
        );
        assert_eq!(flow.moves(), 0);
        assert!(!flow.is_busy());
        assert!(
            flow.snapshot()
                .board()
                .iter()
                .any(|entry| entry.cell == Cell::new(0, 0))
        );
    }

    #[tokio::test]
    async fn test_post_reports_lost_items() {
        let mut board = GridBoard::new(2, 1);
        board.place(Cell::new(0, 0), A);
        board.place(Cell::new(1, 0), B);
        let mut flow = flow_on(board, settings());
        assert!(TurnContract::post(&flow).is_ok());

        flow.dealt += 1;
        let err = TurnContract::post(&flow).unwrap_err();
        assert!(err.to_string().contains("Every dealt item"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_turn_clears_busy_and_counts() {
        let mut board = GridBoard::new(3, 1);
        for x in 0..3 {
            board.place(Cell::new(x, 0), A);
        }
        let mut flow = flow_on(board, GameSettings::default());

        for x in 0..3 {
            let dropped = tokio::time::timeout(
                Duration::from_millis(1),
                flow.request_move(Cell::new(x, 0)),
            )
            .await;
            assert!(dropped.is_err());
            assert!(!flow.is_busy());
        }

        assert_eq!(flow.phase(), GamePhase::GameComplete);
        assert_eq!(flow.verdict(), Verdict::Won);
        assert_eq!(flow.consumed(), 3);
    }
}
