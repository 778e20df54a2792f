//! Tests for the autoplay loop and player-driven sessions.

use strictly_triples::{
    AutoplayOutcome, BoardFacade, Cell, GameEvent, GameFlow, GamePhase, GameSettings, GridBoard,
    Item, ItemKind, LevelMode, LossReason, MoveError, MoveRequest, NormalType, Objective,
    ScriptedPlayer, SolverPlayer, StopSignal, Verdict,
};
use std::time::Duration;
use tokio::sync::mpsc;

fn settings() -> GameSettings {
    GameSettings::default().without_delays()
}

fn started<B: BoardFacade>(board: B) -> GameFlow<B> {
    let mut flow = GameFlow::builder()
        .settings(settings())
        .board(board)
        .build()
        .unwrap();
    flow.open_menu().unwrap();
    flow.start(LevelMode::Unlimited).unwrap();
    flow
}

#[tokio::test]
async fn test_force_win_clears_dealt_boards() {
    for seed in [0, 1, 7, 42, 1234] {
        let mut flow = GameFlow::seeded(settings(), seed, None).unwrap();
        flow.open_menu().unwrap();
        flow.start(LevelMode::Unlimited).unwrap();
        let dealt = flow.dealt();

        let outcome = flow
            .run_autoplay(Objective::ForceWin, &StopSignal::never())
            .await
            .unwrap();

        assert_eq!(outcome, AutoplayOutcome::Finished(Verdict::Won), "seed {}", seed);
        assert_eq!(flow.phase(), GamePhase::GameComplete);
        assert_eq!(flow.consumed(), dealt);
        assert!(!flow.is_busy());
    }
}

#[tokio::test]
async fn test_force_lose_fills_the_tray() {
    let mut board = GridBoard::new(6, 1);
    for (x, normal) in [
        NormalType::One,
        NormalType::Two,
        NormalType::Three,
        NormalType::Four,
        NormalType::Five,
        NormalType::Six,
    ]
    .into_iter()
    .enumerate()
    {
        board.place(Cell::new(x as u8, 0), ItemKind::Normal(normal));
    }
    let mut flow = started(board);

    let outcome = flow
        .run_autoplay(Objective::ForceLose, &StopSignal::never())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AutoplayOutcome::Finished(Verdict::Lost(LossReason::TrayFull))
    );
    assert_eq!(flow.phase(), GamePhase::GameOver);
    assert_eq!(flow.moves(), 5);
}

#[tokio::test]
async fn test_force_win_on_empty_board_completes() {
    let mut flow = started(GridBoard::new(5, 5));
    let outcome = flow
        .run_autoplay(Objective::ForceWin, &StopSignal::never())
        .await
        .unwrap();
    assert_eq!(outcome, AutoplayOutcome::Finished(Verdict::Won));
    assert_eq!(flow.phase(), GamePhase::GameComplete);
}

#[tokio::test]
async fn test_stop_before_first_move_returns_to_playing() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut flow = GameFlow::seeded(settings(), 3, Some(tx)).unwrap();
    flow.open_menu().unwrap();
    flow.start(LevelMode::Unlimited).unwrap();

    let (handle, stop) = StopSignal::channel();
    handle.stop();
    let outcome = flow.run_autoplay(Objective::ForceWin, &stop).await.unwrap();

    assert_eq!(outcome, AutoplayOutcome::Stopped);
    assert_eq!(flow.phase(), GamePhase::Playing);
    assert_eq!(flow.moves(), 0);

    drop(flow);
    let mut halted = false;
    while let Some(event) = rx.recv().await {
        halted |= matches!(event, GameEvent::AutoplayHalted { .. });
    }
    assert!(halted);
}

/// A board that reports items but offers no cell to take them from.
struct StuckBoard;

impl BoardFacade for StuckBoard {
    fn occupied_cells(&self) -> Vec<Cell> {
        Vec::new()
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn is_neighbor(&self, _a: Cell, _b: Cell) -> bool {
        false
    }

    fn item_at(&self, _cell: Cell) -> Option<&Item> {
        None
    }

    fn free_cell(&mut self, _cell: Cell) -> Option<Item> {
        None
    }

    fn place_existing(&mut self, _cell: Cell, item: Item) -> Result<(), Item> {
        Err(item)
    }

    fn matches_at(&self, _cell: Cell, _min_len: usize) -> Vec<Cell> {
        Vec::new()
    }

    fn clear(&mut self) -> usize {
        0
    }
}

#[tokio::test]
async fn test_stalled_board_asks_for_reshuffle() {
    let mut flow = started(StuckBoard);
    let outcome = flow
        .run_autoplay(Objective::ForceWin, &StopSignal::never())
        .await
        .unwrap();
    assert_eq!(outcome, AutoplayOutcome::NeedsReshuffle);
    assert_eq!(flow.phase(), GamePhase::Playing);
}

#[tokio::test]
async fn test_scripted_player_skips_rejected_requests() {
    let mut board = GridBoard::new(3, 1);
    for x in 0..3 {
        board.place(Cell::new(x, 0), ItemKind::Normal(NormalType::Two));
    }
    let mut flow = started(board);
    let mut player = ScriptedPlayer::new(
        "script",
        [
            MoveRequest::Take(Cell::new(0, 0)),
            MoveRequest::Take(Cell::new(0, 0)),
            MoveRequest::Take(Cell::new(1, 0)),
            MoveRequest::Take(Cell::new(2, 0)),
        ],
    );

    let outcome = flow
        .run_player(&mut player, &StopSignal::never())
        .await
        .unwrap();

    assert_eq!(outcome, AutoplayOutcome::Finished(Verdict::Won));
    assert_eq!(player.remaining(), 0);
    assert_eq!(flow.moves(), 3);
}

#[tokio::test]
async fn test_scripted_player_runs_dry() {
    let mut board = GridBoard::new(2, 1);
    board.place(Cell::new(0, 0), ItemKind::Normal(NormalType::One));
    board.place(Cell::new(1, 0), ItemKind::Normal(NormalType::One));
    let mut flow = started(board);
    let mut player = ScriptedPlayer::new("script", [MoveRequest::Take(Cell::new(0, 0))]);

    let outcome = flow
        .run_player(&mut player, &StopSignal::never())
        .await
        .unwrap();

    assert_eq!(outcome, AutoplayOutcome::InputExhausted);
    assert_eq!(flow.phase(), GamePhase::Playing);
}

#[tokio::test]
async fn test_solver_player_drives_a_session() {
    let mut flow = GameFlow::seeded(settings(), 9, None).unwrap();
    flow.open_menu().unwrap();
    flow.start(LevelMode::Unlimited).unwrap();
    let mut player = SolverPlayer::new(Objective::ForceWin);

    let outcome = flow
        .run_player(&mut player, &StopSignal::never())
        .await
        .unwrap();
    assert_eq!(outcome, AutoplayOutcome::Finished(Verdict::Won));
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_run_leaves_a_consistent_session() {
    let mut flow = GameFlow::seeded(GameSettings::default(), 11, None).unwrap();
    flow.open_menu().unwrap();
    flow.start(LevelMode::Unlimited).unwrap();
    let dealt = flow.dealt();

    let (handle, stop) = StopSignal::channel();
    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.stop();
    });
    let outcome = flow.run_autoplay(Objective::ForceWin, &stop).await.unwrap();
    stopper.await.unwrap();

    assert_eq!(outcome, AutoplayOutcome::Stopped);
    assert_eq!(flow.phase(), GamePhase::Playing);
    assert!(flow.moves() > 0);
    assert!(!flow.is_busy());
    assert!(!flow.board().is_empty());
    assert_eq!(
        flow.board().occupied_cells().len() + flow.tray().count_filled() + flow.consumed(),
        dealt
    );
}

#[tokio::test(start_paused = true)]
async fn test_timer_level_runs_out_during_autoplay() {
    let settings = GameSettings::default().with_level_time_secs(5);
    let mut flow = GameFlow::seeded(settings, 5, None).unwrap();
    flow.open_menu().unwrap();
    flow.start(LevelMode::Timer).unwrap();

    let outcome = flow
        .run_autoplay(Objective::ForceWin, &StopSignal::never())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AutoplayOutcome::Finished(Verdict::Lost(LossReason::OutOfTime))
    );
    assert_eq!(flow.phase(), GamePhase::GameOver);
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn test_player_stops_when_moves_are_not_accepted() {
    let mut flow = GameFlow::seeded(settings(), 2, None).unwrap();
    flow.open_menu().unwrap();
    flow.start(LevelMode::Unlimited).unwrap();
    flow.pause().unwrap();
    let mut player = SolverPlayer::new(Objective::ForceWin);

    let outcome = flow
        .run_player(&mut player, &StopSignal::never())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AutoplayOutcome::Rejected(MoveError::NotAcceptingMoves(GamePhase::Paused))
    );
    assert_eq!(flow.moves(), 0);
}

#[tokio::test]
async fn test_player_gives_up_after_repeated_rejections() {
    let mut board = GridBoard::new(2, 1);
    board.place(Cell::new(1, 0), ItemKind::Normal(NormalType::One));
    let mut flow = started(board);
    let empty = MoveRequest::Take(Cell::new(0, 0));
    let mut player = ScriptedPlayer::new("script", std::iter::repeat_n(empty, 10));

    let outcome = flow
        .run_player(&mut player, &StopSignal::never())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AutoplayOutcome::Rejected(MoveError::EmptyCell(Cell::new(0, 0)))
    );
    assert!(player.remaining() > 0);
    assert_eq!(flow.phase(), GamePhase::Playing);
}
