//! Strictly Triples - tray-and-triples puzzle engine
//!
//! A grid board holds tiles; the player moves them into a small tray
//! where three of a kind are consumed. The crate provides the tray
//! matching rules, a deterministic autoplay solver, and a session state
//! machine that sequences moves and decides wins and losses.
//!
//! # Architecture
//!
//! - **Tray**: fixed slots, triple matching and left compaction
//! - **Board**: the [`BoardFacade`] seam plus a concrete [`GridBoard`]
//! - **Solver**: force-win and force-lose move selection
//! - **GameFlow**: phases, turn protocol, autoplay loop
//!
//! # Example
//!
//! ```no_run
//! use strictly_triples::{GameFlow, GameSettings, LevelMode, Objective, StopSignal};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut flow = GameFlow::seeded(GameSettings::default(), 7, None)?;
//! flow.open_menu()?;
//! flow.start(LevelMode::Unlimited)?;
//! let outcome = flow.run_autoplay(Objective::ForceWin, &StopSignal::never()).await?;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod games;
pub mod players;
mod settings;

// Crate-level exports - Settings
pub use settings::{ConfigError, GameSettings, LevelMode};

// Crate-level exports - Players
pub use players::{Player, ScriptedPlayer, SolverPlayer};

// Crate-level exports - Game types
pub use games::triples::{
    AutoplayHandle, AutoplayOutcome, BoardFacade, Cell, GameEvent, GameFlow, GameFlowBuilder,
    GamePhase, GameSnapshot, GridBoard, Item, ItemId, ItemKind, LossReason, MatchKey,
    MoveChoice, MoveError, MoveRequest, MoveSolver, NormalType, Objective, SetupError,
    StopSignal, Tray, TrayError, TrayEvent, TurnReport, Verdict,
};
