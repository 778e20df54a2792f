//! Strictly Triples - headless CLI
//!
//! Deals seeded boards and lets the solver play them.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use strictly_triples::{
    AutoplayOutcome, GameEvent, GameFlow, GameSettings, LevelMode, Objective, StopSignal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Autoplay {
            objective,
            seed,
            config,
            mode,
            json,
        } => run_autoplay(objective.into(), seed, config, mode, json).await,
        Command::Show { seed, config } => run_show(seed, config),
    }
}

/// Loads settings from a file, or defaults when none is given.
#[instrument]
fn load_settings(config: Option<PathBuf>) -> Result<GameSettings> {
    Ok(match config {
        Some(path) => GameSettings::from_file(path)?,
        None => GameSettings::default(),
    })
}

/// Plays one seeded board with the solver.
#[instrument]
async fn run_autoplay(
    objective: Objective,
    seed: u64,
    config: Option<PathBuf>,
    mode: Option<LevelMode>,
    json: bool,
) -> Result<()> {
    let settings = load_settings(config)?;
    let mode = mode.unwrap_or(*settings.level_mode());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<GameEvent>();
    let logger = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "Game event");
        }
    });

    let mut flow = GameFlow::seeded(settings, seed, Some(event_tx))?;
    flow.open_menu()?;
    flow.start(mode)?;
    info!(seed, %objective, %mode, "Autoplay session started");

    let stop = StopSignal::never();
    let outcome = flow.run_autoplay(objective, &stop).await?;
    let snapshot = flow.snapshot();
    drop(flow);
    logger.await?;

    if json {
        println!("{}", snapshot.to_json()?);
    } else {
        println!("Outcome: {}", outcome);
        println!("Moves:   {}", snapshot.moves());
        println!(
            "Cleared: {}/{}",
            snapshot.consumed(),
            snapshot.dealt()
        );
        println!("Tray:    [{}]", snapshot.tray_symbols());
    }

    if let AutoplayOutcome::Rejected(err) = outcome {
        anyhow::bail!("Autoplay move rejected: {}", err);
    }
    Ok(())
}

/// Prints a freshly dealt board.
#[instrument]
fn run_show(seed: u64, config: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(config)?;
    let flow = GameFlow::seeded(settings, seed, None)?;
    println!("{}", flow.board().render());
    println!("{} items dealt", flow.dealt());
    Ok(())
}
