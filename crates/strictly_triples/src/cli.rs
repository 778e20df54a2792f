//! Command-line interface for strictly_triples.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use strictly_triples::{LevelMode, Objective};

/// Strictly Triples - tray-and-triples puzzle engine
#[derive(Parser, Debug)]
#[command(name = "strictly_triples")]
#[command(about = "Headless runner for the triples puzzle", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Let the solver play a dealt board to the end
    Autoplay {
        /// Whether the solver steers towards a win or a loss
        #[arg(short, long, value_enum, default_value = "win")]
        objective: ObjectiveArg,

        /// Seed for the board deal
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Path to a settings TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Level mode (unlimited, moves, timer); defaults to the settings file
        #[arg(short, long)]
        mode: Option<LevelMode>,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deal a board and print it
    Show {
        /// Seed for the board deal
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Path to a settings TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Autoplay objective as typed on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveArg {
    /// Clear the board
    Win,
    /// Fill the tray
    Lose,
}

impl From<ObjectiveArg> for Objective {
    fn from(arg: ObjectiveArg) -> Self {
        match arg {
            ObjectiveArg::Win => Objective::ForceWin,
            ObjectiveArg::Lose => Objective::ForceLose,
        }
    }
}
