//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TallyBoard - timer-driven trackers feeding a shared tally
#[derive(Parser, Debug)]
#[command(name = "tb", author, version, about = "Timer-driven trackers feeding a shared tally", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the board, reading actions from stdin
    ///
    /// Input lines: `<id>` presses a tracker, `<id> <amount>` adds an amount,
    /// `undo <id>`, `reset <id>`, `delete <id>`, `totals`, `list`, `quit`.
    Run,

    /// Validate the configured trackers
    Check,

    /// Run the phase cycles on a virtual clock and print every change
    ///
    /// The clock stops at each timer deadline, so every change is printed at
    /// the virtual time it happens.
    Simulate {
        /// Virtual time to simulate, in milliseconds
        #[arg(short, long, default_value = "60000")]
        duration_ms: u64,

        /// Longest single clock jump, in milliseconds
        #[arg(short, long, default_value = "1000")]
        step_ms: u64,
    },
}
