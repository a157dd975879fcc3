//! TallyBoard - CLI entry point

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use tallyboard::board::{Action, Board};
use tallyboard::cli::{Cli, Command};
use tallyboard::config::Config;
use tallyboard::console::{ConsoleSink, RecordingSink};
use tallyboard::scheduler::{ManualScheduler, TokioScheduler};
use tallyboard::simulate;
use tallyboard::tracker::OutputSink;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // stdout belongs to the board, so logs go to a file
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tallyboard")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("tallyboard.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(trackers = config.trackers.len(), "TallyBoard loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run => cmd_run(&config).await,
        Command::Check => cmd_check(&config),
        Command::Simulate { duration_ms, step_ms } => cmd_simulate(&config, duration_ms, step_ms),
    }
}

fn quiet_sink(_label: &str) -> Arc<dyn OutputSink> {
    Arc::new(RecordingSink::new())
}

/// Run the board against stdin until EOF or `quit`
async fn cmd_run(config: &Config) -> Result<()> {
    debug!("cmd_run: called");
    let scheduler = TokioScheduler::current().ok_or_else(|| eyre!("No tokio runtime available"))?;
    let board = Board::build(config, Arc::new(scheduler), |label| {
        Arc::new(ConsoleSink::new(label)) as Arc<dyn OutputSink>
    });

    for (i, err) in board.warnings() {
        eprintln!("{} tracker #{}: {}", "⚠".yellow(), i, err);
    }
    if board.trackers().all(|t| t.warning().is_some()) {
        eprintln!("{} No usable trackers configured", "⚠".yellow());
    }
    println!(
        "{}",
        "Type a tracker name to count, `list`, `totals`, `reset <id>`, `undo <id>`, `delete <id>` or `quit`".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Action>() {
            Ok(Action::Quit) => break,
            Ok(action) => {
                for reply in board.dispatch(&action) {
                    println!("{}", reply);
                }
            }
            Err(e) => eprintln!("{} {}", "✗".red(), e),
        }
    }

    board.shutdown();
    info!("cmd_run: finished");
    Ok(())
}

/// Report which trackers would start
fn cmd_check(config: &Config) -> Result<()> {
    debug!("cmd_check: called");
    let board = Board::build(config, Arc::new(ManualScheduler::new()), quiet_sink);

    let mut ready = 0;
    for (i, tracker) in board.trackers().enumerate() {
        match tracker.warning() {
            None => {
                ready += 1;
                let c = tracker.config();
                println!(
                    "{} #{} {} (delta {}, active {}ms, idle {}ms)",
                    "✓".green(),
                    i,
                    c.identifier.cyan(),
                    c.delta,
                    c.active_duration_ms,
                    c.idle_frequency_ms
                );
            }
            Some(err) => println!("{} #{} {}", "✗".red(), i, err),
        }
    }
    board.shutdown();

    if ready == 0 {
        return Err(eyre!("No valid trackers configured"));
    }
    println!("{} of {} trackers ready", ready, config.trackers.len());
    Ok(())
}

/// Drive the phase cycles on a virtual clock, printing each change as it happens
fn cmd_simulate(config: &Config, duration_ms: u64, step_ms: u64) -> Result<()> {
    debug!(duration_ms, step_ms, "cmd_simulate: called");
    if step_ms == 0 {
        return Err(eyre!("--step-ms must be greater than zero"));
    }

    let scheduler = Arc::new(ManualScheduler::new());
    let board = Board::build(config, scheduler.clone(), quiet_sink);

    for (id, phase) in board.phases() {
        println!("{:>8}ms  {}: {}", 0, label(&id), phase);
    }

    let duration = Duration::from_millis(duration_ms);
    let changes = simulate::play(&board, &scheduler, duration, Duration::from_millis(step_ms), |t| {
        let at = t.at.as_millis();
        println!("{:>8}ms  {}: {} → {}", at, label(&t.identifier).cyan(), t.from, t.to);
    });
    debug!(changes, "cmd_simulate: finished");

    let activations: u64 = board.trackers().map(|t| t.activations()).sum();
    board.shutdown();
    println!("{} activations in {}ms", activations, duration_ms);
    Ok(())
}

fn label(id: &str) -> &str {
    if id.is_empty() { "(unnamed)" } else { id }
}
