//! LottoFilter - rule-based filtering of the 6-of-45 combination space
//!
//! Main entry point for the command line front end.
//!
//! # Overview
//!
//! This binary wires the library together. It initializes:
//! - Logging infrastructure (daily file rotation, optional console output)
//! - Tokio runtime (scan and export workers run on its blocking pool)
//! - Configuration loading ([`ConfigManager`])
//! - The draw history and the rule registry
//! - A [`FilterSession`] driven by the chosen subcommand
//!
//! # Commands
//!
//! - `rules`: list every rule with its parameters and defaults
//! - `scan [--page N] [--delete POS]...`: scan, show a page, optionally soft-delete entries on it
//! - `export [--output PATH]`: stream the filtered sequence to a file
//! - `stats`: per-number statistics of the recorded draws
//! - `record DRAW N1..N6`: append a draw to the history file
//!
//! Ctrl-C cancels a running scan or export.
//!
//! # Configuration Files
//!
//! Expected in the config directory (default `LottoFilter Data/`):
//! - `settings.yaml`: paths and preferences, overridable via `LOTTOFILTER__SETTINGS__*`
//! - `filters.yaml`: ordered list of conditions
//! - `winning-history.csv`: past first-prize draws (optional)

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use lottofilter::models::{PageView, RunOutcome};
use lottofilter::{
    APP_NAME, ConfigManager, DrawHistory, FilterSession, Metrics, RuleRegistry, StateChange,
    StateManager, UserConfig, VERSION, WinningHistory,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lottofilter")]
#[command(author, version, about = "Filter, page and export 6-of-45 combinations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding settings.yaml, filters.yaml and the draw history
    #[arg(long, global = true, default_value = "LottoFilter Data", env = "LOTTOFILTER_CONFIG_DIR")]
    config_dir: Utf8PathBuf,

    /// Also log to the console
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available rules and their parameters
    Rules,

    /// Scan the full combination space and show one page of results
    Scan {
        /// 1-based page to show (default: settings.start_page)
        #[arg(long)]
        page: Option<String>,

        /// 1-based position on the shown page to soft-delete (repeatable)
        #[arg(long = "delete")]
        delete: Vec<usize>,
    },

    /// Write every surviving combination to a file
    Export {
        /// Output file (default: settings.export_path)
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Show how often each number has been drawn
    Stats,

    /// Append a first-prize draw to the history file
    Record {
        /// Draw number
        draw: u32,

        /// The six winning numbers, any order
        #[arg(num_args = 6, required = true)]
        numbers: Vec<u8>,
    },
}

/// Main entry point for the LottoFilter CLI
///
/// # Errors
///
/// This function can fail if:
/// - The config directory cannot be created or a config file is invalid YAML
/// - Logging initialization fails (disk space, permissions)
/// - Tokio runtime creation fails
/// - The chosen command fails (unwritable export path, invalid draw)
fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let user_config = config_manager.load_user_config()?;
    let settings = &user_config.settings;

    let log_dir = config_manager.resolve_path(&settings.log_dir);
    let _guard = lottofilter::logging::setup_logging(
        &log_dir,
        APP_NAME,
        settings.debug_mode,
        cli.verbose,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    config_manager.summarize(&user_config).log();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("lottofilter-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let metrics = Arc::new(Metrics::new());
    let result = runtime.block_on(run(cli.command, &config_manager, &user_config, &metrics));

    metrics.log_summary();
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    tracing::info!("Application shutdown complete");

    result
}

async fn run(
    command: Commands,
    config_manager: &ConfigManager,
    user_config: &UserConfig,
    metrics: &Arc<Metrics>,
) -> Result<()> {
    let settings = &user_config.settings;
    let history_path = config_manager.resolve_path(&settings.history_file);

    match command {
        Commands::Rules => {
            print_rules(&build_registry(load_history(&history_path)));
            Ok(())
        }
        Commands::Stats => {
            print_stats(&load_history(&history_path));
            Ok(())
        }
        Commands::Record { draw, numbers } => record_draw(&history_path, draw, &numbers),
        Commands::Scan { page, delete } => {
            let mut session = open_session(config_manager, &history_path, metrics)?;
            let page = page.unwrap_or_else(|| settings.start_page.to_string());
            scan(&mut session, &page, &delete).await
        }
        Commands::Export { output } => {
            let mut session = open_session(config_manager, &history_path, metrics)?;
            let output = output
                .unwrap_or_else(|| config_manager.resolve_path(&settings.export_path));
            export(&mut session, output).await
        }
    }
}

/// Load the draw history, degrading to an empty store on failure
fn load_history(path: &Utf8Path) -> Arc<WinningHistory> {
    match WinningHistory::load(path) {
        Ok(history) => Arc::new(history),
        Err(e) => {
            tracing::warn!("Draw history unavailable, past draws will not be excluded: {}", e);
            Arc::new(WinningHistory::empty())
        }
    }
}

fn build_registry(history: Arc<WinningHistory>) -> RuleRegistry {
    let history: Arc<dyn DrawHistory> = history;
    RuleRegistry::new(history)
}

fn open_session(
    config_manager: &ConfigManager,
    history_path: &Utf8Path,
    metrics: &Arc<Metrics>,
) -> Result<FilterSession> {
    let registry = build_registry(load_history(history_path));
    let filter_config = config_manager.load_filter_config()?;

    let state_manager = Arc::new(StateManager::new());
    spawn_progress_printer(&state_manager);

    let mut session = FilterSession::new(
        registry,
        state_manager,
        Arc::clone(metrics),
        tokio::runtime::Handle::current(),
    );
    session.load_conditions(&filter_config);

    for condition in session.conditions() {
        let marker = if condition.enabled { "x" } else { " " };
        eprintln!("[{}] {}", marker, condition.summary());
    }
    Ok(session)
}

/// Print progress updates to stderr as they are published
fn spawn_progress_printer(state_manager: &StateManager) {
    let mut rx = state_manager.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(StateChange::ProgressUpdated { percent }) => eprint!("\r{:>3}%", percent),
                Ok(StateChange::RunFinished { .. }) => eprintln!(),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Progress printer skipped {} events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for the active run, cancelling it on Ctrl-C
async fn wait_or_cancel(session: &mut FilterSession) -> Option<RunOutcome> {
    tokio::select! {
        outcome = session.wait_for_idle() => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, cancelling");
            session.cancel();
            session.wait_for_idle().await
        }
    }
}

async fn scan(session: &mut FilterSession, page: &str, delete: &[usize]) -> Result<()> {
    session.start_scan().await?;

    match wait_or_cancel(session).await {
        Some(RunOutcome::Completed(_)) => {}
        Some(RunOutcome::Cancelled(_)) => {
            println!("Scan cancelled");
            return Ok(());
        }
        _ => {
            let error = session
                .take_last_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("Scan failed: {}", error);
        }
    }

    let mut view = session.go_to_page(page)?;

    if !delete.is_empty() {
        for &position in delete {
            if position == 0 || !session.set_marked(position - 1, true)? {
                eprintln!("No entry at position {} on this page", position);
            }
        }
        let summary = session.delete_marked()?;
        for signature in &summary.removed {
            println!("Deleted {}", signature);
        }
        view = summary.view;
    }

    let summary = session.state_manager().read(|state| {
        format!(
            "{} ({}, {} soft-deleted)",
            state.page_summary(),
            state.total_matches_summary(),
            state.soft_deleted
        )
    });
    print_page(&summary, &view);
    Ok(())
}

async fn export(session: &mut FilterSession, output: Utf8PathBuf) -> Result<()> {
    session
        .start_export(output.clone())
        .await
        .with_context(|| format!("Failed to start export to {}", output))?;

    match wait_or_cancel(session).await {
        Some(RunOutcome::Completed(_)) => {
            let lines = session.state_manager().read(|s| s.last_export_lines);
            println!("Wrote {} combinations to {}", lines, output);
            Ok(())
        }
        Some(RunOutcome::Cancelled(_)) => {
            println!("Export cancelled; partial file left at {}", output);
            Ok(())
        }
        _ => {
            let error = session
                .take_last_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("Export to {} failed: {}", output, error);
        }
    }
}

fn record_draw(path: &Utf8Path, draw: u32, numbers: &[u8]) -> Result<()> {
    let numbers: [u8; 6] = numbers
        .try_into()
        .context("A draw needs exactly six numbers")?;

    let mut history = WinningHistory::load(path)?;
    if history.append(draw, numbers)? {
        history.save()?;
        println!("Recorded draw {} ({} draws total)", draw, history.len());
    } else {
        println!("Combination already recorded; nothing to do");
    }
    Ok(())
}

fn print_page(summary: &str, view: &PageView) {
    println!("{}", summary);
    for (i, entry) in view.entries.iter().enumerate() {
        println!("{:>3}. {}", i + 1, entry.text);
    }
}

fn print_rules(registry: &RuleRegistry) {
    for descriptor in registry.descriptors() {
        println!("{} - {}", descriptor.key, descriptor.display_name);
        println!("    {}", descriptor.description);
        for param in &descriptor.parameters {
            println!(
                "    {} ({}), default \"{}\"",
                param.name, param.label, param.default_value
            );
        }
    }
}

fn print_stats(history: &WinningHistory) {
    let stats = history.number_statistics();
    if stats.is_empty() {
        println!("No draws recorded");
        return;
    }

    if let Some(latest) = history.latest_draw() {
        println!(
            "{} draws, latest #{}: {}",
            history.len(),
            latest.draw_no,
            latest.combination
        );
    }
    for stat in stats {
        println!("{:>2}: {:>4} ({:.2}%)", stat.number, stat.count, stat.rate * 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_dir_from_flag_and_environment() {
        let cli = Cli::try_parse_from(["lottofilter", "rules"]).unwrap();
        assert_eq!(cli.config_dir, "LottoFilter Data");

        // SAFETY: no other test in this binary reads or writes this variable
        unsafe { std::env::set_var("LOTTOFILTER_CONFIG_DIR", "/tmp/lf-env") };
        let from_env = Cli::try_parse_from(["lottofilter", "stats"]);
        let from_flag =
            Cli::try_parse_from(["lottofilter", "stats", "--config-dir", "/tmp/lf-flag"]);
        unsafe { std::env::remove_var("LOTTOFILTER_CONFIG_DIR") };

        assert_eq!(from_env.unwrap().config_dir, "/tmp/lf-env");
        assert_eq!(from_flag.unwrap().config_dir, "/tmp/lf-flag");
    }

    #[test]
    fn test_record_needs_six_numbers() {
        assert!(Cli::try_parse_from(["lottofilter", "record", "1100", "1", "2", "3"]).is_err());
        let cli =
            Cli::try_parse_from(["lottofilter", "record", "1100", "1", "2", "3", "4", "5", "6"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Record { draw: 1100, ref numbers } if numbers.len() == 6));
    }
}
