// Copyright 2026 Filings Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use filings_runtime::cli::{self, output, run_cmd::RunOptions};
use filings_runtime::feeds::screener::ScreenerFilter;
use filings_runtime::feeds::FeedId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "filings",
    about = "Filings: harvest exchange disclosure feeds into raw, canonical and summary artifacts",
    version,
    after_help = "Run 'filings <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct RunFlags {
    /// Anchor day (dd-mm-yyyy); defaults to today
    #[arg(long, value_parser = cli::run_cmd::parse_date)]
    date: Option<chrono::NaiveDate>,

    /// Output directory for artifacts
    #[arg(long)]
    out: Option<PathBuf>,

    /// Maximum browser sessions open at once
    #[arg(long)]
    max_sessions: Option<usize>,

    /// RSI condition for the screener, e.g. ">82" or "<30"
    #[arg(long)]
    rsi_filter: Option<ScreenerFilter>,

    /// Do not move weekends and holidays back to the last trading day
    #[arg(long)]
    no_shift: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,
}

impl From<RunFlags> for RunOptions {
    fn from(flags: RunFlags) -> Self {
        RunOptions {
            date: flags.date,
            out: flags.out,
            max_sessions: flags.max_sessions,
            rsi_filter: flags.rsi_filter,
            no_shift: flags.no_shift,
            headful: flags.headful,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more feeds
    Run {
        /// Feed ids (see `filings feeds`)
        #[arg(required = true)]
        feeds: Vec<FeedId>,
        #[command(flatten)]
        flags: RunFlags,
    },
    /// Run every configured feed
    RunAll {
        #[command(flatten)]
        flags: RunFlags,
    },
    /// List the feed catalog
    Feeds,
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    output::set_json(cli.json);

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Commands::Run { feeds, flags } => cli::run_cmd::run(&feeds, &flags.into()).await,
        Commands::RunAll { flags } => cli::run_cmd::run_all(&flags.into()).await,
        Commands::Feeds => cli::feeds_cmd::run(),
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "filings", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
