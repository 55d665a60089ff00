// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Emarge — document OCR and attendance-sheet extraction
//
// Entry point. Initialises logging, loads settings, and dispatches the
// subcommand. Logs go to stderr so stdout stays machine-readable.

mod commands;
mod config_dir;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "emarge", version, about = "Extract text and attendance data from scanned documents")]
struct Cli {
    /// Settings file (defaults to the per-user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("Emarge starting");

    let settings = match config_dir::load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "settings could not be loaded");
            return ExitCode::from(commands::EXIT_FAILURE);
        }
    };

    let mut stdout = std::io::stdout().lock();
    let code = match commands::run(cli.command, &settings, cli.json, &mut stdout).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, code = e.code(), "command failed");
            commands::EXIT_FAILURE
        }
    };
    let _ = stdout.flush();
    ExitCode::from(code)
}
