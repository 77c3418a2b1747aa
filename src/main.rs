//! card-gate
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ routes ──▶ request handler
//!                                                     │
//!                                  content-type gate, JSON decode
//!                                                     │
//!                                                     ▼
//!                                         resilience::deadline
//!                                                     │
//!                                                     ▼
//!                                     domain (cardholders, system)
//!                                       │                    │
//!                                       ▼                    ▼
//!                                 security::auth        audit trail
//!     Client Response
//!     ◀────────────── negotiate (gzip) ◀── envelope ◀── Outcome
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use card_gate::lifecycle::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "card-gate")]
#[command(about = "Card access gate HTTP service", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let options = StartupOptions {
        config_path: cli.config,
        watch: cli.watch,
    };

    match lifecycle::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("card-gate: {e}");
            ExitCode::FAILURE
        }
    }
}
