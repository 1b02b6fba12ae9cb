//! # Precog - Action Sequence Collector
//!
//! The collector binary: an HTTP ingest server fed by the in-game client
//! mod, plus offline replay and verification of JSONL datasets.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                apps/precog (THE BINARY)              │
//! │                                                      │
//! │   ┌─────────────┐            ┌──────────────────┐    │
//! │   │    CLI      │            │  HTTP ingest API │    │
//! │   │   (clap)    │            │      (axum)      │    │
//! │   └──────┬──────┘            └────────┬─────────┘    │
//! │          └─────────────┬──────────────┘              │
//! │                        ▼                             │
//! │                ┌───────────────┐                     │
//! │                │  precog-core  │                     │
//! │                │  (THE LOGIC)  │                     │
//! │                └───────────────┘                     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the ingest server
//! precog serve --host 127.0.0.1 --port 8080
//!
//! # Offline
//! precog replay -f session_frames.jsonl
//! precog verify -f precognition_data/action_sequences.jsonl --keep-going
//! ```

use clap::Parser;
use precog::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // PRECOG_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("PRECOG_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "precog=info,precog_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ██████╗ ██████╗ ███████╗ ██████╗ ██████╗  ██████╗
  ██╔══██╗██╔══██╗██╔════╝██╔════╝██╔═══██╗██╔════╝
  ██████╔╝██████╔╝█████╗  ██║     ██║   ██║██║  ███╗
  ██╔═══╝ ██╔══██╗██╔══╝  ██║     ██║   ██║██║   ██║
  ██║     ██║  ██║███████╗╚██████╗╚██████╔╝╚██████╔╝
  ╚═╝     ╚═╝  ╚═╝╚══════╝ ╚═════╝ ╚═════╝  ╚═════╝

  Action Sequence Collector v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
