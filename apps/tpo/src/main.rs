//! # TPO - Campus Placement Server
//!
//! The main binary for the TPO placement backend.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for administrative operations
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                apps/tpo (THE BINARY)               │
//! │                                                    │
//! │   ┌─────────────┐         ┌─────────────┐          │
//! │   │   CLI       │         │   HTTP API  │          │
//! │   │  (clap)     │         │   (axum)    │          │
//! │   └──────┬──────┘         └──────┬──────┘          │
//! │          │                       │                 │
//! │          └───────────┬───────────┘                 │
//! │                      ▼                             │
//! │              ┌───────────────┐                     │
//! │              │   tpo-core    │                     │
//! │              │  (THE LOGIC)  │                     │
//! │              └───────────────┘                     │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! tpo server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! tpo status
//! tpo seed -f fixtures.json
//! tpo approve --user 3
//! ```

use clap::Parser;
use tpo::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — TPO_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("TPO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tpo=info,tower_http=debug".into());

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

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the TPO startup banner.
fn print_banner() {
    println!(
        r#"
  ████████╗██████╗  ██████╗
  ╚══██╔══╝██╔══██╗██╔═══██╗
     ██║   ██████╔╝██║   ██║
     ██║   ██╔═══╝ ██║   ██║
     ██║   ██║     ╚██████╔╝
     ╚═╝   ╚═╝      ╚═════╝

  Campus Placement Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
