//! # TPO CLI Module
//!
//! This module implements the CLI interface for TPO.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show collection counts
//! - `init` - Initialize a new database
//! - `seed` - Bulk-load users and placements from a JSON fixture
//! - `approve` - Approve a user account

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tpo_core::TpoError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// TPO - Campus Placement Server
///
/// Registration and approval workflows for students and companies,
/// placement drives with scheduled phases, posts, notices and Q&A.
#[derive(Parser, Debug)]
#[command(name = "tpo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the document database
    #[arg(short = 'D', long, global = true, default_value = "tpo.db")]
    pub database: PathBuf,

    /// Storage backend: "redb" (ACID database) or "memory" (volatile)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show collection counts
    Status,

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Bulk-load users and placements from a JSON fixture
    Seed {
        /// Path to the fixture file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Approve a user account
    Approve {
        /// Id of the user to approve
        #[arg(short, long)]
        user: u64,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), TpoError> {
    let backend = cli.backend.as_str();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&cli.database, backend, &host, port).await
        }
        Some(Commands::Status) => cmd_status(&cli.database, backend, json_mode),
        Some(Commands::Init { force }) => cmd_init(&cli.database, backend, force),
        Some(Commands::Seed { file }) => cmd_seed(&cli.database, backend, json_mode, &file),
        Some(Commands::Approve { user }) => cmd_approve(&cli.database, backend, json_mode, user),
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.database, backend, json_mode)
        }
    }
}
