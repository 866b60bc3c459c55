//! # Lineage CLI Module
//!
//! This module implements the CLI interface for Lineage.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show registry status
//! - `add` - Insert a person
//! - `remove` - Delete a person (children keep their parent reference)
//! - `list` - List every person
//! - `family` - Show a person's immediate family
//! - `generations` - Count paternal-line generations
//! - `gender-count` - Count one gender in the immediate family
//! - `export` - Export all records to a snapshot file
//! - `import` - Replace all records from a snapshot file
//! - `init` - Initialize a new database

mod commands;

use clap::{Parser, Subcommand};
use lineage_core::LineageError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Lineage - family registry server
///
/// Stores person records with optional father and mother links and answers
/// relationship queries over them.
#[derive(Parser, Debug)]
#[command(name = "lineage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the person database
    #[arg(short = 'D', long, global = true, default_value = "lineage.db")]
    pub database: PathBuf,

    /// Storage backend: "file" (snapshot file) or "redb" (ACID database)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Optional TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

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
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show registry status
    Status,

    /// Insert a person
    Add {
        /// Full name
        #[arg(short, long)]
        name: String,

        /// Gender label ("Male", "Female", or any other non-blank label)
        #[arg(short, long)]
        gender: Option<String>,

        /// Father's id
        #[arg(short, long)]
        father: Option<i64>,

        /// Mother's id
        #[arg(short, long)]
        mother: Option<i64>,
    },

    /// Delete a person by id
    Remove {
        /// Person id
        id: i64,
    },

    /// List every person
    List,

    /// Show a person's immediate family (self, parents, children)
    Family {
        /// Person id
        id: i64,
    },

    /// Count generations along the paternal line
    Generations {
        /// Person id
        id: i64,
    },

    /// Count one gender within a person's immediate family
    GenderCount {
        /// Person id
        id: i64,

        /// Gender label ("Male", "Female", or any other non-blank label)
        #[arg(short, long)]
        gender: String,
    },

    /// Export all records to a snapshot file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (snapshot, json)
        #[arg(short = 't', long, default_value = "snapshot")]
        format: String,
    },

    /// Replace all records with the contents of a snapshot file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), LineageError> {
    let backend = cli.backend.as_str();
    let db = cli.database.as_path();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(db, backend, cli.config.as_deref(), host, port).await
        }
        Some(Commands::Status) => cmd_status(db, backend, json_mode),
        Some(Commands::Add {
            name,
            gender,
            father,
            mother,
        }) => cmd_add(db, backend, json_mode, name, gender.as_deref(), father, mother),
        Some(Commands::Remove { id }) => cmd_remove(db, backend, json_mode, id),
        Some(Commands::List) => cmd_list(db, backend, json_mode),
        Some(Commands::Family { id }) => cmd_family(db, backend, json_mode, id),
        Some(Commands::Generations { id }) => cmd_generations(db, backend, json_mode, id),
        Some(Commands::GenderCount { id, gender }) => {
            cmd_gender_count(db, backend, json_mode, id, &gender)
        }
        Some(Commands::Export { output, format }) => {
            cmd_export(db, backend, json_mode, &output, &format)
        }
        Some(Commands::Import { input }) => cmd_import(db, backend, json_mode, &input),
        Some(Commands::Init { force }) => cmd_init(db, backend, force),
        None => {
            // No subcommand - show status by default
            cmd_status(db, backend, json_mode)
        }
    }
}
