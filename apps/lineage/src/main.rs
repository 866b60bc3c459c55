//! # Lineage - Genealogy Record Server
//!
//! The main binary for the Lineage person registry.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for record and relationship operations
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/lineage (THE BINARY)          │
//! │                                               │
//! │   ┌─────────────┐         ┌─────────────┐     │
//! │   │   CLI       │         │   HTTP API  │     │
//! │   │  (clap)     │         │   (axum)    │     │
//! │   └──────┬──────┘         └──────┬──────┘     │
//! │          └───────────┬───────────┘            │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │ lineage-core  │                │
//! │              │ (THE LOGIC)   │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! lineage server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! lineage add -n "Ada" -g Female
//! lineage family 1
//! lineage generations 3
//! ```

use clap::Parser;
use lineage::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // LINEAGE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LINEAGE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "lineage=debug,lineage_core=debug,tower_http=debug"
    } else {
        "lineage=info,lineage_core=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

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

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  Lineage v{}
  Person registry and family relationships
"#,
        env!("CARGO_PKG_VERSION")
    );
}
