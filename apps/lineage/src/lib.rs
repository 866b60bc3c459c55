//! # Lineage
//!
//! HTTP server and CLI over `lineage-core`.
//!
//! - [`api`]: axum router, handlers and middleware
//! - [`cli`]: clap command definitions and implementations
//! - [`config`]: layered server settings (defaults, TOML file, environment)

pub mod api;
pub mod cli;
pub mod config;
