//! Command-line interface for artifacts-online.

mod commands;

use clap::{Parser, Subcommand};

/// Artifacts Online - catalog of magical artifacts and their wizard owners
#[derive(Parser)]
#[command(name = "artifacts-online")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Write a default config.toml in the working directory
    Init,

    /// Load the demo wizards, artifacts and users into an empty database
    Seed,
}

pub use commands::*;
