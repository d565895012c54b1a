//! Command-line interface, parsed with clap.

mod commands;

use clap::{Parser, Subcommand};

/// CineLog - movie and TV rating service
#[derive(Parser)]
#[command(name = "cinelog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Show aggregate rating stats for a cached title
    Stats {
        /// TMDb ID
        tmdb_id: i32,
        /// movie or tv
        #[arg(default_value = "movie")]
        kind: String,
    },

    /// Re-fetch one title from TMDb and overwrite the cached row
    Refresh {
        /// TMDb ID
        tmdb_id: i32,
        /// movie or tv
        #[arg(default_value = "movie")]
        kind: String,
    },
}

pub use commands::*;
