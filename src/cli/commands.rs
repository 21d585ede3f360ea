//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - publish: validate and persist the popup configuration
//! - show: print the current configuration record
//! - snippet: print the embed snippets for this tenant
//! - run: run the widget in the terminal
//! - reset: clear the local tenant binding

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Surveyr - feedback-survey popup engine
#[derive(Parser, Debug)]
#[command(name = "surveyr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional settings file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate and publish the popup configuration for this tenant
    Publish {
        /// Title for the rating step
        #[arg(long)]
        rating_title: String,

        /// Title for the review step
        #[arg(long)]
        comment_title: String,

        /// Placeholder for the review text area
        #[arg(long, default_value = "")]
        placeholder: String,

        /// Seconds to wait before the first display
        #[arg(long)]
        wait_time: u64,

        /// Maximum displays per session
        #[arg(long)]
        max_display: u32,

        /// Minutes between displays
        #[arg(long)]
        display_frequency: u64,
    },

    /// Print the currently published configuration
    Show,

    /// Print the embed snippets for this tenant
    Snippet,

    /// Run the widget in the terminal
    Run,

    /// Clear the local tenant binding
    Reset,
}
