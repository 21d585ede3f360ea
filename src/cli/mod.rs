//! CLI module for surveyr - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for publishing
//! configuration, generating embed snippets, and running the widget.

pub mod commands;

pub use commands::Cli;
