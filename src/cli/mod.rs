//! CLI module for rubric - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
