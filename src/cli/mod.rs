//! CLI module - argument parsing, command dispatch and output

pub mod args;
pub mod commands;
pub mod helpers;
pub mod output;
pub mod shell;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
