//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the opentale binary.

mod commands;
mod run;

pub use commands::{Cli, Commands, SaveTarget};
pub use run::execute;
