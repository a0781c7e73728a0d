//! Wrike command-line client
//!
//! Parses the command line, loads configuration and runs subcommands
//! against an `OAuth2Gateway`.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Command};
pub use commands::{Outcome, execute, run};
