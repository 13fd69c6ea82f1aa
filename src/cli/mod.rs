//! CLI layer: argument parsing and command dispatch

pub mod args;
pub mod catalog;
pub mod commands;
pub mod error;
pub mod output;

pub use args::{Cli, Commands, ConfigCommands};
pub use catalog::{Catalog, CatalogCommand, CatalogEntry};
pub use error::{CliError, CliResult};
