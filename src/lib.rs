//! natstat: sports statistics on the command line.
//!
//! Request schemas are turned into command-line flags, parsed flags back into
//! requests, requests into (paginated) fetches, and fetch results into
//! delimited text.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
