//! CLI argument definitions using clap
//!
//! The endpoint subcommands are generated from their request schemas and
//! attached to [`Cli::command`] at runtime (see [`crate::cli::commands::build_command`]);
//! only the fixed subcommands are declared here.

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Pull sports statistics from the NatStat API as delimited text
#[derive(Parser, Debug)]
#[command(name = "natstat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (repeat for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Field delimiter for output (overrides config)
    #[arg(long, global = true, value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// API root URL (overrides config)
    #[arg(long, global = true, value_name = "URL", value_hint = ValueHint::Url)]
    pub base_url: Option<String>,

    /// API key (overrides config)
    #[arg(long, global = true, env = "NATSTAT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print author and version
    #[arg(long)]
    pub info: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective merged config
    Show,
    /// Show config file locations
    Path,
    /// Create config template
    Init {
        /// Write ./.natstat.toml instead of the global file
        #[arg(long)]
        local: bool,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
