//! Command execution: settings, endpoint commands, config and completions

use std::io::{self, Write};
use std::path::Path;

use clap::{ArgMatches, Command, CommandFactory};
use clap_complete::generate;
use tracing::{debug, error, instrument};

use crate::application::{dispatch, ApplicationError, Outcome, Renderer};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::catalog::{Catalog, CatalogCommand, ALL_PAGES, ONE_PAGE};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, parse_delimiter, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::ApiClient;
use crate::infrastructure::InfraError;

/// The full command line: global flags, fixed subcommands, one subcommand per endpoint.
pub fn build_command(catalog: &Catalog) -> Command {
    catalog
        .iter()
        .fold(Cli::command(), |cmd, c| cmd.subcommand(c.bound.command().clone()))
}

pub fn execute_command(cli: &Cli, matches: &ArgMatches, catalog: &Catalog) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Config { command }) => return execute_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = build_command(catalog);
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            return Ok(());
        }
        None => {}
    }

    let Some((name, sub_matches)) = matches.subcommand() else {
        if cli.info {
            print_info();
            return Ok(());
        }
        return Err(CliError::Usage(
            "no command given, see `natstat --help`".to_string(),
        ));
    };
    let command = catalog
        .get(name)
        .ok_or_else(|| CliError::Usage(format!("unknown command '{name}'")))?;

    let settings = load_settings(cli)?;
    let container = ServiceContainer::new(settings)?;
    let stdout = io::stdout();
    let mut sink = stdout.lock();
    run_endpoint(
        container.api.as_ref(),
        &container.renderer,
        command,
        sub_matches,
        &mut sink,
    )
    .map(|_| ())
}

/// Reconstruct the request, fetch, and render to `sink`.
///
/// Every failure is logged here once, with the command's label and the
/// reason, and comes back as [`CliError::Reported`].
#[instrument(skip_all, fields(command = command.entry.name))]
pub fn run_endpoint<W: Write>(
    api: &dyn ApiClient,
    renderer: &Renderer,
    command: &CatalogCommand,
    matches: &ArgMatches,
    sink: &mut W,
) -> CliResult<Outcome> {
    let label = command.entry.label;
    let invocation = match command.bound.factory().reconstruct(matches) {
        Ok(invocation) => invocation,
        Err(err) => {
            error!(command = label, reason = %err, "could not pull {}", label);
            let code = CliError::from(err).exit_code();
            return Err(CliError::Reported {
                command: command.entry.name.to_string(),
                code,
            });
        }
    };
    let exhaustive = invocation.extras.toggle(ALL_PAGES, ONE_PAGE).unwrap_or(true);
    debug!(exhaustive, request = ?invocation.request, "dispatching");

    let endpoint = api.endpoint(command.entry.name);
    let result = dispatch(endpoint.as_ref(), &invocation.request, exhaustive);
    match renderer.render(label, &result, sink) {
        outcome @ Outcome::Written { .. } => Ok(outcome),
        outcome => Err(CliError::reported(command.entry.name, outcome)),
    }
}

/// Layered settings with the global flags applied last.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
    let mut settings = Settings::load(Some(&cwd))?;
    apply_overrides(&mut settings, cli)?;
    Ok(settings)
}

/// Apply `--api-key`, `--base-url` and `--delimiter`.
pub fn apply_overrides(settings: &mut Settings, cli: &Cli) -> CliResult<()> {
    if let Some(key) = &cli.api_key {
        settings.api_key = Some(key.clone());
    }
    if let Some(url) = &cli.base_url {
        settings.base_url = url.clone();
    }
    if let Some(delimiter) = &cli.delimiter {
        settings.output.delimiter = parse_delimiter(delimiter)?;
    }
    settings.validate()?;
    Ok(())
}

fn print_info() {
    let cmd = Cli::command();
    if let Some(a) = cmd.get_author() {
        output::info(&format!("AUTHOR: {a}"));
    }
    if let Some(v) = cmd.get_version() {
        output::info(&format!("VERSION: {v}"));
    }
}

#[instrument(skip(cli))]
fn execute_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_display_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let cwd = std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
            match global_config_path() {
                Some(path) => print_location("global", &path),
                None => output::detail(&"global: (no config directory)"),
            }
            print_location("local", &local_config_path(&cwd));
            Ok(())
        }
        ConfigCommands::Init { local, force } => {
            let path = if *local {
                let cwd =
                    std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
                local_config_path(&cwd)
            } else {
                global_config_path().ok_or_else(|| ApplicationError::Config {
                    message: "cannot determine config directory".to_string(),
                })?
            };
            write_template(&path, *force)?;
            output::action("Created", &path.display());
            Ok(())
        }
    }
}

fn print_location(scope: &str, path: &Path) {
    let state = if path.exists() { "" } else { " (not found)" };
    output::detail(&format!("{scope}: {}{state}", path.display()));
}

/// Write the commented template to `path`, creating parent directories.
pub fn write_template(path: &Path, force: bool) -> CliResult<()> {
    if path.exists() && !force {
        return Err(CliError::Usage(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
    }
    std::fs::write(path, Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}
