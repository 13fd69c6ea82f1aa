use clap::FromArgMatches;
use natstat_cli::cli::commands::{build_command, execute_command};
use natstat_cli::cli::{output, Catalog, Cli, CliError};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

fn main() {
    let catalog = match Catalog::build() {
        Ok(catalog) => catalog,
        Err(e) => exit_with(CliError::from(e)),
    };
    let matches = build_command(&catalog).get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    setup_logging(cli.debug);

    if let Err(e) = execute_command(&cli, &matches, &catalog) {
        exit_with(e);
    }
}

fn exit_with(e: CliError) -> ! {
    if !e.is_reported() {
        output::error(&e);
    }
    std::process::exit(e.exit_code());
}

fn setup_logging(verbosity: u8) {
    tracing::debug!("INIT: Attempting logger init from main.rs");

    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // HTTP stack internals only at trace
    let noisy_modules = ["hyper", "reqwest", "rustls"];
    let module_filter = filter_fn(move |metadata| {
        verbosity >= 3
            || !noisy_modules
                .iter()
                .any(|name| metadata.target().starts_with(name))
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    let filtered_layer = fmt_layer.with_filter(filter).with_filter(module_filter);

    tracing_subscriber::registry().with(filtered_layer).init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use natstat_cli::util::testing;

    #[test]
    fn verify_cli() {
        testing::init_test_setup();
        let catalog = Catalog::build().unwrap();
        build_command(&catalog).debug_assert();
    }
}
