use std::env;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, Once};

use tracing::field::{Field, Visit};
use tracing::{debug, info, Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter, Layer,
};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    let noisy_modules = ["hyper", "reqwest", "rustls"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// One captured ERROR event: its fields rendered as `name=value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    pub fields: Vec<(String, String)>,
}

impl Diagnostic {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Visit for Diagnostic {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.fields
            .push((field.name().to_string(), format!("{value:?}")));
    }
}

/// Layer collecting ERROR events for assertions.
#[derive(Clone, Default)]
struct DiagnosticCollector {
    seen: Arc<Mutex<Vec<Diagnostic>>>,
}

impl<S: Subscriber> Layer<S> for DiagnosticCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }
        let mut diagnostic = Diagnostic::default();
        event.record(&mut diagnostic);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(diagnostic);
        }
    }
}

/// Run `f` with a thread-local subscriber and return the ERROR events it emitted.
pub fn capture_diagnostics<T>(f: impl FnOnce() -> T) -> (T, Vec<Diagnostic>) {
    let collector = DiagnosticCollector::default();
    let seen = Arc::clone(&collector.seen);
    let subscriber = tracing_subscriber::registry().with(collector);
    let result = tracing::subscriber::with_default(subscriber, f);
    let diagnostics = seen.lock().map(|s| s.clone()).unwrap_or_default();
    (result, diagnostics)
}
