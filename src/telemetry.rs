//! Telemetry initialization.
//!
//! Controlled by `KEYVC_TRACE`:
//! - unset → no-op (tracing disabled, zero overhead)
//! - `"stderr"` → JSON spans/events to stderr
//! - `"pretty"` → human-readable events to stderr
//!
//! Verbosity follows `RUST_LOG` (default `info`).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable selecting the telemetry sink.
pub const TRACE_ENV: &str = "KEYVC_TRACE";

/// Where tracing output goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sink {
    /// Tracing disabled.
    Off,
    /// JSON lines on stderr.
    Json,
    /// Human-readable lines on stderr.
    Pretty,
}

impl Sink {
    /// Sink selected by a `KEYVC_TRACE` value. Unknown values disable
    /// tracing with a warning.
    #[must_use]
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            None | Some("") => Self::Off,
            Some("stderr") => Self::Json,
            Some("pretty") => Self::Pretty,
            Some(other) => {
                eprintln!("warning: unknown {TRACE_ENV} value '{other}' (use stderr or pretty)");
                Self::Off
            }
        }
    }
}

/// Initialize telemetry based on `KEYVC_TRACE`.
pub fn init() {
    let value = std::env::var(TRACE_ENV).ok();
    match Sink::from_env_value(value.as_deref()) {
        Sink::Off => {}
        Sink::Json => init_json(),
        Sink::Pretty => init_pretty(),
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// JSON spans/events to stderr via tracing-subscriber's JSON formatter.
fn init_json() {
    tracing_subscriber::registry()
        .with(filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
        )
        .init();
}

fn init_pretty() {
    tracing_subscriber::registry()
        .with(filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
