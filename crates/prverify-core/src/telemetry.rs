//! Tracing initialisation for the prverify binary.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored
//! (the global subscriber can only be set once per process).

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// * `json` — emit newline-delimited JSON log lines.
/// * `level` — default verbosity when `RUST_LOG` is not set.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let json_layer = json.then(|| fmt::layer().with_target(false).json());
    let plain_layer = (!json).then(|| fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(plain_layer)
        .try_init()
        .ok();
}

/// Default level: `debug` when asked for, or when the Actions runner has
/// debug logging enabled (`RUNNER_DEBUG=1`), `info` otherwise.
pub fn default_level(verbose: bool, runner_debug: Option<&str>) -> Level {
    if verbose || runner_debug == Some("1") {
        Level::DEBUG
    } else {
        Level::INFO
    }
}
