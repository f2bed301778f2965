use crate::config::ServiceConfig;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over the `info` default.
///
/// Safe to call more than once; later calls return an error and leave the
/// first subscriber in place.
pub fn init_tracing(config: &ServiceConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = config.log_json.then(|| fmt::layer().json().with_current_span(false));
    let text_layer = (!config.log_json).then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
}
