//! Tracing subscriber setup shared by both binaries

use crate::config::LoggingConfig;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Default filter directive for a configured level
pub fn default_directive(config: &LoggingConfig) -> String {
    format!("edsurv={},tower_http=info", config.level)
}

/// Install the global subscriber writing to stdout. `RUST_LOG` wins over the
/// configured level.
pub fn init(config: &LoggingConfig) {
    install(config, std::io::stdout);
}

/// Same as [`init`] but writing to stderr, for commands whose stdout is data
pub fn init_stderr(config: &LoggingConfig) {
    install(config, std::io::stderr);
}

fn install<W>(config: &LoggingConfig, writer: W)
where
    W: for<'w> MakeWriter<'w> + Clone + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let json = config.is_json();

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(writer.clone())))
        .with((!json).then(|| fmt::layer().with_writer(writer)))
        .init();
}
