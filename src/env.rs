use crate::config::{SinkConfig, SinkKind};
use crate::level::Level;

/// Environment variable names used by this crate for convenient sink
/// configuration from services.
///
/// These are purely helpers; the core types remain decoupled from
/// environment access.

/// Sink kind selector: "console", "file" or "noop".
pub const LOG_SINK_KIND_ENV: &str = "LOG_SINK_KIND";

/// Target path for the file sink.
pub const LOG_SINK_PATH_ENV: &str = "LOG_SINK_PATH";

/// Initial level threshold, e.g. "INFO" or "WARNING".
pub const LOG_SINK_LEVEL_ENV: &str = "LOG_SINK_LEVEL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Build a [`SinkConfig`] from the environment, defaulting to a console
/// sink with no initial level.
pub fn sink_config_from_env() -> SinkConfig {
    let kind = match env_or(LOG_SINK_KIND_ENV, "console").to_ascii_lowercase().as_str() {
        "file" => SinkKind::File,
        "noop" => SinkKind::Noop,
        _ => SinkKind::Console,
    };

    SinkConfig {
        kind,
        path: std::env::var(LOG_SINK_PATH_ENV).ok().map(Into::into),
        initial_level: std::env::var(LOG_SINK_LEVEL_ENV)
            .ok()
            .map(|name| Level::parse(&name)),
    }
}
