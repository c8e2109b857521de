use crate::console::ConsoleSink;
use crate::file::FileSink;
use crate::level::Level;
use crate::noop_sink::NoopSink;
use crate::sink::Sink;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Bundled sink kinds selectable via configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinkKind {
    Console,
    File,
    Noop,
}

/// High-level sink configuration used by the registry to build one sink
/// per dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub kind: SinkKind,
    /// Target path, required for `File`.
    pub path: Option<PathBuf>,
    /// Initial level threshold; `None` leaves the sink unconfigured
    /// until a level controller first sets one.
    pub initial_level: Option<Level>,
}

impl SinkConfig {
    pub fn console() -> Self {
        SinkConfig {
            kind: SinkKind::Console,
            path: None,
            initial_level: None,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        SinkConfig {
            kind: SinkKind::File,
            path: Some(path.into()),
            initial_level: None,
        }
    }

    pub fn noop() -> Self {
        SinkConfig {
            kind: SinkKind::Noop,
            path: None,
            initial_level: None,
        }
    }
}

/// Error type returned when building a sink from configuration.
///
/// A sink that cannot be built is a fatal initialization failure for the
/// dispatcher that needed it; there is no retry and no degraded mode.
#[derive(thiserror::Error, Debug)]
pub enum SinkBuildError {
    #[error("file sink requires a path")]
    MissingPath,

    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Create a concrete [`Sink`] implementation from a [`SinkConfig`].
///
/// This is the main entry point for applications that select a bundled
/// sink through configuration instead of constructing one manually.
pub fn build_sink(config: &SinkConfig) -> Result<Arc<dyn Sink>, SinkBuildError> {
    let sink: Arc<dyn Sink> = match config.kind {
        SinkKind::Console => Arc::new(ConsoleSink::new()),
        SinkKind::Noop => Arc::new(NoopSink::new()),
        SinkKind::File => {
            let path = config.path.as_ref().ok_or(SinkBuildError::MissingPath)?;
            let file = FileSink::create(path).map_err(|source| SinkBuildError::OpenFile {
                path: path.clone(),
                source,
            })?;
            Arc::new(file)
        }
    };

    if let Some(level) = config.initial_level {
        sink.set_level(level);
    }

    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_without_a_path_is_rejected() {
        let config = SinkConfig {
            kind: SinkKind::File,
            path: None,
            initial_level: None,
        };
        assert!(matches!(build_sink(&config), Err(SinkBuildError::MissingPath)));
    }

    #[test]
    fn unreachable_file_path_fails_construction() {
        let config = SinkConfig::file("/nonexistent-dir/deeper/app.log");
        assert!(matches!(
            build_sink(&config),
            Err(SinkBuildError::OpenFile { .. })
        ));
    }

    #[test]
    fn initial_level_is_applied() {
        let mut config = SinkConfig::noop();
        config.initial_level = Some(Level::Error);
        let sink = build_sink(&config).unwrap();
        assert_eq!(sink.level(), Some(Level::Error));
    }
}
