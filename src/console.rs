use crate::level::Level;
use crate::record::BoxError;
use crate::sink::Sink;
use async_trait::async_trait;
use std::error::Error;
use std::sync::{PoisonError, RwLock};

/// Leveled console sink: debug and info lines go to stdout, warn and
/// above to stderr.
///
/// A severity is enabled while its code is at or below the configured
/// threshold code (FATAL=2 through DEBUG=6); everything is enabled while
/// the sink is unconfigured.
pub struct ConsoleSink {
    level: RwLock<Option<Level>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        ConsoleSink {
            level: RwLock::new(None),
        }
    }

    fn threshold(&self) -> Option<Level> {
        *self
            .level
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn enabled(&self, level: Level) -> bool {
        match self.threshold() {
            None => true,
            Some(threshold) => level.code() <= threshold.code(),
        }
    }

    fn write_line(
        &self,
        level: Level,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        if !self.enabled(level) {
            return Ok(());
        }

        let line = match exception {
            Some(exception) => format!("{} {} [{}]", level.as_str(), text, exception),
            None => format!("{} {}", level.as_str(), text),
        };

        match level {
            Level::Debug | Level::Info => println!("{line}"),
            Level::Warn | Level::Error | Level::Fatal => eprintln!("{line}"),
        }

        Ok(())
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    async fn fatal(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.write_line(Level::Fatal, text, exception)
    }

    async fn error(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.write_line(Level::Error, text, exception)
    }

    async fn warn(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.write_line(Level::Warn, text, exception)
    }

    async fn info(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.write_line(Level::Info, text, exception)
    }

    async fn debug(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.write_line(Level::Debug, text, exception)
    }

    fn is_fatal_enabled(&self) -> bool {
        self.enabled(Level::Fatal)
    }

    fn is_error_enabled(&self) -> bool {
        self.enabled(Level::Error)
    }

    fn is_warn_enabled(&self) -> bool {
        self.enabled(Level::Warn)
    }

    fn is_info_enabled(&self) -> bool {
        self.enabled(Level::Info)
    }

    fn is_debug_enabled(&self) -> bool {
        self.enabled(Level::Debug)
    }

    fn level(&self) -> Option<Level> {
        self.threshold()
    }

    fn set_level(&self, level: Level) {
        *self
            .level
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_sink_enables_everything() {
        let sink = ConsoleSink::new();
        assert!(sink.is_debug_enabled());
        assert!(sink.is_fatal_enabled());
        assert_eq!(sink.level(), None);
    }

    #[test]
    fn threshold_disables_finer_levels() {
        let sink = ConsoleSink::new();
        sink.set_level(Level::Warn);
        assert!(sink.is_fatal_enabled());
        assert!(sink.is_error_enabled());
        assert!(sink.is_warn_enabled());
        assert!(!sink.is_info_enabled());
        assert!(!sink.is_debug_enabled());
    }
}
