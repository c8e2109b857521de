use crate::level::Level;
use crate::record::BoxError;
use crate::sink::Sink;
use async_trait::async_trait;
use std::error::Error;
use std::sync::{PoisonError, RwLock};

/// A sink that simply drops all records.
///
/// Useful for measuring the overhead of the dispatch pipeline itself
/// without any I/O, and for unit tests that don't care about output.
/// Every severity reports enabled; the level state is still tracked so
/// the level controller works against it.
#[derive(Default)]
pub struct NoopSink {
    level: RwLock<Option<Level>>,
}

impl NoopSink {
    pub fn new() -> Self {
        NoopSink::default()
    }
}

#[async_trait]
impl Sink for NoopSink {
    async fn fatal(
        &self,
        _text: &str,
        _exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn error(
        &self,
        _text: &str,
        _exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn warn(
        &self,
        _text: &str,
        _exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn info(
        &self,
        _text: &str,
        _exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn debug(
        &self,
        _text: &str,
        _exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    fn is_fatal_enabled(&self) -> bool {
        true
    }

    fn is_error_enabled(&self) -> bool {
        true
    }

    fn is_warn_enabled(&self) -> bool {
        true
    }

    fn is_info_enabled(&self) -> bool {
        true
    }

    fn is_debug_enabled(&self) -> bool {
        true
    }

    fn level(&self) -> Option<Level> {
        *self
            .level
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_level(&self, level: Level) {
        *self
            .level
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(level);
    }
}
