use crate::level::Level;
use crate::record::BoxError;
use crate::sink::Sink;
use async_trait::async_trait;
use std::error::Error;
use std::sync::{Mutex, PoisonError, RwLock};

/// Which write method received a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMethod {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
}

/// One recorded sink call.
#[derive(Debug, Clone)]
pub struct SinkCall {
    pub method: SinkMethod,
    pub text: String,
    /// Rendered exception, if the record carried one.
    pub exception: Option<String>,
}

/// In-memory sink recording every call, for test assertions.
///
/// Enabled queries honor the configured level threshold the same way the
/// console and file sinks do, so gate behavior can be exercised against
/// it too.
#[derive(Default)]
pub struct MemorySink {
    calls: Mutex<Vec<SinkCall>>,
    level: RwLock<Option<Level>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// Snapshot of all calls recorded so far, in arrival order.
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Recorded texts only, in arrival order.
    pub fn texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.text).collect()
    }

    fn record(
        &self,
        method: SinkMethod,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SinkCall {
                method,
                text: text.to_owned(),
                exception: exception.map(|e| e.to_string()),
            });
        Ok(())
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
}

#[async_trait]
impl Sink for MemorySink {
    async fn fatal(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.record(SinkMethod::Fatal, text, exception)
    }

    async fn error(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.record(SinkMethod::Error, text, exception)
    }

    async fn warn(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.record(SinkMethod::Warn, text, exception)
    }

    async fn info(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.record(SinkMethod::Info, text, exception)
    }

    async fn debug(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.record(SinkMethod::Debug, text, exception)
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
