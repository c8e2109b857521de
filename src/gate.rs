use crate::record::RecordLevel;
use crate::sink::Sink;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// The queried level maps onto no per-level sink flag; a caller
    /// error, not retried.
    #[error("unrecognised log level code {0}")]
    UnrecognisedLevel(u8),
}

/// Maps leveled enabled-checks onto the sink's per-level flags.
///
/// A pure passthrough with no caching: enabling state can change at
/// runtime through the [`LevelController`](crate::control::LevelController),
/// and every check must see the live answer. `Trace` shares `Debug`'s
/// flag.
#[derive(Clone)]
pub struct LevelGate {
    sink: Arc<dyn Sink>,
}

impl LevelGate {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        LevelGate { sink }
    }

    pub fn is_enabled(&self, level: RecordLevel) -> Result<bool, GateError> {
        match level {
            RecordLevel::Fatal => Ok(self.sink.is_fatal_enabled()),
            RecordLevel::Debug | RecordLevel::Trace => Ok(self.sink.is_debug_enabled()),
            RecordLevel::Error => Ok(self.sink.is_error_enabled()),
            RecordLevel::Info => Ok(self.sink.is_info_enabled()),
            RecordLevel::Warn => Ok(self.sink.is_warn_enabled()),
            RecordLevel::Other(code) => Err(GateError::UnrecognisedLevel(code)),
        }
    }
}
