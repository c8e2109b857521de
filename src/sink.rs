use crate::level::Level;
use crate::record::BoxError;
use async_trait::async_trait;
use std::error::Error;

/// Asynchronous leveled destination for dispatched log text.
///
/// Implementations are responsible for durably recording an
/// already-formatted line (console, file, memory, etc). The drain worker
/// calls the write methods from a background task and never awaits them
/// on the application thread; threshold notices are the only writes that
/// originate outside the worker, and those run on a detached task.
///
/// The dispatch pipeline treats the sink as already configured and
/// reachable. A sink that cannot be constructed fails dispatcher
/// creation outright (see [`crate::config::build_sink`]).
#[async_trait]
pub trait Sink: Send + Sync {
    /// Write one line at the given severity.
    ///
    /// **Parameters**
    /// - `text`: fully-assembled message, prefix included.
    /// - `exception`: error value attached to the originating record.
    ///
    /// **Returns**
    /// - `Ok(())` if the line was accepted by the backend.
    /// - `Err(..)` on backend failure. The worker reports the failure on
    ///   stderr and treats the record as consumed; there is no retry.
    async fn fatal(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError>;

    async fn error(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError>;

    async fn warn(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError>;

    async fn info(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError>;

    async fn debug(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError>;

    // Per-level enabled flags, consulted through the level gate on every
    // check; enabling state can change at runtime via the controller.
    fn is_fatal_enabled(&self) -> bool;
    fn is_error_enabled(&self) -> bool;
    fn is_warn_enabled(&self) -> bool;
    fn is_info_enabled(&self) -> bool;
    fn is_debug_enabled(&self) -> bool;

    /// Process-wide level threshold, `None` until first configured.
    fn level(&self) -> Option<Level>;

    /// Replace the level threshold and mark the sink configured.
    fn set_level(&self, level: Level);
}
