use crate::level::Level;
use crate::record::BoxError;
use crate::sink::Sink;
use async_trait::async_trait;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::sync::Mutex;

/// Append-only file sink.
///
/// The file is opened (and created if missing) at construction; failure
/// to open is a construction error, never a degraded sink. Writes are
/// serialized through an async mutex and flushed per line so a crash
/// loses at most the line being written.
pub struct FileSink {
    writer: Mutex<BufWriter<File>>,
    level: RwLock<Option<Level>>,
    path: PathBuf,
}

impl FileSink {
    /// Open `path` for appending, creating it if necessary.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(FileSink {
            writer: Mutex::new(BufWriter::new(file)),
            level: RwLock::new(None),
            path,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
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

    async fn write_line(
        &self,
        level: Level,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        if !self.enabled(level) {
            return Ok(());
        }

        let mut writer = self.writer.lock().await;
        match exception {
            Some(exception) => writeln!(writer, "{} {} [{}]", level.as_str(), text, exception)?,
            None => writeln!(writer, "{} {}", level.as_str(), text)?,
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn fatal(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.write_line(Level::Fatal, text, exception).await
    }

    async fn error(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.write_line(Level::Error, text, exception).await
    }

    async fn warn(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.write_line(Level::Warn, text, exception).await
    }

    async fn info(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.write_line(Level::Info, text, exception).await
    }

    async fn debug(
        &self,
        text: &str,
        exception: Option<&(dyn Error + Send + Sync)>,
    ) -> Result<(), BoxError> {
        self.write_line(Level::Debug, text, exception).await
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
