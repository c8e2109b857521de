use crate::admission::{AdmissionController, DEFAULT_ERROR_THRESHOLD, DEFAULT_WARN_THRESHOLD};
use crate::level::Level;
use crate::queue::DispatchQueue;
use crate::record::{
    current_thread_ident, BoxError, LogRecord, Payload, RecordFormatter, RecordLevel,
};
use crate::sink::Sink;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{sleep, Duration};

/// Tunables for one dispatcher.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Queue depth at which a one-time warn notice is raised.
    pub warn_threshold: usize,
    /// Queue depth beyond which records are dropped.
    pub error_threshold: usize,
    /// Upper bound on the worker's idle wait; also bounds how long
    /// `stop` blocks when no records are arriving.
    pub idle_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            warn_threshold: DEFAULT_WARN_THRESHOLD,
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            idle_timeout: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnqueueError {
    /// Structured payloads have no default text rendering contract at the
    /// enqueue boundary; the caller must capture a formatter. Raised
    /// before any queue state is touched.
    #[error("a structured payload requires a formatter")]
    MissingFormatter,
}

/// Result of the shutdown handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The worker signalled its exit.
    Graceful,
    /// The exit signal was never observed because the wait primitive
    /// itself failed. Non-fatal; the caller proceeds with teardown.
    Unconfirmed,
}

/// One named asynchronous log pipeline: a record queue plus the worker
/// task draining it into a sink.
///
/// Producers call [`enqueue`](Dispatcher::enqueue) (or the leveled
/// shorthands) and never wait on sink I/O; the worker formats and
/// forwards records strictly in push-completion order. Construction
/// spawns the worker immediately; the owner is responsible for calling
/// [`stop`](Dispatcher::stop) on every exit path, since nothing tears
/// the worker down implicitly.
pub struct Dispatcher {
    name: String,
    sink: Arc<dyn Sink>,
    queue: Arc<DispatchQueue>,
    admission: Arc<AdmissionController>,
    running: Arc<AtomicBool>,
    exited: Mutex<Option<oneshot::Receiver<()>>>,
    rt: Handle,
}

impl Dispatcher {
    /// Spawn a dispatcher and its drain worker on the current runtime.
    ///
    /// Panics if called outside a Tokio runtime. The worker starts in
    /// its idle state immediately and lives until [`stop`] is called.
    ///
    /// [`stop`]: Dispatcher::stop
    pub fn spawn(name: impl Into<String>, sink: Arc<dyn Sink>, config: DispatcherConfig) -> Arc<Self> {
        // Enforce a minimal idle timeout to avoid a degenerate spin.
        let idle_timeout = if config.idle_timeout < Duration::from_millis(10) {
            Duration::from_millis(10)
        } else {
            config.idle_timeout
        };

        let queue = Arc::new(DispatchQueue::new());
        let admission = Arc::new(AdmissionController::new(
            config.warn_threshold,
            config.error_threshold,
        ));
        let running = Arc::new(AtomicBool::new(true));
        let (exited_tx, exited_rx) = oneshot::channel();

        let rt = Handle::current();
        rt.spawn(drain_loop(
            Arc::clone(&queue),
            Arc::clone(&sink),
            Arc::clone(&admission),
            Arc::clone(&running),
            idle_timeout,
            exited_tx,
        ));

        Arc::new(Self {
            name: name.into(),
            sink,
            queue,
            admission,
            running,
            exited: Mutex::new(Some(exited_rx)),
            rt,
        })
    }

    /// Judge one record against the admission policy and queue it.
    ///
    /// **Returns**
    /// - `Ok(true)` if the record was admitted and pushed.
    /// - `Ok(false)` if it was dropped by the depth policy, or refused
    ///   because the dispatcher is stopped. Loss above the hard
    ///   threshold is deliberate policy, not an error.
    /// - `Err(..)` only for caller mistakes caught before any enqueue
    ///   attempt.
    ///
    /// Never blocks: threshold-crossing notices are written to the sink
    /// by a detached task (bypassing the queue, so a notice about queue
    /// pressure never adds to queue pressure), and the sticky flags flip
    /// here, synchronously, keeping the notices at-most-once.
    pub fn enqueue(
        &self,
        level: RecordLevel,
        event_id: u32,
        payload: Payload,
        exception: Option<BoxError>,
        formatter: Option<RecordFormatter>,
        logger_name: &str,
    ) -> Result<bool, EnqueueError> {
        if formatter.is_none() && payload.is_structured() {
            return Err(EnqueueError::MissingFormatter);
        }

        if !self.running.load(Ordering::Acquire) {
            return Ok(false);
        }

        let depth = self.queue.len();
        let verdict = self.admission.admit(depth);

        if verdict.warn_notice {
            self.spawn_notice(Level::Warn, self.admission.warn_threshold());
        }
        if verdict.error_notice {
            self.spawn_notice(Level::Error, self.admission.error_threshold());
        }
        if !verdict.accept {
            return Ok(false);
        }

        let (thread_id, thread_name) = current_thread_ident();
        self.queue.push(LogRecord {
            level,
            event_id,
            payload,
            exception,
            formatter,
            logger_name: logger_name.to_owned(),
            enqueue_depth: depth,
            enqueue_ts: Utc::now(),
            thread_id,
            thread_name,
        });

        Ok(true)
    }

    pub fn fatal(&self, message: impl Into<String>) -> Result<bool, EnqueueError> {
        self.leveled(RecordLevel::Fatal, message.into())
    }

    pub fn error(&self, message: impl Into<String>) -> Result<bool, EnqueueError> {
        self.leveled(RecordLevel::Error, message.into())
    }

    pub fn warn(&self, message: impl Into<String>) -> Result<bool, EnqueueError> {
        self.leveled(RecordLevel::Warn, message.into())
    }

    pub fn info(&self, message: impl Into<String>) -> Result<bool, EnqueueError> {
        self.leveled(RecordLevel::Info, message.into())
    }

    pub fn debug(&self, message: impl Into<String>) -> Result<bool, EnqueueError> {
        self.leveled(RecordLevel::Debug, message.into())
    }

    fn leveled(&self, level: RecordLevel, message: String) -> Result<bool, EnqueueError> {
        self.enqueue(level, 0, Payload::Text(message), None, None, &self.name)
    }

    /// Stop accepting records and wait until the worker confirms exit.
    ///
    /// The worker is not woken; its bounded idle wait observes the
    /// cleared flag within one timeout interval, drains whatever is
    /// still queued and signals back, so this call blocks for roughly
    /// the idle timeout in the common case. Calling `stop` twice is
    /// safe: the second call returns `Graceful` without waiting.
    pub async fn stop(&self) -> ShutdownOutcome {
        self.running.store(false, Ordering::Release);

        let receiver = {
            let mut slot = self.exited.lock().unwrap_or_else(PoisonError::into_inner);
            slot.take()
        };

        match receiver {
            Some(exited) => match exited.await {
                Ok(()) => ShutdownOutcome::Graceful,
                Err(_) => ShutdownOutcome::Unconfirmed,
            },
            // A previous stop already joined the worker.
            None => ShutdownOutcome::Graceful,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The sink this dispatcher writes to, for wiring gates and level
    /// controllers against the same backend.
    pub fn sink(&self) -> Arc<dyn Sink> {
        Arc::clone(&self.sink)
    }

    /// Approximate number of queued records.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn warn_threshold(&self) -> usize {
        self.admission.warn_threshold()
    }

    pub fn set_warn_threshold(&self, depth: usize) -> usize {
        self.admission.set_warn_threshold(depth)
    }

    pub fn error_threshold(&self) -> usize {
        self.admission.error_threshold()
    }

    pub fn set_error_threshold(&self, depth: usize) -> usize {
        self.admission.set_error_threshold(depth)
    }

    pub fn reset_warn_flag(&self) {
        self.admission.reset_warn_flag();
    }

    pub fn reset_error_flag(&self) {
        self.admission.reset_error_flag();
    }

    fn spawn_notice(&self, level: Level, threshold: usize) {
        let sink = Arc::clone(&self.sink);
        let text = format!("The logging message queue has passed {threshold} messages.");
        self.rt.spawn(async move {
            let outcome = match level {
                Level::Warn => sink.warn(&text, None).await,
                _ => sink.error(&text, None).await,
            };
            if let Err(e) = outcome {
                eprintln!("queue threshold notice write failed: {e}");
            }
        });
    }
}

/// Worker body: a bounded idle wait followed by a drain-to-empty pass,
/// repeated until the running flag clears.
async fn drain_loop(
    queue: Arc<DispatchQueue>,
    sink: Arc<dyn Sink>,
    admission: Arc<AdmissionController>,
    running: Arc<AtomicBool>,
    idle_timeout: Duration,
    exited_tx: oneshot::Sender<()>,
) {
    loop {
        // Idle: either a push signal or the timeout moves the loop into
        // a drain pass, so a cleared running flag is observed within one
        // timeout interval even when no records arrive.
        tokio::select! {
            _ = queue.wake_signal() => {}
            _ = sleep(idle_timeout) => {}
        }

        // Draining: emptiness is re-checked after every pop, so records
        // enqueued mid-drain are consumed in the same pass.
        while let Some(record) = queue.try_pop() {
            dispatch_record(&*sink, record, queue.len(), admission.depth_width()).await;
        }

        if !running.load(Ordering::Acquire) {
            break;
        }
    }

    // Exactly one exit signal. The receiver may already be gone if the
    // owner dropped the dispatcher without stopping it.
    let _ = exited_tx.send(());
}

/// Format one dequeued record and forward it to the sink method matching
/// its level.
async fn dispatch_record(sink: &dyn Sink, record: LogRecord, remaining_depth: usize, width: usize) {
    let body = match &record.formatter {
        Some(formatter) => formatter(&record.payload, record.exception.as_deref()),
        None => record.payload.to_string(),
    };

    let text = format!(
        "DQ={:0w$},EVT={:04},{}{}",
        remaining_depth,
        record.event_id,
        enqueue_prefix(&record, width),
        body,
        w = width,
    );

    let exception = record.exception.as_deref();
    let outcome = match record.level {
        RecordLevel::Debug | RecordLevel::Trace => sink.debug(&text, exception).await,
        RecordLevel::Info => sink.info(&text, exception).await,
        RecordLevel::Warn => sink.warn(&text, exception).await,
        RecordLevel::Error => sink.error(&text, exception).await,
        RecordLevel::Fatal => sink.fatal(&text, exception).await,
        RecordLevel::Other(code) => {
            // Misclassified records are surfaced, not silently lost.
            let marked = format!("[Unrecognised logLevel {code}] {text}");
            sink.error(&marked, exception).await
        }
    };

    if let Err(e) = outcome {
        eprintln!("log sink write failed, record lost: {e}");
    }
}

/// Enqueue-side prefix fields: depth at admission, UTC enqueue time,
/// producing-thread ordinal and optional name, then the logger name.
fn enqueue_prefix(record: &LogRecord, width: usize) -> String {
    let mut prefix = format!(
        "NQ={:0w$},NQUTC={},NQTHR={:03},",
        record.enqueue_depth,
        record.enqueue_ts.format("%H:%M:%S%.3f"),
        record.thread_id,
        w = width,
    );
    if let Some(name) = &record.thread_name {
        prefix.push_str("THRNM=");
        prefix.push_str(name);
        prefix.push(',');
    }
    prefix.push_str(&record.logger_name);
    prefix.push(',');
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_sink::{MemorySink, SinkMethod};

    fn spawn_with(sink: &Arc<MemorySink>, config: DispatcherConfig) -> Arc<Dispatcher> {
        let sink = Arc::clone(sink) as Arc<dyn Sink>;
        Dispatcher::spawn("test", sink, config)
    }

    #[tokio::test(start_paused = true)]
    async fn structured_payload_without_formatter_is_refused() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = spawn_with(&sink, DispatcherConfig::default());

        let refused = dispatcher.enqueue(
            RecordLevel::Info,
            0,
            Payload::Structured(serde_json::json!({"k": 1})),
            None,
            None,
            "test",
        );
        assert!(matches!(refused, Err(EnqueueError::MissingFormatter)));

        assert_eq!(dispatcher.stop().await, ShutdownOutcome::Graceful);
        assert_eq!(sink.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn formatter_builds_the_body_and_exception_reaches_the_sink() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = spawn_with(&sink, DispatcherConfig::default());

        let formatter: RecordFormatter = Arc::new(|payload, exception| {
            let suffix = exception.map(|e| format!(" ({e})")).unwrap_or_default();
            format!("rendered:{payload}{suffix}")
        });
        let boom: BoxError = Box::new(std::io::Error::new(std::io::ErrorKind::Other, "boom"));

        let admitted = dispatcher
            .enqueue(
                RecordLevel::Error,
                7,
                Payload::Structured(serde_json::json!({"op": "save"})),
                Some(boom),
                Some(formatter),
                "svc",
            )
            .unwrap();
        assert!(admitted);

        dispatcher.stop().await;

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, SinkMethod::Error);
        assert!(calls[0].text.ends_with(r#"rendered:{"op":"save"} (boom)"#));
        assert_eq!(calls[0].exception.as_deref(), Some("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn unrecognised_level_routes_to_error_with_marker() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = spawn_with(&sink, DispatcherConfig::default());

        dispatcher
            .enqueue(RecordLevel::Other(9), 0, Payload::from("odd"), None, None, "test")
            .unwrap();
        dispatcher.stop().await;

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, SinkMethod::Error);
        assert!(calls[0].text.starts_with("[Unrecognised logLevel 9] "));
    }

    #[tokio::test(start_paused = true)]
    async fn trace_shares_the_debug_method() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = spawn_with(&sink, DispatcherConfig::default());

        dispatcher
            .enqueue(RecordLevel::Trace, 0, Payload::from("fine-grained"), None, None, "test")
            .unwrap();
        dispatcher.stop().await;

        assert_eq!(sink.calls()[0].method, SinkMethod::Debug);
    }

    #[tokio::test(start_paused = true)]
    async fn prefix_carries_the_enqueue_side_fields() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = spawn_with(
            &sink,
            DispatcherConfig {
                warn_threshold: 2,
                error_threshold: 5,
                ..DispatcherConfig::default()
            },
        );

        dispatcher
            .enqueue(RecordLevel::Info, 42, Payload::from("hello"), None, None, "api")
            .unwrap();
        dispatcher.stop().await;

        let text = &sink.calls()[0].text;
        // Error threshold 5 clamps the depth width to the minimum of 4.
        assert!(text.starts_with("DQ=0000,EVT=0042,NQ=0000,NQUTC="), "got: {text}");
        assert!(text.contains("NQTHR="), "got: {text}");
        assert!(text.contains(",api,hello"), "got: {text}");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_refuses_later_records() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = spawn_with(&sink, DispatcherConfig::default());

        dispatcher.info("before stop").unwrap();
        assert_eq!(dispatcher.stop().await, ShutdownOutcome::Graceful);
        assert_eq!(dispatcher.stop().await, ShutdownOutcome::Graceful);

        assert!(!dispatcher.is_running());
        assert_eq!(dispatcher.info("after stop").unwrap(), false);
        assert_eq!(dispatcher.queue_len(), 0);
        assert_eq!(sink.call_count(), 1);
    }
}
