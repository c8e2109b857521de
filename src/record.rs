use chrono::{DateTime, Utc};
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Error currency carried alongside a record.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Statically typed message formatter captured at the call site.
///
/// Invoked on the drain worker with the record's payload and optional
/// exception to produce the message body.
pub type RecordFormatter =
    Arc<dyn Fn(&Payload, Option<&(dyn Error + Send + Sync)>) -> String + Send + Sync>;

/// Severity of a single record.
///
/// `Trace` shares `Debug`'s enabled flag and sink method. `Other` carries
/// a numeric level that maps onto no canonical severity; such records are
/// still dispatched (to the sink's error method, with a marker) so that
/// misclassified records are never silently lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Other(u8),
}

/// Opaque message payload plus its declared shape.
///
/// `Text` renders as-is when no formatter is supplied; `Structured`
/// requires an explicit formatter at enqueue time.
pub enum Payload {
    Text(String),
    Structured(Value),
}

impl Payload {
    pub fn is_structured(&self) -> bool {
        matches!(self, Payload::Structured(_))
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) => f.write_str(text),
            Payload::Structured(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Payload::Structured(value) => f.debug_tuple("Structured").field(value).finish(),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_owned())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Structured(value)
    }
}

/// One queued log event, immutable once constructed.
///
/// Owned solely by its queue slot until dequeued, then by the drain
/// worker until dispatched to the sink. The enqueue-side fields
/// (`enqueue_depth`, `enqueue_ts`, `thread_id`, `thread_name`) are
/// captured at admission time and rendered into the message prefix on
/// dequeue.
pub struct LogRecord {
    pub level: RecordLevel,
    pub event_id: u32,
    pub payload: Payload,
    pub exception: Option<BoxError>,
    pub formatter: Option<RecordFormatter>,
    pub logger_name: String,
    /// Queue length observed at admission time.
    pub enqueue_depth: usize,
    pub enqueue_ts: DateTime<Utc>,
    /// Small per-thread ordinal of the producing thread.
    pub thread_id: u64,
    pub thread_name: Option<String>,
}

impl fmt::Debug for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("level", &self.level)
            .field("event_id", &self.event_id)
            .field("payload", &self.payload)
            .field("exception", &self.exception)
            .field("logger_name", &self.logger_name)
            .field("enqueue_depth", &self.enqueue_depth)
            .field("enqueue_ts", &self.enqueue_ts)
            .field("thread_id", &self.thread_id)
            .field("thread_name", &self.thread_name)
            .finish_non_exhaustive()
    }
}

// `std::thread::ThreadId` exposes no stable integer, so threads are
// assigned small sequential ordinals on first use for prefix rendering.
static NEXT_THREAD_ORDINAL: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ORDINAL: u64 = NEXT_THREAD_ORDINAL.fetch_add(1, Ordering::Relaxed);
}

/// Ordinal and name of the calling thread, captured at enqueue time.
pub(crate) fn current_thread_ident() -> (u64, Option<String>) {
    let ordinal = THREAD_ORDINAL.with(|ordinal| *ordinal);
    (ordinal, std::thread::current().name().map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_renders_as_is() {
        assert_eq!(Payload::from("plain message").to_string(), "plain message");
    }

    #[test]
    fn structured_payload_renders_as_json() {
        let payload = Payload::from(serde_json::json!({"user": 42}));
        assert!(payload.is_structured());
        assert_eq!(payload.to_string(), r#"{"user":42}"#);
    }

    #[test]
    fn thread_ordinal_is_stable_within_a_thread() {
        let (first, _) = current_thread_ident();
        let (second, _) = current_thread_ident();
        assert_eq!(first, second);
    }
}
