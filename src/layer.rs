use crate::dispatcher::Dispatcher;
use crate::gate::LevelGate;
use crate::record::{Payload, RecordFormatter, RecordLevel};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{Event, Level as TracingLevel, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that forwards events into a [`Dispatcher`].
///
/// The enabled-check goes through the [`LevelGate`] against the live
/// sink state, so runtime level changes take effect without
/// reinstalling the subscriber. Enqueueing never blocks the emitting
/// thread; records refused by admission control are counted, not
/// surfaced as errors.
pub struct DispatchLayer {
    dispatcher: Arc<Dispatcher>,
    gate: LevelGate,
    /// Total events seen by the layer (before the enabled-check).
    pub total_events: Arc<AtomicU64>,
    /// Successfully admitted to the queue.
    pub enqueued_events: Arc<AtomicU64>,
    /// Refused by admission control (or after a stop).
    pub dropped_events: Arc<AtomicU64>,
}

impl DispatchLayer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let gate = LevelGate::new(dispatcher.sink());
        Self {
            dispatcher,
            gate,
            total_events: Arc::new(AtomicU64::new(0)),
            enqueued_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

fn map_level(level: TracingLevel) -> RecordLevel {
    if level == TracingLevel::TRACE {
        RecordLevel::Trace
    } else if level == TracingLevel::DEBUG {
        RecordLevel::Debug
    } else if level == TracingLevel::INFO {
        RecordLevel::Info
    } else if level == TracingLevel::WARN {
        RecordLevel::Warn
    } else {
        RecordLevel::Error
    }
}

/// Renders a captured event: the message first, remaining fields as a
/// JSON object, the exception last.
fn event_formatter() -> RecordFormatter {
    Arc::new(|payload, exception| {
        let mut text = match payload {
            Payload::Structured(Value::Object(body)) => {
                let message = body
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                let rest: serde_json::Map<String, Value> = body
                    .iter()
                    .filter(|(key, _)| key.as_str() != "message")
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                if rest.is_empty() {
                    message
                } else if message.is_empty() {
                    Value::Object(rest).to_string()
                } else {
                    format!("{message} {}", Value::Object(rest))
                }
            }
            other => other.to_string(),
        };
        if let Some(exception) = exception {
            text.push_str(&format!(" [{exception}]"));
        }
        text
    })
}

impl<S> Layer<S> for DispatchLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let level = map_level(*event.metadata().level());
        if !self.gate.is_enabled(level).unwrap_or(false) {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let mut body = serde_json::Map::new();
        if let Some(message) = message {
            body.insert("message".to_owned(), Value::String(message));
        }
        for (key, value) in fields {
            body.insert(key, value);
        }

        let admitted = self.dispatcher.enqueue(
            level,
            0,
            Payload::Structured(Value::Object(body)),
            None,
            Some(event_formatter()),
            event.metadata().target(),
        );

        match admitted {
            Ok(true) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Ok(false) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("log queue saturated, dropping log record");
            }
            Err(e) => {
                eprintln!("failed to enqueue tracing event: {e}");
            }
        }
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(format!("{:?}", value)));
        }
    }
}
