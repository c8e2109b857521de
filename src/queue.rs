use crate::record::LogRecord;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Notify;

/// Multi-producer, single-consumer FIFO of pending records.
///
/// Pushes never block beyond the short slot lock and wake the drain
/// worker through a [`Notify`]; a notification arriving while the worker
/// is draining is held as a permit, so no wakeup is lost. `len` is
/// approximate under concurrent producers and is informational only,
/// consistent with admission control being advisory.
pub struct DispatchQueue {
    slots: Mutex<VecDeque<LogRecord>>,
    depth: AtomicUsize,
    wake: Notify,
}

impl DispatchQueue {
    pub fn new() -> Self {
        DispatchQueue {
            slots: Mutex::new(VecDeque::new()),
            depth: AtomicUsize::new(0),
            wake: Notify::new(),
        }
    }

    /// Append a record and signal the drain worker.
    pub fn push(&self, record: LogRecord) {
        {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.push_back(record);
            self.depth.store(slots.len(), Ordering::Release);
        }
        self.wake.notify_one();
    }

    /// Remove the oldest record, if any. Single-consumer side.
    pub fn try_pop(&self) -> Option<LogRecord> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let record = slots.pop_front();
        self.depth.store(slots.len(), Ordering::Release);
        record
    }

    /// Approximate number of queued records.
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves on the next push signal (or immediately, if a push
    /// happened since the last wait).
    pub(crate) async fn wake_signal(&self) {
        self.wake.notified().await;
    }
}

impl Default for DispatchQueue {
    fn default() -> Self {
        Self::new()
    }
}
