use crate::config::{build_sink, SinkBuildError, SinkConfig};
use crate::dispatcher::{Dispatcher, DispatcherConfig, ShutdownOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Name-keyed owner of independent dispatchers.
///
/// Each distinct name gets its own queue/worker pair built from the
/// registry's sink and dispatcher configuration. `get_or_create` is
/// atomic under one lock: the first caller to register a name wins, and
/// a concurrent second caller for the same name receives the winner's
/// instance rather than a duplicate pair.
pub struct LoggerRegistry {
    dispatchers: Mutex<HashMap<String, Arc<Dispatcher>>>,
    sink_config: SinkConfig,
    dispatcher_config: DispatcherConfig,
}

impl LoggerRegistry {
    pub fn new(sink_config: SinkConfig, dispatcher_config: DispatcherConfig) -> Self {
        LoggerRegistry {
            dispatchers: Mutex::new(HashMap::new()),
            sink_config,
            dispatcher_config,
        }
    }

    /// Fetch the dispatcher registered under `name`, creating it (and
    /// its sink) on first use.
    ///
    /// A sink that cannot be built fails dispatcher creation outright:
    /// a logging pipeline that cannot reach its sink should fail the
    /// owning process's startup rather than run degraded. Panics if
    /// called outside a Tokio runtime (the worker task has to be
    /// spawned somewhere).
    pub fn get_or_create(&self, name: &str) -> Result<Arc<Dispatcher>, SinkBuildError> {
        let mut map = self
            .dispatchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = map.get(name) {
            return Ok(Arc::clone(existing));
        }

        let sink = build_sink(&self.sink_config)?;
        let dispatcher = Dispatcher::spawn(name, sink, self.dispatcher_config.clone());
        map.insert(name.to_owned(), Arc::clone(&dispatcher));
        Ok(dispatcher)
    }

    /// Direct access to an already-registered dispatcher.
    pub fn lookup(&self, name: &str) -> Option<Arc<Dispatcher>> {
        self.dispatchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(Arc::clone)
    }

    /// Drop a dispatcher from the registry without stopping it. Used
    /// during shutdown of that dispatcher.
    pub fn remove(&self, name: &str) -> Option<Arc<Dispatcher>> {
        self.dispatchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Stop a dispatcher and drop it from the registry, waiting for its
    /// worker to exit.
    pub async fn shutdown(&self, name: &str) -> Option<ShutdownOutcome> {
        let dispatcher = self.remove(name)?;
        Some(dispatcher.stop().await)
    }

    /// Stop every dispatcher. Owners call this on all exit paths; there
    /// is no implicit teardown.
    pub async fn shutdown_all(&self) {
        let drained: Vec<(String, Arc<Dispatcher>)> = {
            let mut map = self
                .dispatchers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            map.drain().collect()
        };

        for (name, dispatcher) in drained {
            if dispatcher.stop().await == ShutdownOutcome::Unconfirmed {
                eprintln!("log worker '{name}' did not confirm exit");
            }
        }
    }
}
