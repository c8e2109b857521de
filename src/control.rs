use crate::level::Level;
use crate::sink::Sink;
use std::sync::Arc;
use tokio::sync::watch;

/// Process-wide runtime log-level control over one sink.
///
/// Setting a level translates the operator input, mutates the sink's
/// global level state (which marks it configured) and broadcasts the
/// effective code on a watch channel so dependent readers can react.
/// There is deliberately no lock around the translate-then-mutate
/// sequence: concurrent setters race with last-write-wins semantics,
/// consistent with an operator-triggered, low-frequency control path.
pub struct LevelController {
    sink: Arc<dyn Sink>,
    changed: watch::Sender<i32>,
}

impl LevelController {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        let initial = sink.level().map_or(-1, Level::code);
        let (changed, _) = watch::channel(initial);
        LevelController { sink, changed }
    }

    /// Current effective code, -1 while the sink has no level state yet.
    pub fn get_level(&self) -> i32 {
        self.sink.level().map_or(-1, Level::code)
    }

    /// Set the level by name (aliases accepted, unknown names fall back
    /// to INFO). Returns the effective code.
    pub fn set_level(&self, level: &str) -> i32 {
        self.apply(Level::parse(level))
    }

    /// Set the level by numeric code (unknown codes fall back to INFO).
    /// Returns the effective code.
    pub fn set_level_code(&self, code: i32) -> i32 {
        self.apply(Level::from_code(code))
    }

    /// Configuration-changed notifications: receives the effective code
    /// after every set.
    pub fn subscribe(&self) -> watch::Receiver<i32> {
        self.changed.subscribe()
    }

    fn apply(&self, level: Level) -> i32 {
        self.sink.set_level(level);
        let effective = self.get_level();
        self.changed.send_replace(effective);
        effective
    }
}
