use crate::dispatcher::Dispatcher;
use crate::layer::DispatchLayer;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Controls how the dispatch layer is installed globally.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer is
///   composed on top of the dispatch layer so events are echoed to the
///   console as well as queued for the sink.
#[derive(Clone, Debug)]
pub struct InstallConfig {
    pub enable_stdout: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self { enable_stdout: true }
    }
}

/// Install a [`DispatchLayer`] over `dispatcher` as the global `tracing`
/// subscriber.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with the dispatch layer as the
/// global default subscriber, so all `tracing` events in the process are
/// observed by the layer and queued for asynchronous delivery.
pub fn init_dispatch_with_config(dispatcher: Arc<Dispatcher>, config: InstallConfig) {
    let layer = DispatchLayer::new(dispatcher);

    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }
}

/// Install the dispatch layer with default settings.
///
/// Equivalent to calling [`init_dispatch_with_config`] with
/// [`InstallConfig::default`]. This is the recommended entrypoint for
/// typical services.
pub fn init_dispatch(dispatcher: Arc<Dispatcher>) {
    init_dispatch_with_config(dispatcher, InstallConfig::default());
}
