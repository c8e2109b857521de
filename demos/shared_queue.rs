use std::sync::Arc;
use tracing::{error, info};

use queued_log_sink::console::ConsoleSink;
use queued_log_sink::dispatcher::{Dispatcher, DispatcherConfig};
use queued_log_sink::init::{init_dispatch_with_config, InstallConfig};
use queued_log_sink::sink::Sink;

#[tokio::main]
async fn main() {
    let sink = Arc::new(ConsoleSink::new()) as Arc<dyn Sink>;
    let dispatcher = Dispatcher::spawn("shared", sink, DispatcherConfig::default());

    // One shared queue behind the whole tracing surface; events carry
    // their own target as the logger name.
    init_dispatch_with_config(
        Arc::clone(&dispatcher),
        InstallConfig { enable_stdout: false },
    );

    info!("starting service");

    error!(
        user_id = 42,
        reason = "invalid password",
        "authentication failed"
    );

    dispatcher.stop().await;
}
