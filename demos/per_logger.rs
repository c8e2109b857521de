use queued_log_sink::config::SinkConfig;
use queued_log_sink::control::LevelController;
use queued_log_sink::dispatcher::DispatcherConfig;
use queued_log_sink::registry::LoggerRegistry;

#[tokio::main]
async fn main() {
    let registry = LoggerRegistry::new(SinkConfig::console(), DispatcherConfig::default());

    let app = registry.get_or_create("app").expect("build app dispatcher");
    let audit = registry.get_or_create("audit").expect("build audit dispatcher");

    let _ = app.info("service starting");
    let _ = audit.warn("privileged operation requested");
    let _ = app.debug("connection pool warmed");

    // Raise the app sink's threshold at runtime; debug lines stop.
    let control = LevelController::new(app.sink());
    let effective = control.set_level("WARNING");
    println!("effective level code: {effective}");

    let _ = app.debug("this line is below the new threshold");
    let _ = app.error("this one still goes through");

    registry.shutdown_all().await;
}
