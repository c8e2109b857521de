use std::sync::atomic::Ordering;
use std::sync::Arc;

use queued_log_sink::dispatcher::{Dispatcher, DispatcherConfig, ShutdownOutcome};
use queued_log_sink::layer::DispatchLayer;
use queued_log_sink::level::Level;
use queued_log_sink::memory_sink::{MemorySink, SinkMethod};
use queued_log_sink::record::{Payload, RecordLevel};
use queued_log_sink::sink::Sink;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

fn spawn_dispatcher(sink: &Arc<MemorySink>, config: DispatcherConfig) -> Arc<Dispatcher> {
    Dispatcher::spawn("pipeline", Arc::clone(sink) as Arc<dyn Sink>, config)
}

// The tests run on the current-thread runtime: the worker task only makes
// progress at await points, so a run of synchronous enqueues builds queue
// depth deterministically and `stop` performs the full drain.

#[tokio::test(start_paused = true)]
async fn records_reach_the_sink_in_enqueue_completion_order() {
    let sink = Arc::new(MemorySink::new());
    let dispatcher = spawn_dispatcher(&sink, DispatcherConfig::default());

    for i in 0..20 {
        let admitted = dispatcher
            .enqueue(
                RecordLevel::Info,
                i,
                Payload::Text(format!("msg-{i}")),
                None,
                None,
                "order",
            )
            .unwrap();
        assert!(admitted);
    }

    assert_eq!(dispatcher.stop().await, ShutdownOutcome::Graceful);

    let texts = sink.texts();
    assert_eq!(texts.len(), 20);
    for (i, text) in texts.iter().enumerate() {
        assert!(text.ends_with(&format!(",order,msg-{i}")), "got: {text}");
    }
}

#[tokio::test(start_paused = true)]
async fn threshold_scenario_totals_eight_sink_calls() {
    let sink = Arc::new(MemorySink::new());
    let dispatcher = spawn_dispatcher(
        &sink,
        DispatcherConfig {
            warn_threshold: 2,
            error_threshold: 5,
            ..DispatcherConfig::default()
        },
    );

    // Six records are admitted while the worker has not yet drained any
    // of them; the seventh observes depth 6 > 5 and is dropped.
    for i in 0..6 {
        assert_eq!(dispatcher.info(format!("burst-{i}")).unwrap(), true);
    }
    assert_eq!(dispatcher.info("burst-6").unwrap(), false);

    dispatcher.stop().await;

    let calls = sink.calls();
    assert_eq!(calls.len(), 8, "6 leveled dispatches + 2 notices");

    let infos = calls.iter().filter(|c| c.method == SinkMethod::Info).count();
    assert_eq!(infos, 6);

    let warn_notices: Vec<_> = calls
        .iter()
        .filter(|c| c.method == SinkMethod::Warn)
        .collect();
    assert_eq!(warn_notices.len(), 1);
    assert_eq!(
        warn_notices[0].text,
        "The logging message queue has passed 2 messages."
    );

    let error_notices: Vec<_> = calls
        .iter()
        .filter(|c| c.method == SinkMethod::Error)
        .collect();
    assert_eq!(error_notices.len(), 1);
    assert_eq!(
        error_notices[0].text,
        "The logging message queue has passed 5 messages."
    );
}

#[tokio::test(start_paused = true)]
async fn error_notice_is_suppressed_until_the_flag_is_reset() {
    let sink = Arc::new(MemorySink::new());
    let dispatcher = spawn_dispatcher(
        &sink,
        DispatcherConfig {
            warn_threshold: 2,
            error_threshold: 5,
            ..DispatcherConfig::default()
        },
    );

    for i in 0..6 {
        dispatcher.info(format!("fill-{i}")).unwrap();
    }
    // Repeated rejections past the boundary raise no further notice.
    assert_eq!(dispatcher.info("over-1").unwrap(), false);
    assert_eq!(dispatcher.info("over-2").unwrap(), false);

    // Re-arming the flag lets the next rejection notify again.
    dispatcher.reset_error_flag();
    assert_eq!(dispatcher.info("over-3").unwrap(), false);

    dispatcher.stop().await;

    let error_notices = sink
        .calls()
        .iter()
        .filter(|c| c.method == SinkMethod::Error)
        .count();
    assert_eq!(error_notices, 2);
    assert_eq!(sink.call_count(), 6 + 1 + 2);
}

#[tokio::test(start_paused = true)]
async fn stop_drains_everything_and_refuses_late_records() {
    let sink = Arc::new(MemorySink::new());
    let dispatcher = spawn_dispatcher(&sink, DispatcherConfig::default());

    for i in 0..10 {
        dispatcher.info(format!("queued-{i}")).unwrap();
    }

    assert_eq!(dispatcher.stop().await, ShutdownOutcome::Graceful);
    assert_eq!(dispatcher.queue_len(), 0);
    assert_eq!(sink.call_count(), 10);

    // Erroneous post-stop enqueues are refused and reach no sink.
    assert_eq!(dispatcher.info("late").unwrap(), false);
    assert_eq!(dispatcher.stop().await, ShutdownOutcome::Graceful);
    assert_eq!(sink.call_count(), 10);
}

#[tokio::test(start_paused = true)]
async fn runtime_level_change_gates_layer_events() {
    let sink = Arc::new(MemorySink::new());
    let dispatcher = spawn_dispatcher(&sink, DispatcherConfig::default());

    let layer = DispatchLayer::new(Arc::clone(&dispatcher));
    let total = Arc::clone(&layer.total_events);
    let enqueued = Arc::clone(&layer.enqueued_events);

    sink.set_level(Level::Error);

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("filtered out");
        tracing::error!("kept");
    });

    dispatcher.stop().await;

    assert_eq!(total.load(Ordering::Relaxed), 2);
    assert_eq!(enqueued.load(Ordering::Relaxed), 1);

    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, SinkMethod::Error);
    assert!(calls[0].text.contains("kept"), "got: {}", calls[0].text);
}

#[tokio::test(start_paused = true)]
async fn layer_captures_fields_and_target() {
    let sink = Arc::new(MemorySink::new());
    let dispatcher = spawn_dispatcher(&sink, DispatcherConfig::default());

    let layer = DispatchLayer::new(Arc::clone(&dispatcher));
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::error!(target: "auth", user_id = 42, "authentication failed");
    });

    dispatcher.stop().await;

    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    let text = &calls[0].text;
    assert!(text.contains(",auth,"), "got: {text}");
    assert!(text.contains("authentication failed"), "got: {text}");
    assert!(text.contains(r#""user_id":42"#), "got: {text}");
}

#[tokio::test(start_paused = true)]
async fn saturation_drops_are_counted_by_the_layer() {
    let sink = Arc::new(MemorySink::new());
    let dispatcher = spawn_dispatcher(
        &sink,
        DispatcherConfig {
            warn_threshold: 0,
            error_threshold: 1,
            ..DispatcherConfig::default()
        },
    );

    let layer = DispatchLayer::new(Arc::clone(&dispatcher));
    let dropped = Arc::clone(&layer.dropped_events);

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("first");
        tracing::info!("second");
        tracing::info!("third"); // depth 2 > 1: refused
    });

    dispatcher.stop().await;

    assert_eq!(dropped.load(Ordering::Relaxed), 1);
    let infos = sink
        .calls()
        .iter()
        .filter(|c| c.method == SinkMethod::Info)
        .count();
    assert_eq!(infos, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_keep_their_own_order() {
    let sink = Arc::new(MemorySink::new());
    let dispatcher = spawn_dispatcher(
        &sink,
        DispatcherConfig {
            idle_timeout: std::time::Duration::from_millis(50),
            ..DispatcherConfig::default()
        },
    );

    let mut producers = Vec::new();
    for p in 0..4 {
        let dispatcher = Arc::clone(&dispatcher);
        producers.push(tokio::spawn(async move {
            for i in 0..25 {
                let admitted = dispatcher
                    .enqueue(
                        RecordLevel::Info,
                        0,
                        Payload::Text(format!("p{p}-{i}")),
                        None,
                        None,
                        &format!("producer-{p}"),
                    )
                    .unwrap();
                assert!(admitted);
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    dispatcher.stop().await;

    let texts = sink.texts();
    assert_eq!(texts.len(), 100);

    // Pushes from one producer complete in its own program order, so its
    // records must drain in that relative order; interleaving across
    // producers is unconstrained.
    for p in 0..4 {
        let marker = format!(",producer-{p},");
        let indices: Vec<usize> = texts
            .iter()
            .filter(|t| t.contains(&marker))
            .map(|t| {
                t.rsplit('-')
                    .next()
                    .and_then(|tail| tail.parse().ok())
                    .unwrap()
            })
            .collect();
        assert_eq!(indices.len(), 25);
        assert!(indices.windows(2).all(|w| w[0] < w[1]), "producer {p} reordered");
    }
}
