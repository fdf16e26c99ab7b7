// SPDX-License-Identifier: MIT OR Apache-2.0

use sherlock::context::ApplyContext;
use sherlock::{
    CallSite, InMemorySink, Level, LoggerNames, LoggingConfig, LoggingManager, log_performance_async,
    monitor_resources_async,
};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use test_executors::async_test;

/// Completes after `duration`, woken from a helper thread.
struct Delay {
    duration: Duration,
    started: bool,
    done: Arc<Mutex<bool>>,
}

impl Delay {
    fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: false,
            done: Arc::new(Mutex::new(false)),
        }
    }
}

impl Future for Delay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if *self.done.lock().unwrap() {
            return Poll::Ready(());
        }
        if !self.started {
            self.started = true;
            let done = self.done.clone();
            let waker = cx.waker().clone();
            let duration = self.duration;
            std::thread::spawn(move || {
                std::thread::sleep(duration);
                *done.lock().unwrap() = true;
                waker.wake();
            });
        }
        Poll::Pending
    }
}

fn harness() -> (LoggingManager, Arc<InMemorySink>, Arc<InMemorySink>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let manager = LoggingManager::new(LoggingConfig {
        logs_dir: dir.path().to_path_buf(),
        console_enabled: false,
        ..LoggingConfig::default()
    });
    manager.setup().unwrap();
    let perf = Arc::new(InMemorySink::new());
    let monitoring = Arc::new(InMemorySink::new());
    manager.attach_sink(LoggerNames::PERFORMANCE, perf.clone());
    manager.attach_sink(LoggerNames::MONITORING, monitoring.clone());
    (manager, perf, monitoring, dir)
}

#[async_test]
async fn suspension_counts_toward_duration() {
    let (manager, perf, _monitoring, _dir) = harness();
    let site = CallSite::new("remote_call")
        .on(&manager)
        .slow_threshold(Duration::from_millis(100));
    let result: Result<&str, String> = log_performance_async(&site, async {
        Delay::new(Duration::from_millis(150)).await;
        Ok("pong")
    })
    .await;
    assert_eq!(result, Ok("pong"));

    let records = perf.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level(), Level::Warning);
    let ms = records[0].get_field("duration_ms").and_then(|v| v.as_f64()).unwrap();
    assert!(ms >= 150.0, "measured {ms}ms");
}

#[async_test]
async fn async_errors_are_returned_unchanged() {
    let (manager, perf, _monitoring, _dir) = harness();
    let site = CallSite::new("lookup").on(&manager);
    let result: Result<u8, std::io::Error> = log_performance_async(&site, async {
        Delay::new(Duration::from_millis(5)).await;
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such user"))
    })
    .await;
    let err = result.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    assert_eq!(err.to_string(), "no such user");

    let records = perf.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level(), Level::Error);
    assert!(records[0].message().contains("Error: no such user"));
    assert_eq!(manager.stats().call_site("lookup").unwrap().failures, 1);
}

#[async_test]
async fn task_ids_tag_async_records() {
    let (manager, _perf, monitoring, _dir) = harness();
    let site = CallSite::new("batch").on(&manager);
    let result: Result<(), String> = ApplyContext::new("req-async", async {
        monitor_resources_async(&site, async {
            Delay::new(Duration::from_millis(5)).await;
            Ok(())
        })
        .await
    })
    .await;
    assert!(result.is_ok());

    let records = monitoring.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].correlation_id(), Some("req-async"));
    assert!(records[0].message().starts_with("RESOURCES | batch | SUCCESS"));
    assert!(records[0].get_field("cpu_percent").is_some());
}
