// SPDX-License-Identifier: MIT OR Apache-2.0

use sherlock::context::ApplyContext;
use sherlock::{InMemorySink, LoggingManager, LoggingPresets, RequestContext, ROOT_LOGGER};
use std::sync::{Arc, Barrier};

fn manager_with_capture() -> (LoggingManager, Arc<InMemorySink>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = LoggingPresets::minimal();
    config.logs_dir = dir.path().to_path_buf();
    config.console_enabled = false;
    let manager = LoggingManager::new(config);
    manager.setup().unwrap();
    let sink = Arc::new(InMemorySink::new());
    assert!(manager.attach_sink(ROOT_LOGGER, sink.clone()));
    (manager, sink, dir)
}

#[test]
fn threads_never_see_each_others_ids() {
    let (manager, sink, _dir) = manager_with_capture();
    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let manager = manager.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                let _request = RequestContext::scope(format!("req-{worker}"));
                barrier.wait();
                for step in 0..50 {
                    manager.logger("worker").info(format!("worker={worker} step={step}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let records = sink.records();
    assert_eq!(records.len(), 200);
    for record in records {
        let worker = record
            .message()
            .strip_prefix("worker=")
            .and_then(|rest| rest.split(' ').next())
            .unwrap();
        assert_eq!(record.correlation_id(), Some(format!("req-{worker}").as_str()));
    }
}

#[test]
fn interleaved_tasks_on_one_thread_stay_isolated() {
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    /// Pending on the first poll, ready on the second.
    struct YieldOnce(bool);
    impl Future for YieldOnce {
        type Output = ();
        fn poll(mut self: std::pin::Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    let (manager, sink, _dir) = manager_with_capture();
    let task = |id: &'static str| {
        let manager = manager.clone();
        ApplyContext::new(id, async move {
            manager.logger("task").info("before suspension");
            YieldOnce(false).await;
            manager.logger("task").info("after suspension");
        })
    };
    let mut a = pin!(task("task-a"));
    let mut b = pin!(task("task-b"));
    let mut cx = Context::from_waker(Waker::noop());
    assert!(a.as_mut().poll(&mut cx).is_pending());
    assert!(b.as_mut().poll(&mut cx).is_pending());
    assert!(RequestContext::get().is_none());
    assert!(b.as_mut().poll(&mut cx).is_ready());
    assert!(a.as_mut().poll(&mut cx).is_ready());

    let ids: Vec<Option<String>> = sink
        .records()
        .iter()
        .map(|r| r.correlation_id().map(str::to_string))
        .collect();
    let expected = ["task-a", "task-b", "task-b", "task-a"].map(|s| Some(s.to_string()));
    assert_eq!(ids, expected.to_vec());
}

#[test]
fn generated_ids_are_short_and_distinct() {
    let first = sherlock::set_request_id(None);
    let second = sherlock::set_request_id(None);
    assert_eq!(first.len(), 8);
    assert_ne!(first, second);
    assert_eq!(sherlock::get_request_id(), Some(second));
    sherlock::clear_request_id();
    assert_eq!(RequestContext::current_or_placeholder(), "no-request-id");
}
