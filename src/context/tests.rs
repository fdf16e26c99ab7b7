// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for the context module.

use super::apply_context::ApplyContext;
use super::request_context::{
    NO_REQUEST_ID, RequestContext, clear_request_id, get_request_id, set_request_id,
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// Returns `Pending` once, so two futures polled in turn genuinely interleave.
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();
    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            Poll::Pending
        }
    }
}

fn poll_once<F: Future + Unpin>(f: &mut F) -> Poll<F::Output> {
    let mut cx = Context::from_waker(Waker::noop());
    Pin::new(f).poll(&mut cx)
}

#[test]
fn unset_reads_as_placeholder() {
    RequestContext::clear();
    assert_eq!(RequestContext::get(), None);
    assert_eq!(RequestContext::current_or_placeholder(), NO_REQUEST_ID);
}

#[test]
fn set_get_clear() {
    RequestContext::set("abc");
    assert_eq!(RequestContext::get().as_deref(), Some("abc"));
    RequestContext::set("def");
    assert_eq!(RequestContext::get().as_deref(), Some("def"));
    RequestContext::clear();
    assert_eq!(RequestContext::get(), None);
}

#[test]
fn free_functions_generate_when_asked() {
    let id = set_request_id(None);
    assert_eq!(id.len(), 8);
    assert_eq!(get_request_id(), Some(id));
    assert_eq!(set_request_id(Some("given")), "given");
    assert_eq!(get_request_id().as_deref(), Some("given"));
    clear_request_id();
    assert_eq!(get_request_id(), None);
}

#[test]
fn nested_scopes_restore_in_order() {
    RequestContext::clear();
    {
        let _outer = RequestContext::scope("outer");
        {
            let _inner = RequestContext::scope("inner");
            assert_eq!(RequestContext::get().as_deref(), Some("inner"));
        }
        assert_eq!(RequestContext::get().as_deref(), Some("outer"));
    }
    assert_eq!(RequestContext::get(), None);
}

#[test]
fn scope_restores_through_panics() {
    RequestContext::set("before");
    let result = std::panic::catch_unwind(|| {
        let _guard = RequestContext::scope("during");
        if RequestContext::get().is_some() {
            panic!("boom");
        }
    });
    assert!(result.is_err());
    assert_eq!(RequestContext::get().as_deref(), Some("before"));
    RequestContext::clear();
}

#[test]
fn scope_restores_through_early_returns() {
    fn fails() -> Result<(), &'static str> {
        let _guard = RequestContext::scope("inner");
        let step: Result<(), &'static str> = Err("nope");
        step?;
        Ok(())
    }
    RequestContext::set("outer");
    assert!(fails().is_err());
    assert_eq!(RequestContext::get().as_deref(), Some("outer"));
    RequestContext::clear();
}

#[test]
fn threads_are_isolated() {
    let barrier = std::sync::Arc::new(std::sync::Barrier::new(2));
    let handles: Vec<_> = ["thread-a", "thread-b"]
        .into_iter()
        .map(|id| {
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                RequestContext::set(id);
                // both threads have set their value before either reads
                barrier.wait();
                RequestContext::get()
            })
        })
        .collect();
    let seen: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(seen[0].as_deref(), Some("thread-a"));
    assert_eq!(seen[1].as_deref(), Some("thread-b"));
}

#[test]
fn child_threads_do_not_inherit() {
    let _guard = RequestContext::scope("parent");
    let child = std::thread::spawn(RequestContext::get).join().unwrap();
    assert_eq!(child, None);
}

#[test]
fn interleaved_tasks_are_isolated() {
    RequestContext::set("poller");
    let mut a = Box::pin(ApplyContext::new("task-a", async {
        let first = RequestContext::get();
        YieldNow(false).await;
        (first, RequestContext::get())
    }));
    let mut b = Box::pin(ApplyContext::new("task-b", async {
        let first = RequestContext::get();
        YieldNow(false).await;
        (first, RequestContext::get())
    }));

    assert!(poll_once(&mut a).is_pending());
    assert!(poll_once(&mut b).is_pending());
    assert_eq!(RequestContext::get().as_deref(), Some("poller"));

    let Poll::Ready((a_first, a_second)) = poll_once(&mut a) else {
        panic!("task a should finish on its second poll");
    };
    let Poll::Ready((b_first, b_second)) = poll_once(&mut b) else {
        panic!("task b should finish on its second poll");
    };
    assert_eq!(a_first.as_deref(), Some("task-a"));
    assert_eq!(a_second.as_deref(), Some("task-a"));
    assert_eq!(b_first.as_deref(), Some("task-b"));
    assert_eq!(b_second.as_deref(), Some("task-b"));
    assert_eq!(RequestContext::get().as_deref(), Some("poller"));
    RequestContext::clear();
}

#[test]
fn task_sets_survive_suspension() {
    RequestContext::clear();
    let mut task = Box::pin(ApplyContext::detached(async {
        RequestContext::set("set-inside");
        YieldNow(false).await;
        RequestContext::get()
    }));
    assert!(poll_once(&mut task).is_pending());
    assert_eq!(RequestContext::get(), None);
    assert_eq!(task.request_id(), Some("set-inside"));
    assert_eq!(poll_once(&mut task), Poll::Ready(Some("set-inside".to_string())));
}

#[test]
fn inherit_captures_the_spawning_id() {
    let wrapped = {
        let _guard = RequestContext::scope("spawner");
        ApplyContext::inherit(async { RequestContext::get() })
    };
    assert_eq!(wrapped.request_id(), Some("spawner"));
    let mut wrapped = Box::pin(wrapped);
    assert_eq!(poll_once(&mut wrapped), Poll::Ready(Some("spawner".to_string())));
}
