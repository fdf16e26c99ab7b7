// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async context preservation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;

use super::request_context::{current, replace};

/// A [`Future`] wrapper that gives the wrapped future its own correlation identifier.
///
/// Executors poll many tasks on the same thread, and thread pools may move a task between
/// threads between polls. `ApplyContext` makes the thread-local correct for the duration
/// of each poll:
///
/// 1. Save the poller's identifier
/// 2. Install the task's identifier
/// 3. Poll the inner future
/// 4. Remember whatever identifier the task left installed, for the next poll
/// 5. Restore the poller's identifier
///
/// Step 4 means a task may call [`RequestContext::set`](super::RequestContext::set) itself
/// and still see that value after it resumes from a suspension point.
///
/// # Examples
///
/// ```rust
/// use sherlock::context::{ApplyContext, RequestContext};
///
/// async fn handle() -> Option<String> {
///     RequestContext::get()
/// }
///
/// # async fn example() {
/// let wrapped = ApplyContext::new("req-1", handle());
/// assert_eq!(wrapped.await.as_deref(), Some("req-1"));
/// # }
/// ```
#[derive(Debug)]
pub struct ApplyContext<F> {
    id: Option<Arc<str>>,
    f: F,
}

impl<F> ApplyContext<F> {
    /// Wraps `f` so that it runs with `id` installed.
    pub fn new(id: impl Into<String>, f: F) -> Self {
        let id: String = id.into();
        Self {
            id: Some(Arc::from(id)),
            f,
        }
    }

    /// Wraps `f` so that it runs with the identifier current at the time of this call.
    ///
    /// This is how a parent hands its identifier to child work it spawns.
    pub fn inherit(f: F) -> Self {
        Self { id: current(), f }
    }

    /// Wraps `f` so that it runs with no identifier, whatever the poller has installed.
    pub fn detached(f: F) -> Self {
        Self { id: None, f }
    }

    /// The identifier the task will see on its next poll.
    pub fn request_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl<F> Future for ApplyContext<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        // safety: `f` is never moved out of the pinned struct, and `id` is not structurally pinned
        let (id, fut) = unsafe {
            let d = self.get_unchecked_mut();
            (&mut d.id, Pin::new_unchecked(&mut d.f))
        };
        let restore = Restore {
            prior: replace(id.take()),
            slot: id,
        };
        let r = fut.poll(cx);
        drop(restore);
        r
    }
}

/// Puts the poller's identifier back, also when the inner poll panics.
struct Restore<'a> {
    slot: &'a mut Option<Arc<str>>,
    prior: Option<Arc<str>>,
}

impl Drop for Restore<'_> {
    fn drop(&mut self) {
        *self.slot = replace(self.prior.take());
    }
}
