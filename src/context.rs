// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request-scoped correlation identifiers.
//!
//! Every log record carries the correlation identifier of the unit of work that produced
//! it, so that lines from unrelated concurrent requests can be told apart. The identifier
//! lives in a thread-local slot, so two threads never observe each other's value.
//!
//! # Setting an identifier
//!
//! The entry point of a unit of work installs the identifier and removes it when done:
//!
//! ```rust
//! use sherlock::context::RequestContext;
//!
//! RequestContext::set("req-7");
//! assert_eq!(RequestContext::get().as_deref(), Some("req-7"));
//! RequestContext::clear();
//! assert_eq!(RequestContext::get(), None);
//! assert_eq!(RequestContext::current_or_placeholder(), "no-request-id");
//! ```
//!
//! # Scoped acquisition
//!
//! [`RequestContext::scope`] installs an identifier and restores whatever was there before
//! when the guard drops, including during panic unwinding:
//!
//! ```rust
//! use sherlock::context::RequestContext;
//!
//! let _outer = RequestContext::scope("outer");
//! {
//!     let _inner = RequestContext::scope("inner");
//!     assert_eq!(RequestContext::get().as_deref(), Some("inner"));
//! }
//! assert_eq!(RequestContext::get().as_deref(), Some("outer"));
//! ```
//!
//! # Async tasks
//!
//! Executors interleave many tasks on one thread, so a thread-local alone would leak one
//! task's identifier into another. [`ApplyContext`] wraps a future and installs its own
//! identifier around every poll:
//!
//! ```rust
//! use sherlock::context::{ApplyContext, RequestContext};
//!
//! # async fn example() {
//! let handled = ApplyContext::new("req-9", async {
//!     RequestContext::get()
//! });
//! assert_eq!(handled.await.as_deref(), Some("req-9"));
//! # }
//! ```
//!
//! Spawned threads and tasks start without an identifier. Propagate one explicitly with
//! [`ApplyContext::inherit`] or by calling [`RequestContext::scope`] in the child.

mod apply_context;
mod request_context;

#[cfg(test)]
mod tests;

pub use apply_context::ApplyContext;
pub use request_context::{
    ContextGuard, NO_REQUEST_ID, RequestContext, clear_request_id, get_request_id, set_request_id,
};
