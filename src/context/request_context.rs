// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread-local storage for the correlation identifier.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

/// Rendered in place of the correlation identifier when none is set.
pub const NO_REQUEST_ID: &str = "no-request-id";

/// Length of identifiers produced by [`RequestContext::generate`].
const GENERATED_ID_LEN: usize = 8;

thread_local! {
    static REQUEST_ID: RefCell<Option<Arc<str>>> = const { RefCell::new(None) };
}

/// Replaces the thread's identifier, returning the previous one.
///
/// Returns `None` without touching anything if the thread-local is already destroyed,
/// which only happens while the thread itself is exiting.
pub(crate) fn replace(id: Option<Arc<str>>) -> Option<Arc<str>> {
    REQUEST_ID
        .try_with(|slot| slot.replace(id))
        .unwrap_or(None)
}

pub(crate) fn current() -> Option<Arc<str>> {
    REQUEST_ID
        .try_with(|slot| slot.borrow().clone())
        .unwrap_or(None)
}

/// Accessors for the correlation identifier of the current unit of work.
///
/// This is a namespace; all state is thread-local. See the [module docs](crate::context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RequestContext;

impl RequestContext {
    /// Installs `id` for the current unit of work, replacing any previous value.
    pub fn set(id: impl Into<String>) {
        let id: String = id.into();
        replace(Some(Arc::from(id)));
    }

    /// The current identifier, or `None` when nothing has been set.
    pub fn get() -> Option<String> {
        current().map(|id| id.to_string())
    }

    /// Removes the identifier.
    pub fn clear() {
        replace(None);
    }

    /// The current identifier, or [`NO_REQUEST_ID`].
    pub fn current_or_placeholder() -> String {
        Self::get().unwrap_or_else(|| NO_REQUEST_ID.to_string())
    }

    /// Installs `id` until the returned guard drops, then restores the previous value.
    ///
    /// The guard is tied to the thread that created it and cannot be sent elsewhere.
    #[must_use = "the identifier is removed again as soon as the guard drops"]
    pub fn scope(id: impl Into<String>) -> ContextGuard {
        let id: String = id.into();
        ContextGuard {
            previous: replace(Some(Arc::from(id))),
            _not_send: PhantomData,
        }
    }

    /// Runs `f` with `id` installed, restoring the previous value afterwards.
    pub fn in_scope<R>(id: impl Into<String>, f: impl FnOnce() -> R) -> R {
        let _guard = Self::scope(id);
        f()
    }

    /// A fresh short identifier.
    pub fn generate() -> String {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(GENERATED_ID_LEN);
        id
    }
}

/// Restores the previous correlation identifier on drop.
///
/// Created by [`RequestContext::scope`].
#[derive(Debug)]
pub struct ContextGuard {
    previous: Option<Arc<str>>,
    // restoring on another thread would clobber that thread's identifier
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        replace(self.previous.take());
    }
}

/// Sets the correlation identifier, generating one when `id` is `None`. Returns the
/// identifier now in effect.
pub fn set_request_id(id: Option<&str>) -> String {
    let id = match id {
        Some(id) => id.to_string(),
        None => RequestContext::generate(),
    };
    RequestContext::set(id.clone());
    id
}

pub fn get_request_id() -> Option<String> {
    RequestContext::get()
}

pub fn clear_request_id() {
    RequestContext::clear()
}
