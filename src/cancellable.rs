// ABOUTME: Caller-owned cancellation token
// ABOUTME: Signals once, runs connected handlers, and derives a stable playback handle

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Handle used for requests submitted without a cancellation token
pub const NO_CANCELLABLE_HANDLE: u32 = 0;

static NEXT_HANDLE: AtomicU32 = AtomicU32::new(1);

type Handler = Box<dyn FnOnce() + Send>;

/// Identifies a handler connected with [`Cancellable::connect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Inner {
    handle: u32,
    cancelled: AtomicBool,
    next_handler: AtomicU64,
    handlers: Mutex<Vec<(HandlerId, Handler)>>,
}

/// A cancellation token shared between the caller and in-flight requests
///
/// Clones share identity: every clone maps to the same playback handle, so
/// cancelling one cancels every sound submitted with any of them.
#[derive(Clone)]
pub struct Cancellable {
    inner: Arc<Inner>,
}

impl Cancellable {
    /// Create a new, uncancelled token
    pub fn new() -> Self {
        let mut handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        if handle == NO_CANCELLABLE_HANDLE {
            handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        }
        Self {
            inner: Arc::new(Inner {
                handle,
                cancelled: AtomicBool::new(false),
                next_handler: AtomicU64::new(1),
                handlers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Playback handle derived from this token's identity
    pub fn handle(&self) -> u32 {
        self.inner.handle
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Signal cancellation. Connected handlers run once, on the first call only.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let handlers = std::mem::take(&mut *self.inner.handlers.lock());
        log::debug!(
            "Cancellable {} cancelled, running {} handler(s)",
            self.inner.handle,
            handlers.len()
        );
        for (_, handler) in handlers {
            handler();
        }
    }

    /// Run `handler` when the token is cancelled
    ///
    /// If the token is already cancelled the handler runs immediately and
    /// `None` is returned.
    pub fn connect<F>(&self, handler: F) -> Option<HandlerId>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut handlers = self.inner.handlers.lock();
            if !self.is_cancelled() {
                let id = HandlerId(self.inner.next_handler.fetch_add(1, Ordering::Relaxed));
                handlers.push((id, Box::new(handler)));
                return Some(id);
            }
        }
        handler();
        None
    }

    /// Remove a handler that has not run yet. Returns whether it was found.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut handlers = self.inner.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(hid, _)| *hid != id);
        handlers.len() != before
    }

    pub(crate) fn downgrade(&self) -> WeakCancellable {
        WeakCancellable {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl Default for Cancellable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cancellable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cancellable")
            .field("handle", &self.inner.handle)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Non-owning reference to a [`Cancellable`]
#[derive(Clone)]
pub(crate) struct WeakCancellable {
    inner: Weak<Inner>,
}

impl WeakCancellable {
    pub(crate) fn upgrade(&self) -> Option<Cancellable> {
        self.inner.upgrade().map(|inner| Cancellable { inner })
    }
}

/// Handle for an optional token: the token's handle, or
/// [`NO_CANCELLABLE_HANDLE`] when there is none
pub fn handle_for(cancellable: Option<&Cancellable>) -> u32 {
    cancellable.map_or(NO_CANCELLABLE_HANDLE, Cancellable::handle)
}
