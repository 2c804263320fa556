// ABOUTME: Registry of cancellation listeners attached by a context
// ABOUTME: Listeners hold only a weak link back to the context; teardown detaches them

use super::ContextInner;
use crate::cancellable::{Cancellable, HandlerId, WeakCancellable};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

struct Listener {
    token: WeakCancellable,
    id: HandlerId,
}

/// One listener per token handle, per context
#[derive(Default)]
pub(crate) struct CancelRegistry {
    listeners: Mutex<HashMap<u32, Listener>>,
}

impl CancelRegistry {
    /// Forward a future cancellation of `cancellable` to the native client
    ///
    /// A token already watched by this context is not connected twice. A
    /// token that is already cancelled forwards immediately.
    pub(crate) fn watch(&self, context: &Arc<ContextInner>, cancellable: &Cancellable) {
        let handle = cancellable.handle();
        {
            let mut listeners = self.listeners.lock();
            listeners.retain(|_, l| l.token.upgrade().is_some_and(|t| !t.is_cancelled()));
            if listeners.contains_key(&handle) {
                return;
            }
        }

        let weak: Weak<ContextInner> = Arc::downgrade(context);
        let connected = cancellable.connect(move || {
            if let Some(context) = weak.upgrade() {
                context.forward_cancel(handle);
            }
        });

        if let Some(id) = connected {
            let mut listeners = self.listeners.lock();
            listeners.insert(
                handle,
                Listener {
                    token: cancellable.downgrade(),
                    id,
                },
            );
            // A cancel between connect and insert has already fired
            if cancellable.is_cancelled() {
                listeners.remove(&handle);
            }
        }
    }

    /// Forget the listener for `handle` once it has fired
    pub(crate) fn fired(&self, handle: u32) {
        self.listeners.lock().remove(&handle);
    }

    /// Disconnect every listener from its token
    pub(crate) fn detach_all(&self) {
        let listeners: Vec<Listener> = self.listeners.lock().drain().map(|(_, l)| l).collect();
        for listener in listeners {
            if let Some(token) = listener.token.upgrade() {
                token.disconnect(listener.id);
            }
        }
    }

    /// Number of attached listeners
    pub(crate) fn len(&self) -> usize {
        self.listeners.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr;
    use crate::attributes::Attributes;
    use crate::context::Context;
    use crate::native::MockBackend;

    #[test]
    fn test_cancelled_entry_does_not_block_later_watch() {
        let (backend, mock) = MockBackend::new();
        let ctx = Context::builder().backend(backend).build().unwrap();

        // Leave the entry a cancel racing with `watch` could leave behind
        let token = Cancellable::new();
        let id = token.connect(|| {}).unwrap();
        token.cancel();
        ctx.inner.listeners.listeners.lock().insert(
            token.handle(),
            Listener {
                token: token.downgrade(),
                id,
            },
        );

        ctx.play_simple(&Attributes::from([(attr::EVENT_ID, "bell")]), Some(&token))
            .unwrap();
        assert_eq!(mock.cancels(), vec![token.handle()]);
        assert_eq!(ctx.inner.listeners.len(), 0);
    }

    #[test]
    fn test_watch_after_cancel_keeps_no_entry() {
        let (backend, mock) = MockBackend::new();
        let ctx = Context::builder().backend(backend).build().unwrap();
        let token = Cancellable::new();

        ctx.play_simple(&Attributes::from([(attr::EVENT_ID, "bell")]), Some(&token))
            .unwrap();
        token.cancel();
        ctx.play_simple(&Attributes::from([(attr::EVENT_ID, "bell")]), Some(&token))
            .unwrap();

        assert_eq!(mock.cancels(), vec![token.handle(), token.handle()]);
        assert_eq!(ctx.inner.listeners.len(), 0);
    }
}
