// ABOUTME: Single-completion playback operation and its native-side resolver
// ABOUTME: Explicit state machine guarding against double resolution on submit failure

use crate::error::{Error, ErrorCode};
use crate::Result;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll, Waker};

/// Lifecycle of a [`PlayOperation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Created, not yet handed to the native client
    Created,
    /// The native play call is in progress
    Submitting,
    /// The native client accepted the request; the completion owns resolution
    Submitted,
    /// A result is stored and waiting to be taken
    Resolved,
    /// The result has been taken
    Finished,
}

struct Slot {
    state: OperationState,
    result: Option<Result<()>>,
    /// Status delivered by the completion while the submit call was running
    buffered: Option<i32>,
    /// Completion dropped unfired while the submit call was running
    abandoned: bool,
    /// Resolved before `play_full` returned to its caller
    inline: bool,
    /// An inline resolution has already yielded one scheduling turn
    yielded: bool,
    waker: Option<Waker>,
}

struct Shared {
    context_id: u64,
    handle: u32,
    slot: Mutex<Slot>,
}

impl Shared {
    /// Store `result` and return the waker to notify once the lock is released
    fn resolve(slot: &mut Slot, result: Result<()>, inline: bool) -> Option<Waker> {
        slot.result = Some(result);
        slot.state = OperationState::Resolved;
        slot.inline = inline;
        slot.waker.take()
    }

    fn complete(&self, status: i32) {
        let waker = {
            let mut slot = self.slot.lock();
            match slot.state {
                OperationState::Submitting => {
                    slot.buffered = Some(status);
                    None
                }
                OperationState::Submitted => {
                    log::debug!("Playback {} finished with status {}", self.handle, status);
                    Self::resolve(&mut slot, Error::check(status), false)
                }
                state => {
                    log::warn!(
                        "Ignoring completion (status {}) for playback {} in state {:?}",
                        status,
                        self.handle,
                        state
                    );
                    None
                }
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn abandon(&self) {
        let waker = {
            let mut slot = self.slot.lock();
            match slot.state {
                OperationState::Submitting => {
                    slot.abandoned = true;
                    None
                }
                OperationState::Submitted => {
                    log::debug!("Completion for playback {} dropped unfired", self.handle);
                    Self::resolve(&mut slot, Err(Error::new(ErrorCode::Destroyed)), false)
                }
                _ => None,
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// An in-flight `play_full` request
///
/// Resolves exactly once: with `Ok(())` when playback finished, or with the
/// translated error. Await it, or pass it to
/// [`Context::play_full_finish`](crate::Context::play_full_finish) once
/// [`is_ready`](Self::is_ready) reports true.
///
/// A result produced before `play_full` returned is never observed on the
/// first poll; the operation yields one turn first.
pub struct PlayOperation {
    shared: Arc<Shared>,
}

impl PlayOperation {
    pub(crate) fn new(context_id: u64, handle: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                context_id,
                handle,
                slot: Mutex::new(Slot {
                    state: OperationState::Created,
                    result: None,
                    buffered: None,
                    abandoned: false,
                    inline: false,
                    yielded: false,
                    waker: None,
                }),
            }),
        }
    }

    /// Resolver handed to the native client
    pub(crate) fn completion(&self) -> Completion {
        Completion {
            shared: Some(Arc::clone(&self.shared)),
        }
    }

    /// Mark the start of the native play call
    pub(crate) fn begin_submit(&self) {
        let mut slot = self.shared.slot.lock();
        debug_assert_eq!(slot.state, OperationState::Created);
        slot.state = OperationState::Submitting;
    }

    /// Record the native play call's synchronous result
    ///
    /// On success, registration is confirmed and the completion becomes the
    /// only source of resolution (a status it delivered during the call is
    /// applied now). On failure the returned error wins and any status the
    /// completion delivered is discarded.
    pub(crate) fn end_submit(&self, submitted: Result<()>) {
        let mut slot = self.shared.slot.lock();
        debug_assert_eq!(slot.state, OperationState::Submitting);
        let buffered = slot.buffered.take();
        match submitted {
            Ok(()) => {
                if let Some(status) = buffered {
                    Shared::resolve(&mut slot, Error::check(status), true);
                } else if slot.abandoned {
                    Shared::resolve(&mut slot, Err(Error::new(ErrorCode::Destroyed)), true);
                } else {
                    slot.state = OperationState::Submitted;
                }
            }
            Err(err) => {
                if let Some(status) = buffered {
                    log::warn!(
                        "Discarding completion (status {}) for rejected playback {}",
                        status,
                        self.shared.handle
                    );
                }
                Shared::resolve(&mut slot, Err(err), true);
            }
        }
    }

    /// Resolve with an error raised before anything reached the native client
    pub(crate) fn fail_early(&self, err: Error) {
        let mut slot = self.shared.slot.lock();
        debug_assert_eq!(slot.state, OperationState::Created);
        Shared::resolve(&mut slot, Err(err), true);
    }

    /// Playback handle the request was submitted with
    pub fn handle(&self) -> u32 {
        self.shared.handle
    }

    pub(crate) fn context_id(&self) -> u64 {
        self.shared.context_id
    }

    /// Current state
    pub fn state(&self) -> OperationState {
        self.shared.slot.lock().state
    }

    /// Whether a result can be taken now
    ///
    /// A result produced before `play_full` returned is ready only after the
    /// operation has been polled once.
    pub fn is_ready(&self) -> bool {
        let slot = self.shared.slot.lock();
        slot.state == OperationState::Resolved && (!slot.inline || slot.yielded)
    }

    /// Take the result. Panics if it is not ready or was already taken.
    pub(crate) fn take_result(&self) -> Result<()> {
        let mut slot = self.shared.slot.lock();
        match slot.state {
            OperationState::Resolved if !slot.inline || slot.yielded => {
                slot.state = OperationState::Finished;
                let handle = self.shared.handle;
                slot.result
                    .take()
                    .unwrap_or_else(|| panic!("resolved playback {} has no result", handle))
            }
            OperationState::Finished => {
                panic!("result of playback {} was already taken", self.shared.handle)
            }
            state => panic!(
                "playback {} finished before it resolved (state {:?})",
                self.shared.handle, state
            ),
        }
    }
}

impl Future for PlayOperation {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let mut slot = self.shared.slot.lock();
        match slot.state {
            OperationState::Resolved => {
                if slot.inline && !slot.yielded {
                    slot.yielded = true;
                    cx.waker().wake_by_ref();
                    return Poll::Pending;
                }
                slot.state = OperationState::Finished;
                match slot.result.take() {
                    Some(result) => Poll::Ready(result),
                    None => panic!("resolved playback {} has no result", self.shared.handle),
                }
            }
            OperationState::Finished => {
                panic!("PlayOperation for playback {} polled after completion", self.shared.handle)
            }
            _ => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl std::fmt::Debug for PlayOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayOperation")
            .field("handle", &self.shared.handle)
            .field("state", &self.state())
            .finish()
    }
}

/// One-shot resolver for a [`PlayOperation`], owned by the native client
///
/// Call [`complete`](Self::complete) exactly once with the final native
/// status. Dropping it unfired after the request was accepted resolves the
/// operation with [`ErrorCode::Destroyed`].
pub struct Completion {
    shared: Option<Arc<Shared>>,
}

impl Completion {
    /// Playback handle of the request this completion belongs to
    pub fn handle(&self) -> u32 {
        self.shared.as_ref().map_or(0, |s| s.handle)
    }

    /// Deliver the final native status
    pub fn complete(mut self, status: i32) {
        if let Some(shared) = self.shared.take() {
            shared.complete(status);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.abandon();
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("handle", &self.handle())
            .finish()
    }
}
