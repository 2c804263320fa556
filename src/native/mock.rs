// ABOUTME: Scriptable mock backend for tests without a sound server
// ABOUTME: Records every native call and holds completions until the test fires them

use super::{Completion, PropList, SoundBackend};
use crate::attributes::Attributes;
use crate::error::SUCCESS;
use parking_lot::Mutex;
use std::sync::Arc;

/// A play request seen by the [`MockBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPlay {
    /// Handle the request was submitted under
    pub handle: u32,
    /// Properties as the backend received them
    pub props: Attributes,
    /// Whether a completion was supplied
    pub with_completion: bool,
}

#[derive(Default)]
struct MockState {
    open_status: i32,
    driver_status: i32,
    props_status: i32,
    play_status: i32,
    cache_status: i32,
    /// Fire the completion with this status inside `play`
    complete_during_play: Option<i32>,
    /// Keep completions of rejected requests instead of dropping them
    hold_on_failure: bool,
    opens: usize,
    drivers: Vec<String>,
    changed_props: Vec<Attributes>,
    plays: Vec<RecordedPlay>,
    cancels: Vec<u32>,
    caches: Vec<Attributes>,
    pending: Vec<Completion>,
    dropped: bool,
}

/// A [`SoundBackend`] that plays nothing and records everything
///
/// Statuses returned by each call are scripted through the paired
/// [`MockController`], which stays usable after the backend has been moved
/// into a [`Context`](crate::Context).
///
/// # Example
///
/// ```
/// use gsound::native::MockBackend;
/// use gsound::{attr, Attributes, Context, ErrorCode};
///
/// let (backend, mock) = MockBackend::new();
/// let ctx = Context::builder().backend(backend).build().unwrap();
///
/// mock.set_play_status(ErrorCode::NotSupported.code());
/// let err = ctx
///     .play_simple(&Attributes::from([(attr::MEDIA_FILENAME, "/x.ogg")]), None)
///     .unwrap_err();
/// assert_eq!(err.code(), ErrorCode::NotSupported);
/// assert_eq!(mock.plays().len(), 1);
/// ```
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

/// Test-side handle for scripting and inspecting a [`MockBackend`]
#[derive(Clone)]
pub struct MockController {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a backend that succeeds at everything, plus its controller
    pub fn new() -> (Self, MockController) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockController { state },
        )
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        let pending = {
            let mut state = self.state.lock();
            state.dropped = true;
            std::mem::take(&mut state.pending)
        };
        // Unfired completions resolve their operations as destroyed
        drop(pending);
    }
}

impl SoundBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn open(&mut self) -> i32 {
        let mut state = self.state.lock();
        state.opens += 1;
        state.open_status
    }

    fn set_driver(&mut self, driver: &str) -> i32 {
        let mut state = self.state.lock();
        state.drivers.push(driver.to_string());
        state.driver_status
    }

    fn change_props(&mut self, props: &PropList) -> i32 {
        let mut state = self.state.lock();
        state.changed_props.push(props.to_attributes());
        state.props_status
    }

    fn play(&mut self, handle: u32, props: &PropList, completion: Option<Completion>) -> i32 {
        let (status, fire_now, hold_on_failure) = {
            let mut state = self.state.lock();
            state.plays.push(RecordedPlay {
                handle,
                props: props.to_attributes(),
                with_completion: completion.is_some(),
            });
            (
                state.play_status,
                state.complete_during_play,
                state.hold_on_failure,
            )
        };

        if let Some(completion) = completion {
            match fire_now {
                Some(fire) => completion.complete(fire),
                None if status == SUCCESS || hold_on_failure => {
                    self.state.lock().pending.push(completion)
                }
                None => drop(completion),
            }
        }
        status
    }

    fn cancel(&mut self, handle: u32) -> i32 {
        self.state.lock().cancels.push(handle);
        SUCCESS
    }

    fn cache(&mut self, props: &PropList) -> i32 {
        let mut state = self.state.lock();
        state.caches.push(props.to_attributes());
        state.cache_status
    }
}

impl MockController {
    /// Status returned by `open`
    pub fn set_open_status(&self, status: i32) {
        self.state.lock().open_status = status;
    }

    /// Status returned by `set_driver`
    pub fn set_driver_status(&self, status: i32) {
        self.state.lock().driver_status = status;
    }

    /// Status returned by `change_props`
    pub fn set_props_status(&self, status: i32) {
        self.state.lock().props_status = status;
    }

    /// Status returned by `play`
    pub fn set_play_status(&self, status: i32) {
        self.state.lock().play_status = status;
    }

    /// Status returned by `cache`
    pub fn set_cache_status(&self, status: i32) {
        self.state.lock().cache_status = status;
    }

    /// Fire each completion with `status` from inside `play`, before `play`
    /// returns, regardless of the status `play` itself returns
    pub fn complete_during_play(&self, status: Option<i32>) {
        self.state.lock().complete_during_play = status;
    }

    /// Hold completions of rejected requests so a test can fire them after
    /// `play` has returned its failure
    pub fn hold_on_failure(&self, hold: bool) {
        self.state.lock().hold_on_failure = hold;
    }

    /// Fire the oldest held completion. Returns false if none is pending.
    pub fn complete_next(&self, status: i32) -> bool {
        let completion = {
            let mut state = self.state.lock();
            if state.pending.is_empty() {
                None
            } else {
                Some(state.pending.remove(0))
            }
        };
        match completion {
            Some(completion) => {
                completion.complete(status);
                true
            }
            None => false,
        }
    }

    /// Fire every held completion submitted under `handle`
    pub fn complete_handle(&self, handle: u32, status: i32) -> usize {
        let matching: Vec<Completion> = {
            let mut state = self.state.lock();
            let (matching, rest): (Vec<Completion>, Vec<Completion>) =
                std::mem::take(&mut state.pending)
                    .into_iter()
                    .partition(|c| c.handle() == handle);
            state.pending = rest;
            matching
        };
        let count = matching.len();
        for completion in matching {
            completion.complete(status);
        }
        count
    }

    /// Number of completions still held
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Number of `open` calls
    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }

    /// Drivers passed to `set_driver`
    pub fn drivers(&self) -> Vec<String> {
        self.state.lock().drivers.clone()
    }

    /// Property lists passed to `change_props`
    pub fn changed_props(&self) -> Vec<Attributes> {
        self.state.lock().changed_props.clone()
    }

    /// Play requests, in submission order
    pub fn plays(&self) -> Vec<RecordedPlay> {
        self.state.lock().plays.clone()
    }

    /// Handles passed to `cancel`, in call order
    pub fn cancels(&self) -> Vec<u32> {
        self.state.lock().cancels.clone()
    }

    /// Property lists passed to `cache`
    pub fn caches(&self) -> Vec<Attributes> {
        self.state.lock().caches.clone()
    }

    /// Whether the backend has been released
    pub fn is_dropped(&self) -> bool {
        self.state.lock().dropped
    }
}
