// ABOUTME: In-process null sound driver
// ABOUTME: Accepts requests without producing audio, optionally simulating playback time

use super::{Completion, PropList, SoundBackend};
use crate::attr;
use crate::error::{ErrorCode, SUCCESS};
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DRIVER_NAME: &str = "null";

/// A backend that accepts requests and plays nothing
///
/// It applies the same checks as the native client's core: a sound needs an
/// `event.id` or `media.filename`, caching needs an `event.id`, and
/// `canberra.enable = "0"` disables playback. With a playback duration set,
/// each request finishes on a background thread after that duration unless
/// it is cancelled first.
pub struct NullBackend {
    driver: Option<String>,
    opened: bool,
    props: PropList,
    playback_duration: Duration,
    /// Cancel senders and finished flags for timed playbacks, by handle
    playing: HashMap<u32, Vec<(Sender<()>, Arc<AtomicBool>)>>,
}

impl NullBackend {
    /// Create a null backend whose playbacks finish immediately
    pub fn new() -> Self {
        Self {
            driver: None,
            opened: false,
            props: PropList::new(),
            playback_duration: Duration::ZERO,
            playing: HashMap::new(),
        }
    }

    /// Simulate playback lasting `duration`
    pub fn with_playback_duration(mut self, duration: Duration) -> Self {
        self.playback_duration = duration;
        self
    }

    fn ensure_open(&mut self) -> i32 {
        if self.opened {
            SUCCESS
        } else {
            self.open()
        }
    }

    fn is_disabled(&self, props: &PropList) -> bool {
        props
            .gets(attr::CANBERRA_ENABLE)
            .or_else(|| self.props.gets(attr::CANBERRA_ENABLE))
            .is_some_and(|v| v == "0")
    }

    fn lookup<'a>(&'a self, props: &'a PropList, key: &str) -> Option<&'a str> {
        props.gets(key).or_else(|| self.props.gets(key))
    }

    fn spawn_timed(&mut self, handle: u32, completion: Completion) {
        let (cancel_tx, cancel_rx) = channel::bounded::<()>(1);
        let finished = Arc::new(AtomicBool::new(false));
        self.playing
            .entry(handle)
            .or_default()
            .push((cancel_tx, Arc::clone(&finished)));

        let duration = self.playback_duration;
        std::thread::spawn(move || {
            let status = match cancel_rx.recv_timeout(duration) {
                Ok(()) => ErrorCode::Canceled.code(),
                Err(RecvTimeoutError::Timeout) => SUCCESS,
                Err(RecvTimeoutError::Disconnected) => ErrorCode::Destroyed.code(),
            };
            finished.store(true, Ordering::Release);
            completion.complete(status);
        });
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundBackend for NullBackend {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn open(&mut self) -> i32 {
        if self.opened {
            return ErrorCode::State.code();
        }
        if let Some(driver) = &self.driver {
            if driver != DRIVER_NAME {
                log::debug!("Null backend cannot provide driver '{}'", driver);
                return ErrorCode::NoDriver.code();
            }
        }
        self.opened = true;
        SUCCESS
    }

    fn set_driver(&mut self, driver: &str) -> i32 {
        if self.opened {
            return ErrorCode::State.code();
        }
        self.driver = Some(driver.to_string());
        SUCCESS
    }

    fn change_props(&mut self, props: &PropList) -> i32 {
        for (key, value) in props.iter() {
            let status = self.props.sets(key, value);
            if status != SUCCESS {
                return status;
            }
        }
        SUCCESS
    }

    fn play(&mut self, handle: u32, props: &PropList, completion: Option<Completion>) -> i32 {
        if self.lookup(props, attr::EVENT_ID).is_none()
            && self.lookup(props, attr::MEDIA_FILENAME).is_none()
        {
            return ErrorCode::Invalid.code();
        }
        if self.is_disabled(props) {
            return ErrorCode::Disabled.code();
        }
        let status = self.ensure_open();
        if status != SUCCESS {
            return status;
        }

        // Drop cancel senders for playbacks that already finished
        self.playing.retain(|_, senders| {
            senders.retain(|(_, finished)| !finished.load(Ordering::Acquire));
            !senders.is_empty()
        });

        if let Some(completion) = completion {
            if self.playback_duration.is_zero() {
                completion.complete(SUCCESS);
            } else {
                self.spawn_timed(handle, completion);
            }
        }
        SUCCESS
    }

    fn cancel(&mut self, handle: u32) -> i32 {
        if !self.opened {
            return ErrorCode::State.code();
        }
        if let Some(senders) = self.playing.remove(&handle) {
            for (tx, _) in senders {
                let _ = tx.try_send(());
            }
        }
        SUCCESS
    }

    fn cache(&mut self, props: &PropList) -> i32 {
        if self.lookup(props, attr::EVENT_ID).is_none() {
            return ErrorCode::Invalid.code();
        }
        self.ensure_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;

    fn props(pairs: &[&str]) -> PropList {
        PropList::from_attributes(&Attributes::from_pairs(pairs).unwrap()).unwrap()
    }

    #[test]
    fn test_play_requires_a_sound() {
        let mut backend = NullBackend::new();
        assert_eq!(
            backend.play(0, &props(&[attr::MEDIA_NAME, "x"]), None),
            ErrorCode::Invalid.code()
        );
        assert_eq!(backend.play(0, &props(&[attr::EVENT_ID, "bell"]), None), SUCCESS);
    }

    #[test]
    fn test_disabled() {
        let mut backend = NullBackend::new();
        backend.change_props(&props(&[attr::CANBERRA_ENABLE, "0"]));
        assert_eq!(
            backend.play(0, &props(&[attr::EVENT_ID, "bell"]), None),
            ErrorCode::Disabled.code()
        );
        assert_eq!(
            backend.play(0, &props(&[attr::EVENT_ID, "bell", attr::CANBERRA_ENABLE, "1"]), None),
            SUCCESS
        );
    }

    #[test]
    fn test_driver_selection() {
        let mut backend = NullBackend::new();
        assert_eq!(backend.set_driver("pulse"), SUCCESS);
        assert_eq!(backend.open(), ErrorCode::NoDriver.code());

        assert_eq!(backend.set_driver("null"), SUCCESS);
        assert_eq!(backend.open(), SUCCESS);
        assert_eq!(backend.set_driver("null"), ErrorCode::State.code());
        assert_eq!(backend.open(), ErrorCode::State.code());
    }

    #[test]
    fn test_cache_requires_event_id() {
        let mut backend = NullBackend::new();
        assert_eq!(
            backend.cache(&props(&[attr::MEDIA_FILENAME, "/x.ogg"])),
            ErrorCode::Invalid.code()
        );
        assert_eq!(backend.cache(&props(&[attr::EVENT_ID, "bell"])), SUCCESS);
    }
}
