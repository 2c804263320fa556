// ABOUTME: Sound context wrapping one native sound-client connection
// ABOUTME: Play, cache and attribute operations with cancellation and async completion

mod config;
mod listeners;
mod operation;

pub use config::ContextConfig;
pub use operation::{Completion, OperationState, PlayOperation};

use crate::application;
use crate::attr;
use crate::attributes::Attributes;
use crate::cancellable::{handle_for, Cancellable};
use crate::error::{Error, ErrorCode, SUCCESS};
use crate::native::{self, PropList, SoundBackend};
use crate::Result;
use listeners::CancelRegistry;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct ContextInner {
    id: u64,
    config: ContextConfig,
    initialized: AtomicBool,
    backend: Mutex<Box<dyn SoundBackend>>,
    listeners: CancelRegistry,
}

impl ContextInner {
    fn lock_backend(&self) -> Result<MutexGuard<'_, Box<dyn SoundBackend>>> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(Error::with_message(
                ErrorCode::State,
                "context used before init()",
            ));
        }
        Ok(self.backend.lock())
    }

    /// Called by a cancellation listener
    pub(crate) fn forward_cancel(&self, handle: u32) {
        self.listeners.fired(handle);
        let status = self.backend.lock().cancel(handle);
        if status == SUCCESS {
            log::debug!("Cancelled playback handle {}", handle);
        } else {
            log::warn!("Cancelling playback handle {} failed with status {}", handle, status);
        }
    }
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        self.listeners.detach_all();
        log::debug!(
            "Context {} released ({} backend)",
            self.id,
            self.backend.get_mut().name()
        );
    }
}

/// A connection to the sound server
///
/// The typical use pattern is:
///
/// 1. Create and initialize a context with [`Context::new`] or
///    [`Context::builder`]
/// 2. Optionally set context-wide attributes with
///    [`set_attributes`](Self::set_attributes)
/// 3. Optionally cache frequently used sounds with [`cache`](Self::cache)
/// 4. Play sounds with [`play_simple`](Self::play_simple) or
///    [`play_full`](Self::play_full)
/// 5. Drop the context to close the connection
///
/// `play_simple` is fire-and-forget: it reports errors detected while
/// submitting the request, and nothing after. `play_full` returns a
/// [`PlayOperation`] that resolves exactly once when the sound server has
/// finished, including errors raised during playback.
///
/// Cloning a context shares the same connection. Native calls are
/// serialized by an internal lock.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Create and initialize a context with the default configuration
    pub fn new(cancellable: Option<&Cancellable>) -> Result<Self> {
        let context = Self::builder().build_uninit()?;
        context.init(cancellable)?;
        Ok(context)
    }

    /// Start building a context
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    fn from_parts(config: ContextConfig, backend: Box<dyn SoundBackend>) -> Self {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("Context {} created with {} backend", id, backend.name());
        Self {
            inner: Arc::new(ContextInner {
                id,
                config,
                initialized: AtomicBool::new(false),
                backend: Mutex::new(backend),
                listeners: CancelRegistry::default(),
            }),
        }
    }

    /// Open the connection to the sound server
    ///
    /// Selects the configured driver, applies the configured attributes,
    /// opens the backend, then reports `application.name` and
    /// `application.id` when they are known. Failing to set those two is
    /// not an error. Calling `init` on an initialized context does nothing.
    pub fn init(&self, cancellable: Option<&Cancellable>) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        if cancellable.is_some_and(Cancellable::is_cancelled) {
            return Err(Error::new(ErrorCode::Canceled));
        }

        let config = &self.inner.config;
        let mut backend = self.inner.backend.lock();
        if self.is_initialized() {
            return Ok(());
        }

        if let Some(driver) = &config.driver {
            Error::check(backend.set_driver(driver))?;
        }
        if !config.attributes.is_empty() {
            let props = PropList::from_attributes(&config.attributes)?;
            Error::check(backend.change_props(&props))?;
        }
        Error::check(backend.open())?;

        let mut identity = PropList::new();
        if let Some(name) = config
            .application_name
            .clone()
            .or_else(application::application_name)
        {
            identity.sets(attr::APPLICATION_NAME, &name);
        }
        if let Some(id) = config
            .application_id
            .clone()
            .or_else(|| application::default_application().map(|app| app.id))
        {
            identity.sets(attr::APPLICATION_ID, &id);
        }
        if !identity.is_empty() {
            let status = backend.change_props(&identity);
            if status != SUCCESS {
                log::debug!("Ignoring status {} while setting application identity", status);
            }
        }

        self.inner.initialized.store(true, Ordering::Release);
        log::debug!("Context {} initialized", self.inner.id);
        Ok(())
    }

    /// Whether [`init`](Self::init) has succeeded
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    /// Select the native driver, for example "pulse", "alsa" or "null"
    ///
    /// Most drivers only accept this before the connection is opened; prefer
    /// [`ContextConfig::driver`]. A success here does not guarantee the
    /// driver is available.
    pub fn set_driver(&self, driver: &str) -> Result<()> {
        Error::check(self.inner.backend.lock().set_driver(driver))
    }

    /// Set or change context-wide attributes
    ///
    /// They apply to every later request unless the request overrides them.
    pub fn set_attributes(&self, attrs: &Attributes) -> Result<()> {
        let props = PropList::from_attributes(attrs)?;
        let status = self.inner.lock_backend()?.change_props(&props);
        Error::check(status)
    }

    /// Fire-and-forget playback
    ///
    /// Returns as soon as the request is submitted. Errors raised after
    /// submission are never reported. Cancelling `cancellable` later stops
    /// the sound.
    pub fn play_simple(
        &self,
        attrs: &Attributes,
        cancellable: Option<&Cancellable>,
    ) -> Result<()> {
        let handle = handle_for(cancellable);
        let props = PropList::from_attributes(attrs)?;
        let status = self.inner.lock_backend()?.play(handle, &props, None);
        drop(props);

        Error::check(status)?;
        log::debug!("Submitted playback handle {}", handle);
        if let Some(cancellable) = cancellable {
            self.inner.listeners.watch(&self.inner, cancellable);
        }
        Ok(())
    }

    /// Play a sound and get notified when it has finished
    ///
    /// The returned operation resolves exactly once: `Ok(())` when playback
    /// completes, or the error from submission or playback. Cancelling
    /// `cancellable` asks the sound server to stop, and the operation then
    /// resolves with [`ErrorCode::Canceled`].
    ///
    /// ```no_run
    /// # async fn demo() -> gsound::Result<()> {
    /// use gsound::{attr, Attributes, Context};
    ///
    /// let ctx = Context::new(None)?;
    /// ctx.play_full(&Attributes::from([(attr::EVENT_ID, "complete")]), None)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn play_full(
        &self,
        attrs: &Attributes,
        cancellable: Option<&Cancellable>,
    ) -> PlayOperation {
        let handle = handle_for(cancellable);
        let operation = PlayOperation::new(self.inner.id, handle);

        let props = match PropList::from_attributes(attrs) {
            Ok(props) => props,
            Err(code) => {
                operation.fail_early(code.into());
                return operation;
            }
        };
        let mut backend = match self.inner.lock_backend() {
            Ok(backend) => backend,
            Err(err) => {
                operation.fail_early(err);
                return operation;
            }
        };

        operation.begin_submit();
        let status = backend.play(handle, &props, Some(operation.completion()));
        drop(backend);
        drop(props);

        let submitted = Error::check(status);
        let accepted = submitted.is_ok();
        operation.end_submit(submitted);

        if accepted {
            log::debug!("Submitted playback handle {} with completion", handle);
            if let Some(cancellable) = cancellable {
                self.inner.listeners.watch(&self.inner, cancellable);
            }
        }
        operation
    }

    /// Retrieve the outcome of a resolved [`PlayOperation`]
    ///
    /// Check [`PlayOperation::is_ready`] first. A result produced while
    /// `play_full` was still running (a rejected submission, invalid
    /// attributes, or a completion fired inline) only becomes ready after the
    /// operation has been polled once, so callers that never await must poll
    /// it once before finishing it.
    ///
    /// # Panics
    ///
    /// If `operation` was not started by this context, if it is not ready,
    /// or if its result was already taken by awaiting it.
    pub fn play_full_finish(&self, operation: PlayOperation) -> Result<()> {
        assert_eq!(
            operation.context_id(),
            self.inner.id,
            "PlayOperation was not started by this context"
        );
        operation.take_result()
    }

    /// Ask the sound server to cache a sample
    ///
    /// Uses `canberra.cache-control = "permanent"` unless `attrs` sets it.
    pub fn cache(&self, attrs: &Attributes) -> Result<()> {
        let mut attrs = attrs.clone();
        attrs.insert_default(attr::CANBERRA_CACHE_CONTROL, attr::cache_control::PERMANENT);
        let props = PropList::from_attributes(&attrs)?;
        let status = self.inner.lock_backend()?.cache(&props);
        Error::check(status)
    }

    /// Number of cancellation tokens this context is listening to
    pub fn watched_cancellables(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Builder for [`Context`]
#[derive(Default)]
pub struct ContextBuilder {
    config: ContextConfig,
    backend: Option<Box<dyn SoundBackend>>,
}

impl ContextBuilder {
    /// Use this configuration
    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this backend instead of the one named in the configuration
    pub fn backend(mut self, backend: impl SoundBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Use this boxed backend instead of the one named in the configuration
    pub fn boxed_backend(mut self, backend: Box<dyn SoundBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Create the context without opening it; call [`Context::init`] next
    pub fn build_uninit(self) -> Result<Context> {
        let backend = match self.backend {
            Some(backend) => backend,
            None => native::open_backend(self.config.backend)?,
        };
        Ok(Context::from_parts(self.config, backend))
    }

    /// Create and initialize the context
    pub fn build(self) -> Result<Context> {
        let context = self.build_uninit()?;
        context.init(None)?;
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{MockBackend, NullBackend};

    #[test]
    fn test_init_is_idempotent() {
        let (backend, mock) = MockBackend::new();
        let ctx = Context::builder().backend(backend).build_uninit().unwrap();
        assert!(!ctx.is_initialized());

        ctx.init(None).unwrap();
        ctx.init(None).unwrap();
        assert!(ctx.is_initialized());
        assert_eq!(mock.opens(), 1);
    }

    #[test]
    fn test_init_failure_leaves_context_unusable() {
        let (backend, mock) = MockBackend::new();
        mock.set_open_status(ErrorCode::NoDriver.code());
        let ctx = Context::builder().backend(backend).build_uninit().unwrap();

        let err = ctx.init(None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoDriver);
        assert!(!ctx.is_initialized());

        let err = ctx
            .play_simple(&Attributes::from([(attr::EVENT_ID, "bell")]), None)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::State);
        assert!(mock.plays().is_empty());
    }

    #[test]
    fn test_init_sets_identity_and_ignores_failure() {
        let (backend, mock) = MockBackend::new();
        mock.set_props_status(ErrorCode::Invalid.code());
        let config = ContextConfig::new()
            .application_name("Bell")
            .application_id("org.example.Bell");
        let ctx = Context::builder()
            .config(config)
            .backend(backend)
            .build()
            .unwrap();

        assert!(ctx.is_initialized());
        let changed = mock.changed_props();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].get(attr::APPLICATION_NAME), Some("Bell"));
        assert_eq!(changed[0].get(attr::APPLICATION_ID), Some("org.example.Bell"));
    }

    #[test]
    fn test_init_applies_driver_and_attributes_before_open() {
        let (backend, mock) = MockBackend::new();
        let config = ContextConfig::new()
            .driver("pulse")
            .attribute(attr::CANBERRA_VOLUME, "-3.0");
        Context::builder()
            .config(config)
            .backend(backend)
            .build()
            .unwrap();

        assert_eq!(mock.drivers(), vec!["pulse".to_string()]);
        assert_eq!(
            mock.changed_props()[0].get(attr::CANBERRA_VOLUME),
            Some("-3.0")
        );
    }

    #[test]
    fn test_init_with_cancelled_token() {
        let (backend, mock) = MockBackend::new();
        let ctx = Context::builder().backend(backend).build_uninit().unwrap();
        let token = Cancellable::new();
        token.cancel();

        let err = ctx.init(Some(&token)).unwrap_err();
        assert!(err.is_canceled());
        assert_eq!(mock.opens(), 0);
    }

    #[test]
    fn test_cache_defaults_to_permanent() {
        let (backend, mock) = MockBackend::new();
        let ctx = Context::builder().backend(backend).build().unwrap();

        ctx.cache(&Attributes::from([(attr::EVENT_ID, "bell")])).unwrap();
        ctx.cache(&Attributes::from([
            (attr::EVENT_ID, "bell"),
            (attr::CANBERRA_CACHE_CONTROL, "volatile"),
        ]))
        .unwrap();

        let caches = mock.caches();
        assert_eq!(caches[0].get(attr::CANBERRA_CACHE_CONTROL), Some("permanent"));
        assert_eq!(caches[1].get(attr::CANBERRA_CACHE_CONTROL), Some("volatile"));
    }

    #[test]
    fn test_play_does_not_add_cache_control() {
        let (backend, mock) = MockBackend::new();
        let ctx = Context::builder().backend(backend).build().unwrap();

        ctx.play_simple(&Attributes::from([(attr::EVENT_ID, "bell")]), None)
            .unwrap();
        assert!(!mock.plays()[0].props.contains_key(attr::CANBERRA_CACHE_CONTROL));
    }

    #[test]
    fn test_invalid_attribute_never_reaches_backend() {
        let (backend, mock) = MockBackend::new();
        let ctx = Context::builder().backend(backend).build().unwrap();

        let err = ctx
            .play_simple(&Attributes::from([("bad key", "x")]), None)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Invalid);
        assert!(mock.plays().is_empty());
    }

    #[test]
    fn test_set_driver_after_open_with_null_backend() {
        let ctx = Context::builder()
            .backend(NullBackend::new())
            .build()
            .unwrap();
        let err = ctx.set_driver("alsa").unwrap_err();
        assert_eq!(err.code(), ErrorCode::State);
    }

    #[test]
    fn test_drop_releases_backend_once() {
        let (backend, mock) = MockBackend::new();
        let ctx = Context::builder().backend(backend).build().unwrap();
        let clone = ctx.clone();

        drop(ctx);
        assert!(!mock.is_dropped());
        drop(clone);
        assert!(mock.is_dropped());
    }
}
