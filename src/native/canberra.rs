// ABOUTME: Binding to the system libcanberra
// ABOUTME: Forwards native calls and routes finish callbacks into Completions

use super::{Completion, PropList, SoundBackend};
use crate::error::{ErrorCode, SUCCESS};
use parking_lot::Mutex;
use std::ffi::{c_char, c_int, c_void, CString};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[repr(C)]
struct CaContext {
    _private: [u8; 0],
}

#[repr(C)]
struct CaProplist {
    _private: [u8; 0],
}

type FinishCallback =
    unsafe extern "C" fn(c: *mut CaContext, id: u32, error_code: c_int, userdata: *mut c_void);

#[link(name = "canberra")]
extern "C" {
    fn ca_context_create(c: *mut *mut CaContext) -> c_int;
    fn ca_context_destroy(c: *mut CaContext) -> c_int;
    fn ca_context_set_driver(c: *mut CaContext, driver: *const c_char) -> c_int;
    fn ca_context_open(c: *mut CaContext) -> c_int;
    fn ca_context_change_props_full(c: *mut CaContext, p: *mut CaProplist) -> c_int;
    fn ca_context_play_full(
        c: *mut CaContext,
        id: u32,
        p: *mut CaProplist,
        cb: Option<FinishCallback>,
        userdata: *mut c_void,
    ) -> c_int;
    fn ca_context_cancel(c: *mut CaContext, id: u32) -> c_int;
    fn ca_context_cache_full(c: *mut CaContext, p: *mut CaProplist) -> c_int;

    fn ca_proplist_create(p: *mut *mut CaProplist) -> c_int;
    fn ca_proplist_destroy(p: *mut CaProplist) -> c_int;
    fn ca_proplist_sets(p: *mut CaProplist, key: *const c_char, value: *const c_char) -> c_int;
}

/// Native proplist, destroyed on drop
struct NativeProplist(*mut CaProplist);

impl NativeProplist {
    fn from_props(props: &PropList) -> Result<Self, i32> {
        let mut raw = ptr::null_mut();
        // SAFETY: `raw` is a valid out-pointer
        let status = unsafe { ca_proplist_create(&mut raw) };
        if status != SUCCESS {
            return Err(status);
        }
        let list = NativeProplist(raw);

        for (key, value) in props.iter() {
            let key = CString::new(key).map_err(|_| ErrorCode::Invalid.code())?;
            let value = CString::new(value).map_err(|_| ErrorCode::Invalid.code())?;
            // SAFETY: list.0 is a live proplist; both strings outlive the call
            let status = unsafe { ca_proplist_sets(list.0, key.as_ptr(), value.as_ptr()) };
            if status != SUCCESS {
                return Err(status);
            }
        }
        Ok(list)
    }
}

impl Drop for NativeProplist {
    fn drop(&mut self) {
        // SAFETY: created by ca_proplist_create and destroyed exactly once
        unsafe {
            ca_proplist_destroy(self.0);
        }
    }
}

/// Shared between `play` and the finish callback
///
/// The native side holds one reference, passed as userdata. Whoever flips
/// `claimed` first owns the outcome: the trampoline fires the completion and
/// releases that reference, or a rejected `play` parks it on the backend.
struct CallbackSlot {
    claimed: AtomicBool,
    completion: Mutex<Option<Completion>>,
}

impl CallbackSlot {
    fn new(completion: Completion) -> Arc<Self> {
        Arc::new(Self {
            claimed: AtomicBool::new(false),
            completion: Mutex::new(Some(completion)),
        })
    }

    /// Hand a new reference to the native side
    fn to_userdata(slot: &Arc<Self>) -> *mut c_void {
        Arc::into_raw(Arc::clone(slot)) as *mut c_void
    }

    /// Claim the slot after the native client rejected the request
    ///
    /// Returns false if the callback already ran during the call.
    fn reject(&self) -> bool {
        if self.claimed.swap(true, Ordering::AcqRel) {
            return false;
        }
        drop(self.completion.lock().take());
        true
    }
}

extern "C" fn finish_trampoline(
    _c: *mut CaContext,
    _id: u32,
    error_code: c_int,
    userdata: *mut c_void,
) {
    let guarded = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        // SAFETY: userdata came from Arc::into_raw in `play`
        let slot = unsafe { &*(userdata as *const CallbackSlot) };
        if slot.claimed.swap(true, Ordering::AcqRel) {
            return;
        }
        let completion = slot.completion.lock().take();
        // SAFETY: this call owns the reference handed to the native side
        drop(unsafe { Arc::from_raw(userdata as *const CallbackSlot) });
        if let Some(completion) = completion {
            completion.complete(error_code);
        }
    }));
    if let Err(payload) = guarded {
        let msg = payload
            .downcast_ref::<&'static str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        log::error!("panic in libcanberra finish callback: {}", msg);
    }
}

/// [`SoundBackend`] backed by the system libcanberra
///
/// Available with the `canberra` cargo feature.
pub struct CanberraBackend {
    raw: *mut CaContext,
    create_status: i32,
    /// Native references of rejected requests, kept alive until the native
    /// context is destroyed in case its error path still calls back
    rejected: Vec<Arc<CallbackSlot>>,
}

// SAFETY: libcanberra contexts serialize access internally, and the bridge
// only calls into a backend while holding the context lock
unsafe impl Send for CanberraBackend {}

impl CanberraBackend {
    /// Create a native context. Failures are reported by the first call.
    pub fn new() -> Self {
        let mut raw = ptr::null_mut();
        // SAFETY: `raw` is a valid out-pointer
        let create_status = unsafe { ca_context_create(&mut raw) };
        if create_status != SUCCESS {
            log::warn!("ca_context_create failed with status {}", create_status);
            raw = ptr::null_mut();
        }
        Self {
            raw,
            create_status,
            rejected: Vec::new(),
        }
    }

    fn context(&self) -> Result<*mut CaContext, i32> {
        if self.raw.is_null() {
            Err(self.create_status)
        } else {
            Ok(self.raw)
        }
    }

    fn with_props(
        &self,
        props: &PropList,
        f: impl FnOnce(*mut CaContext, *mut CaProplist) -> i32,
    ) -> i32 {
        let context = match self.context() {
            Ok(context) => context,
            Err(status) => return status,
        };
        match NativeProplist::from_props(props) {
            Ok(list) => f(context, list.0),
            Err(status) => status,
        }
    }
}

impl Drop for CanberraBackend {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            // SAFETY: created by ca_context_create and destroyed exactly once
            unsafe {
                ca_context_destroy(self.raw);
            }
        }
        self.rejected.clear();
    }
}

impl SoundBackend for CanberraBackend {
    fn name(&self) -> &str {
        "canberra"
    }

    fn open(&mut self) -> i32 {
        match self.context() {
            // SAFETY: live context
            Ok(context) => unsafe { ca_context_open(context) },
            Err(status) => status,
        }
    }

    fn set_driver(&mut self, driver: &str) -> i32 {
        let context = match self.context() {
            Ok(context) => context,
            Err(status) => return status,
        };
        let Ok(driver) = CString::new(driver) else {
            return ErrorCode::Invalid.code();
        };
        // SAFETY: live context; driver outlives the call
        unsafe { ca_context_set_driver(context, driver.as_ptr()) }
    }

    fn change_props(&mut self, props: &PropList) -> i32 {
        // SAFETY: both pointers are live for the duration of the call
        self.with_props(props, |c, p| unsafe { ca_context_change_props_full(c, p) })
    }

    fn play(&mut self, handle: u32, props: &PropList, completion: Option<Completion>) -> i32 {
        let Some(completion) = completion else {
            // SAFETY: both pointers are live; no callback is registered
            return self.with_props(props, |c, p| unsafe {
                ca_context_play_full(c, handle, p, None, ptr::null_mut())
            });
        };

        let slot = CallbackSlot::new(completion);
        let userdata = CallbackSlot::to_userdata(&slot);

        // SAFETY: both pointers are live; userdata stays valid until the
        // trampoline releases it or it is parked below
        let status = self.with_props(props, |c, p| unsafe {
            ca_context_play_full(c, handle, p, Some(finish_trampoline as FinishCallback), userdata)
        });

        if status != SUCCESS && slot.reject() {
            // SAFETY: the trampoline has not run, so the native reference is
            // still outstanding. A late callback must find live memory.
            let native_ref = unsafe { Arc::from_raw(userdata as *const CallbackSlot) };
            self.rejected.push(native_ref);
        }
        status
    }

    fn cancel(&mut self, handle: u32) -> i32 {
        match self.context() {
            // SAFETY: live context
            Ok(context) => unsafe { ca_context_cancel(context, handle) },
            Err(status) => status,
        }
    }

    fn cache(&mut self, props: &PropList) -> i32 {
        // SAFETY: both pointers are live for the duration of the call
        self.with_props(props, |c, p| unsafe { ca_context_cache_full(c, p) })
    }
}
