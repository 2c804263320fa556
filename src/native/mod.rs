// ABOUTME: Native sound-client contract and its implementations
// ABOUTME: Null driver, scriptable mock, and the optional libcanberra binding

#[cfg(feature = "canberra")]
mod canberra;
mod mock;
mod null;
mod proplist;

#[cfg(feature = "canberra")]
pub use canberra::CanberraBackend;
pub use mock::{MockBackend, MockController, RecordedPlay};
pub use null::NullBackend;
pub use proplist::PropList;

pub use crate::context::Completion;

/// Operations a native sound client must provide
///
/// Every method returns a raw native status: [`SUCCESS`](crate::SUCCESS) or
/// one of the [`ErrorCode`](crate::ErrorCode) values. The bridge translates
/// statuses into [`Error`](crate::Error)s; backends never build errors
/// themselves.
///
/// A backend is owned by exactly one [`Context`](crate::Context) and is
/// released when that context is dropped.
pub trait SoundBackend: Send {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Open the connection to the sound server
    fn open(&mut self) -> i32;

    /// Select the driver to use. Usually only valid before [`open`](Self::open).
    fn set_driver(&mut self, driver: &str) -> i32;

    /// Merge `props` into the context-wide properties applied to every request
    fn change_props(&mut self, props: &PropList) -> i32;

    /// Submit a playback request under `handle`
    ///
    /// With a completion, the backend must call
    /// [`Completion::complete`] exactly once when playback ends, but only if
    /// this call returns success. If it returns a failure status the
    /// completion must not be fired; the bridge reports the returned status
    /// instead.
    fn play(&mut self, handle: u32, props: &PropList, completion: Option<Completion>) -> i32;

    /// Cancel every in-flight request submitted under `handle`
    fn cancel(&mut self, handle: u32) -> i32;

    /// Ask the sound server to cache a sample
    fn cache(&mut self, props: &PropList) -> i32;
}

/// Which backend to create with [`open_backend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process null driver
    #[default]
    Null,
    /// System libcanberra (requires the `canberra` feature)
    Canberra,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(BackendKind::Null),
            "canberra" => Ok(BackendKind::Canberra),
            other => Err(format!("unknown backend '{}' (expected null or canberra)", other)),
        }
    }
}

/// Create a boxed backend of the given kind
pub fn open_backend(kind: BackendKind) -> crate::Result<Box<dyn SoundBackend>> {
    match kind {
        BackendKind::Null => Ok(Box::new(NullBackend::new())),
        #[cfg(feature = "canberra")]
        BackendKind::Canberra => Ok(Box::new(CanberraBackend::new())),
        #[cfg(not(feature = "canberra"))]
        BackendKind::Canberra => Err(crate::Error::with_message(
            crate::ErrorCode::NoDriver,
            "gsound was built without the canberra feature",
        )),
    }
}
