// ABOUTME: Process-wide application identity
// ABOUTME: Seeds application.name and application.id on every new context

use parking_lot::RwLock;

/// Identity of the running application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
    /// Reverse-DNS application identifier (e.g. "org.gnome.Nautilus")
    pub id: String,
    /// Human readable name, if different from the executable name
    pub name: Option<String>,
}

static DEFAULT_APPLICATION: RwLock<Option<ApplicationInfo>> = parking_lot::const_rwlock(None);

/// Register the process's default application
///
/// Contexts initialized afterwards report this id (and name, if given) to
/// the sound server.
pub fn register_application(id: impl Into<String>, name: Option<String>) {
    let info = ApplicationInfo {
        id: id.into(),
        name,
    };
    log::debug!("Registered default application {}", info.id);
    *DEFAULT_APPLICATION.write() = Some(info);
}

/// Remove the registered default application
pub fn unregister_application() {
    DEFAULT_APPLICATION.write().take();
}

/// The registered default application, if any
pub fn default_application() -> Option<ApplicationInfo> {
    DEFAULT_APPLICATION.read().clone()
}

/// Display name for this process
///
/// The registered application's name when set, otherwise the executable's
/// file stem.
pub fn application_name() -> Option<String> {
    if let Some(name) = DEFAULT_APPLICATION.read().as_ref().and_then(|a| a.name.clone()) {
        return Some(name);
    }
    std::env::current_exe()
        .ok()?
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}
