// ABOUTME: Well-known attribute names understood by the sound server
// ABOUTME: Pass-through keys plus the canberra.* control keys

/// A name describing the media being played, localized if possible
pub const MEDIA_NAME: &str = "media.name";
/// A (song) title describing the media being played
pub const MEDIA_TITLE: &str = "media.title";
/// The artist of this media
pub const MEDIA_ARTIST: &str = "media.artist";
/// The language this media is in, as a POSIX locale string such as "de_DE"
pub const MEDIA_LANGUAGE: &str = "media.language";
/// The file name this media was or can be loaded from
pub const MEDIA_FILENAME: &str = "media.filename";
/// An icon for this media in binary PNG format
pub const MEDIA_ICON: &str = "media.icon";
/// An icon name as defined in the XDG icon naming specification
pub const MEDIA_ICON_NAME: &str = "media.icon_name";
/// The role this media is played in: "event" for event sounds, otherwise
/// "music", "video", "game" and so on
pub const MEDIA_ROLE: &str = "media.role";

/// A textual id for an event sound, as mandated by the XDG sound naming
/// specification
pub const EVENT_ID: &str = "event.id";
/// A descriptive string for the sound event
pub const EVENT_DESCRIPTION: &str = "event.description";
/// Mouse X position on screen when the event was triggered by mouse input
pub const EVENT_MOUSE_X: &str = "event.mouse.x";
/// Mouse Y position on screen when the event was triggered by mouse input
pub const EVENT_MOUSE_Y: &str = "event.mouse.y";
/// Mouse X position as a fraction between 0 (left) and 1 (right)
pub const EVENT_MOUSE_HPOS: &str = "event.mouse.hpos";
/// Mouse Y position as a fraction between 0 (top) and 1 (bottom)
pub const EVENT_MOUSE_VPOS: &str = "event.mouse.vpos";
/// Number of the mouse button that triggered the event: 1 left, 2 middle, 3 right
pub const EVENT_MOUSE_BUTTON: &str = "event.mouse.button";

/// Human readable name of the window that triggered the event
pub const WINDOW_NAME: &str = "window.name";
/// Identification string for the window that triggered the event
pub const WINDOW_ID: &str = "window.id";
/// Binary PNG icon data for the window
pub const WINDOW_ICON: &str = "window.icon";
/// XDG icon name for the window
pub const WINDOW_ICON_NAME: &str = "window.icon_name";
/// X position of the window's top left corner
pub const WINDOW_X: &str = "window.x";
/// Y position of the window's top left corner
pub const WINDOW_Y: &str = "window.y";
/// Pixel width of the window
pub const WINDOW_WIDTH: &str = "window.width";
/// Pixel height of the window
pub const WINDOW_HEIGHT: &str = "window.height";
/// X position of the window center as a fraction between 0 and 1
pub const WINDOW_HPOS: &str = "window.hpos";
/// Y position of the window center as a fraction between 0 and 1
pub const WINDOW_VPOS: &str = "window.vpos";
/// Comma separated list of desktop indexes the window is visible on.
/// An empty string means all desktops.
pub const WINDOW_DESKTOP: &str = "window.desktop";
/// X11 display name of the window (e.g. ":0")
pub const WINDOW_X11_DISPLAY: &str = "window.x11.display";
/// X11 screen id of the window
pub const WINDOW_X11_SCREEN: &str = "window.x11.screen";
/// X11 monitor id of the window
pub const WINDOW_X11_MONITOR: &str = "window.x11.monitor";
/// X11 XID of the window
pub const WINDOW_X11_XID: &str = "window.x11.xid";

/// Human readable application name (e.g. "GNU Emacs")
pub const APPLICATION_NAME: &str = "application.name";
/// Application identifier (e.g. "org.gnu.emacs")
pub const APPLICATION_ID: &str = "application.id";
/// Application version (e.g. "22.2")
pub const APPLICATION_VERSION: &str = "application.version";
/// Binary PNG icon data for the application
pub const APPLICATION_ICON: &str = "application.icon";
/// XDG icon name for the application
pub const APPLICATION_ICON_NAME: &str = "application.icon_name";
/// Locale the application runs in, such as "de_DE@euro"
pub const APPLICATION_LANGUAGE: &str = "application.language";
/// Unix PID of the process triggering the event
pub const APPLICATION_PROCESS_ID: &str = "application.process.id";
/// Path to the binary of the process triggering the event
pub const APPLICATION_PROCESS_BINARY: &str = "application.process.binary";
/// User owning the process triggering the event
pub const APPLICATION_PROCESS_USER: &str = "application.process.user";
/// Host the process triggering the event runs on
pub const APPLICATION_PROCESS_HOST: &str = "application.process.host";

/// Controls server-side caching: one of "permanent", "volatile" or "never".
///
/// Defaults to "never" for play calls and to "permanent" for
/// [`Context::cache`](crate::Context::cache). Stripped before the
/// attributes reach the sound server.
pub const CANBERRA_CACHE_CONTROL: &str = "canberra.cache-control";
/// Decibel multiplier for playback volume; 0 dB is the default gain
pub const CANBERRA_VOLUME: &str = "canberra.volume";
/// XDG sound theme to resolve event ids against
pub const CANBERRA_XDG_THEME_NAME: &str = "canberra.xdg-theme.name";
/// XDG sound theme output profile
pub const CANBERRA_XDG_THEME_OUTPUT_PROFILE: &str = "canberra.xdg-theme.output-profile";
/// "0" disables all playback with [`ErrorCode::Disabled`](crate::ErrorCode::Disabled);
/// "1" or unset plays normally
pub const CANBERRA_ENABLE: &str = "canberra.enable";
/// Output channel to force, such as "front-left" or "lfe". Only honoured by
/// some backends.
pub const CANBERRA_FORCE_CHANNEL: &str = "canberra.force_channel";

/// Values accepted for [`CANBERRA_CACHE_CONTROL`]
pub mod cache_control {
    /// Cache the sample permanently
    pub const PERMANENT: &str = "permanent";
    /// Cache the sample until it expires or the cache is under pressure
    pub const VOLATILE: &str = "volatile";
    /// Never cache the sample
    pub const NEVER: &str = "never";
}
