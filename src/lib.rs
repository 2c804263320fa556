// ABOUTME: Main library entry point for gsound
// ABOUTME: Exports the sound context, attributes, cancellation and error types

//! # gsound
//!
//! Play system sounds through a native sound-service client, with
//! cancellation tokens and single-completion async results.
//!
//! The native client (libcanberra, or the built-in null driver) does the real
//! work: talking to the sound server, resolving sound themes, mixing and
//! caching. This crate translates attribute maps into native property lists,
//! native status codes into structured [`Error`]s, and native finish
//! callbacks into [`PlayOperation`] futures.
//!
//! ## Features
//!
//! - **Context**: one connection to the sound server, see [`Context`]
//! - **Fire-and-forget**: [`Context::play_simple`] reports submission errors only
//! - **Await completion**: [`Context::play_full`] resolves exactly once when
//!   playback ends
//! - **Cancellation**: a [`Cancellable`] shared by several requests stops all
//!   of them
//!
//! ## Example
//!
//! ```no_run
//! use gsound::{attr, Attributes, Cancellable, Context};
//!
//! #[tokio::main]
//! async fn main() -> gsound::Result<()> {
//!     let ctx = Context::new(None)?;
//!     let attrs = Attributes::new()
//!         .with(attr::EVENT_ID, "message-new-instant")
//!         .with(attr::EVENT_DESCRIPTION, "New message");
//!
//!     let cancellable = Cancellable::new();
//!     ctx.play_full(&attrs, Some(&cancellable)).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Well-known attribute keys
pub mod attr;
mod application;
mod attributes;
mod cancellable;
/// Command-line support for the `gsound-play` binary
pub mod cli;
mod context;
/// Error types for gsound
pub mod error;
/// Native sound-client backends
pub mod native;

pub use application::{
    application_name, default_application, register_application, unregister_application,
    ApplicationInfo,
};
pub use attributes::Attributes;
pub use cancellable::{handle_for, Cancellable, HandlerId, NO_CANCELLABLE_HANDLE};
pub use context::{
    Completion, Context, ContextBuilder, ContextConfig, OperationState, PlayOperation,
};
pub use error::{ConfigError, Error, ErrorCode, SUCCESS};
pub use native::{BackendKind, SoundBackend};

/// Result type for gsound operations
pub type Result<T> = std::result::Result<T, error::Error>;
