// ABOUTME: Error types for gsound
// ABOUTME: Translates native sound-client status codes into structured errors

use std::fmt;
use std::path::PathBuf;

/// Status code the native client returns on success
pub const SUCCESS: i32 = 0;

/// Closed set of failure statuses reported by the native sound client
///
/// The discriminants are the raw integer codes used on the native side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// The operation is not supported by the driver
    NotSupported = -1,
    /// An argument was invalid
    Invalid = -2,
    /// The context was in the wrong state for this call
    State = -3,
    /// Memory allocation failed
    OutOfMemory = -4,
    /// No usable driver was found
    NoDriver = -5,
    /// A system call failed
    System = -6,
    /// A sound file or its data was corrupt
    Corrupt = -7,
    /// A sound file or its data was too large
    TooBig = -8,
    /// A sound file or its data could not be found
    NotFound = -9,
    /// The context was destroyed while the request was in flight
    Destroyed = -10,
    /// The request was canceled
    Canceled = -11,
    /// The requested resource is not available
    NotAvailable = -12,
    /// Access was denied
    Access = -13,
    /// An I/O error occurred
    Io = -14,
    /// Internal error in the native client
    Internal = -15,
    /// Sounds are disabled (`canberra.enable` is "0")
    Disabled = -16,
    /// The process forked after the context was created
    Forked = -17,
    /// The connection to the sound server was lost
    Disconnected = -18,
}

impl ErrorCode {
    /// Every code, in native order
    pub const ALL: [ErrorCode; 18] = [
        ErrorCode::NotSupported,
        ErrorCode::Invalid,
        ErrorCode::State,
        ErrorCode::OutOfMemory,
        ErrorCode::NoDriver,
        ErrorCode::System,
        ErrorCode::Corrupt,
        ErrorCode::TooBig,
        ErrorCode::NotFound,
        ErrorCode::Destroyed,
        ErrorCode::Canceled,
        ErrorCode::NotAvailable,
        ErrorCode::Access,
        ErrorCode::Io,
        ErrorCode::Internal,
        ErrorCode::Disabled,
        ErrorCode::Forked,
        ErrorCode::Disconnected,
    ];

    /// Look up a failure code. Returns `None` for success and for codes
    /// outside the enumeration.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Raw integer code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Message string the native client uses for this code
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::NotSupported => "Operation not supported",
            ErrorCode::Invalid => "Invalid argument",
            ErrorCode::State => "Invalid state",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::NoDriver => "No such driver",
            ErrorCode::System => "System error",
            ErrorCode::Corrupt => "File or data corrupt",
            ErrorCode::TooBig => "File or data too large",
            ErrorCode::NotFound => "File or data not found",
            ErrorCode::Destroyed => "Destroyed",
            ErrorCode::Canceled => "Canceled",
            ErrorCode::NotAvailable => "Not available",
            ErrorCode::Access => "Access forbidden",
            ErrorCode::Io => "IO error",
            ErrorCode::Internal => "Internal error",
            ErrorCode::Disabled => "Sound disabled",
            ErrorCode::Forked => "Process forked",
            ErrorCode::Disconnected => "Disconnected",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Structured error reported by every fallible gsound operation
///
/// Carries the native [`ErrorCode`], the error domain and the native
/// client's message for that code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    code: ErrorCode,
    message: String,
}

impl Error {
    /// Domain tag shared by all gsound errors
    pub const DOMAIN: &'static str = "gsound-error-quark";

    /// Create an error for `code` with the native message
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.message().to_string(),
        }
    }

    /// Create an error with a caller-supplied message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Translate a raw native status into `Ok(())` or a structured error
    ///
    /// Codes outside the known enumeration are reported as
    /// [`ErrorCode::Internal`].
    pub fn check(status: i32) -> Result<(), Error> {
        if status == SUCCESS {
            return Ok(());
        }
        match ErrorCode::from_code(status) {
            Some(code) => Err(Error::new(code)),
            None => {
                log::warn!("Native client returned unknown status {}", status);
                Err(Error::with_message(
                    ErrorCode::Internal,
                    format!("Unknown error code {}", status),
                ))
            }
        }
    }

    /// The native error code
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error domain
    pub fn domain(&self) -> &'static str {
        Self::DOMAIN
    }

    /// Whether this error reports a canceled request
    pub fn is_canceled(&self) -> bool {
        self.code == ErrorCode::Canceled
    }
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        Error::new(code)
    }
}

/// Errors loading a [`ContextConfig`](crate::ContextConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("config error: {path}: {source}")]
    Io {
        /// Path to the file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration was not valid JSON for this schema
    #[error("invalid config: {0}")]
    Parse(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_is_ok() {
        assert!(Error::check(SUCCESS).is_ok());
    }

    #[test]
    fn test_every_code_round_trips() {
        for code in ErrorCode::ALL {
            let err = Error::check(code.code()).unwrap_err();
            assert_eq!(err.code(), code);
            assert_eq!(err.message(), code.message());
        }
    }

    #[test]
    fn test_codes_are_contiguous() {
        let raw: Vec<i32> = ErrorCode::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(raw, (-18..=-1).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_status_maps_to_internal() {
        let err = Error::check(-99).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Internal);
        assert!(err.message().contains("-99"));
        assert_eq!(ErrorCode::from_code(7), None);
    }

    #[test]
    fn test_error_display() {
        let err = Error::new(ErrorCode::NotSupported);
        assert_eq!(err.to_string(), "Operation not supported");
        assert_eq!(err.domain(), "gsound-error-quark");
    }
}
