//! Error types for the log harvester library.

use thiserror::Error;

/// The main error type for harvester operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors when reading the watched file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors from the notify crate.
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// The path resolved to something other than a regular file.
    #[error("Not a regular file: {path}")]
    NotRegularFile { path: String },

    /// The event sink has been closed or dropped.
    #[error("Stream closed")]
    StreamClosed,
}

impl Error {
    /// Returns true for errors that retrying can never fix.
    ///
    /// A supervisor seeing a fatal error should treat it as an operator
    /// mistake rather than starting a new harvester on the same path.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::NotRegularFile { .. })
    }
}

/// A convenient Result type for harvester operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_conversion() {
        let io_error = IoError::new(ErrorKind::PermissionDenied, "access denied");
        let error: Error = io_error.into();

        match error {
            Error::Io(_) => {}
            _ => panic!("Expected Error::Io variant"),
        }

        assert!(error.to_string().contains("I/O error"));
        assert!(error.to_string().contains("access denied"));
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_watcher_error_conversion() {
        let notify_error = notify::Error::generic("Test watcher error");
        let error: Error = notify_error.into();

        match error {
            Error::Watcher(_) => {}
            _ => panic!("Expected Error::Watcher variant"),
        }
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_not_regular_file_is_fatal() {
        let error = Error::NotRegularFile {
            path: "/var/log".to_string(),
        };

        assert!(error.is_fatal());
        assert_eq!(error.to_string(), "Not a regular file: /var/log");
    }

    #[test]
    fn test_stream_closed_display() {
        let error = Error::StreamClosed;
        assert_eq!(error.to_string(), "Stream closed");
        assert!(!error.is_fatal());
    }
}
