//! Error types for handles and the registry.

use std::io;
use std::path::PathBuf;

use crate::mode::Mode;

/// Errors raised by [`FileHandle`](crate::FileHandle) and
/// [`Registry`](crate::Registry) operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("File {location:?} does not exist")]
    NotFound { location: PathBuf },

    #[error("File {location:?} already exists")]
    AlreadyExists { location: PathBuf },

    #[error("File mode \"{mode}\" does not support {operation} on {location:?}")]
    UnsupportedOperation {
        operation: &'static str,
        mode: Mode,
        location: PathBuf,
    },

    #[error("Invalid identifier {found:?}: expected a {expected} identifier")]
    TypeMismatch {
        expected: IdentifierKind,
        found: String,
    },

    #[error("Expected {expected} {argument}, one per identifier, but got {found}")]
    LengthMismatch {
        argument: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("No file registered under identifier {identifier}")]
    UnknownIdentifier { identifier: String },

    #[error("A file is already registered under identifier {identifier}")]
    AlreadyRegistered { identifier: String },

    #[error("Invalid file mode {token:?}")]
    InvalidMode { token: String },

    #[error("Invalid content: {message}")]
    InvalidContent { message: String },

    #[error("Could not decode {location:?} as {encoding}: {message}")]
    Decode {
        location: PathBuf,
        encoding: crate::TextEncoding,
        message: String,
    },

    #[error("File handle for {location:?} is closed")]
    Closed { location: PathBuf },

    #[error("I/O error on {location:?}: {source}")]
    Io {
        location: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(location: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            location: location.into(),
            source,
        }
    }

    /// Whether the failure concerns a missing file or identifier.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::UnknownIdentifier { .. }
        )
    }
}

/// The declared shape of registry identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Numeric,
    Text,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierKind::Numeric => write!(f, "numeric"),
            IdentifierKind::Text => write!(f, "text"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn unsupported_operation_display() {
        let e = Error::UnsupportedOperation {
            operation: "write",
            mode: "r".parse().unwrap(),
            location: PathBuf::from("notes.txt"),
        };
        let display = e.to_string();
        assert!(display.contains("\"r\""));
        assert!(display.contains("write"));
        assert!(display.contains("notes.txt"));
    }

    #[test]
    fn length_mismatch_display() {
        let e = Error::LengthMismatch {
            argument: "modes",
            expected: 2,
            found: 1,
        };
        assert_eq!(
            e.to_string(),
            "Expected 2 modes, one per identifier, but got 1"
        );
    }

    #[test]
    fn type_mismatch_display() {
        let e = Error::TypeMismatch {
            expected: IdentifierKind::Numeric,
            found: "abc".to_string(),
        };
        assert!(e.to_string().contains("numeric"));
        assert!(e.to_string().contains("abc"));
    }

    #[test]
    fn io_error_source() {
        let e = Error::io("a.txt", io::Error::other("boom"));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn not_found_kinds() {
        assert!(Error::NotFound {
            location: PathBuf::from("x")
        }
        .is_not_found());
        assert!(Error::UnknownIdentifier {
            identifier: "1".to_string()
        }
        .is_not_found());
        assert!(!Error::AlreadyExists {
            location: PathBuf::from("x")
        }
        .is_not_found());
    }
}
