//! Error types and handling for ferrobatch
//!
//! Failures are split by how much of a run they take down. A configuration
//! problem stops the whole run, a scan problem stops one task, and a transfer
//! problem only fails the file it happened on. [`ErrorScope`] encodes that
//! split, and [`ErrorDetail`] is the form errors take once they are captured
//! as data inside outcomes and task results.

use crate::types::TransferAction;
use std::fmt;
use std::path::{Path, PathBuf};

/// Part of a batch run an error is fatal to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorScope {
    /// Only the file being transferred fails
    File,
    /// The task fails, other tasks keep running
    Task,
    /// Nothing runs
    Run,
}

/// Main error type for ferrobatch operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Source folder could not be enumerated
    #[error("Failed to scan '{path}': {message}")]
    Scan {
        /// Folder that was being scanned
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Destination file already exists and overwriting is disabled
    #[error("Destination already exists: {path}")]
    DestinationExists {
        /// Existing destination file
        path: PathBuf,
    },

    /// Source and destination resolve to the same file
    #[error("Source and destination are the same file: {path}")]
    SameFile {
        /// The shared path
        path: PathBuf,
    },

    /// File not found
    #[error("File not found: {path}: {message}")]
    NotFound {
        /// Path that was not found
        path: PathBuf,
        /// Operating system error text
        message: String,
    },

    /// Permission denied
    #[error("Permission denied: {path}: {message}")]
    PermissionDenied {
        /// Path with permission issues
        path: PathBuf,
        /// Operating system error text
        message: String,
    },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// Configuration errors
    Config,
    /// Source folder enumeration errors
    Scan,
    /// Destination exists and overwrite is off
    DestinationExists,
    /// Transfer onto itself
    SameFile,
    /// Missing file or folder
    NotFound,
    /// Permission errors
    PermissionDenied,
    /// Other I/O errors
    Io,
    /// Other errors
    Other,
}

impl ErrorKind {
    /// Scope an error of this kind is fatal to
    pub fn scope(self) -> ErrorScope {
        match self {
            Self::Config => ErrorScope::Run,
            Self::Scan => ErrorScope::Task,
            Self::DestinationExists
            | Self::SameFile
            | Self::NotFound
            | Self::PermissionDenied
            | Self::Io
            | Self::Other => ErrorScope::File,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Scan => "scan",
            Self::DestinationExists => "destination_exists",
            Self::SameFile => "same_file",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::Io => "io",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Scan { .. } => ErrorKind::Scan,
            Self::DestinationExists { .. } => ErrorKind::DestinationExists,
            Self::SameFile { .. } => ErrorKind::SameFile,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Io { .. } => ErrorKind::Io,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the scope this error is fatal to
    pub fn scope(&self) -> ErrorScope {
        self.kind().scope()
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new scan error
    pub fn scan<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Scan {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Classify an I/O error that happened on `path`
    pub fn from_io(error: &std::io::Error, path: &Path) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_path_buf(),
                message: error.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
                message: error.to_string(),
            },
            std::io::ErrorKind::AlreadyExists => Self::DestinationExists {
                path: path.to_path_buf(),
            },
            _ => Self::Io {
                message: format!("{}: {}", path.display(), error),
            },
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

/// An error captured as data, with enough context to reproduce it
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorDetail {
    /// Category of the failure
    pub kind: ErrorKind,
    /// Underlying message
    pub message: String,
    /// Source file or folder involved
    pub source_path: Option<PathBuf>,
    /// Destination file involved
    pub destination_path: Option<PathBuf>,
    /// Action that was attempted
    pub action: Option<TransferAction>,
}

impl ErrorDetail {
    /// Create a detail without path context
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source_path: None,
            destination_path: None,
            action: None,
        }
    }

    /// Attach the source path
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Attach the destination path
    pub fn with_destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination_path = Some(path.into());
        self
    }

    /// Attach the attempted action
    pub fn with_action(mut self, action: TransferAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Scope this failure is fatal to
    pub fn scope(&self) -> ErrorScope {
        self.kind.scope()
    }
}

impl From<&Error> for ErrorDetail {
    fn from(error: &Error) -> Self {
        let detail = Self::new(error.kind(), error.to_string());
        match error {
            Error::Scan { path, .. } => detail.with_source(path.clone()),
            Error::DestinationExists { path } | Error::SameFile { path } => {
                detail.with_destination(path.clone())
            }
            _ => detail,
        }
    }
}

impl From<Error> for ErrorDetail {
    fn from(error: Error) -> Self {
        Self::from(&error)
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;

        let mut context = Vec::new();
        if let Some(action) = self.action {
            context.push(format!("action={}", action));
        }
        if let Some(source) = &self.source_path {
            context.push(format!("source={}", source.display()));
        }
        if let Some(destination) = &self.destination_path {
            context.push(format!("destination={}", destination.display()));
        }
        if !context.is_empty() {
            write!(f, " ({})", context.join(" "))?;
        }
        Ok(())
    }
}
