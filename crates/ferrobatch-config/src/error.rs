//! Error types for configuration management

use ferrobatch_types::Error as FerrobatchError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One problem found while validating a task file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolation {
    /// Zero-based position of the offending task, `None` for file-level problems
    pub task_index: Option<usize>,
    /// Field the problem was found on
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl ConfigViolation {
    /// Violation on one task's field
    pub fn task<F: Into<String>, M: Into<String>>(task_index: usize, field: F, message: M) -> Self {
        Self {
            task_index: Some(task_index),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Violation on the file as a whole
    pub fn file<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            task_index: None,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.task_index {
            Some(index) => write!(f, "task {} `{}`: {}", index + 1, self.field, self.message),
            None => write!(f, "`{}`: {}", self.field, self.message),
        }
    }
}

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error when reading a configuration file
    #[error("I/O error reading config file '{path}': {source}")]
    Io {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Configuration file parsing error
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Path to the configuration file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Task file failed validation
    #[error("{} configuration violation(s): {}", violations.len(), join_violations(violations))]
    Invalid {
        /// Every problem found, in file order
        violations: Vec<ConfigViolation>,
    },

    /// Settings validation error
    #[error("Configuration validation failed: {message}")]
    Validation {
        /// Validation error message
        message: String,
    },

    /// Generic configuration error
    #[error("Configuration error: {message}")]
    Other {
        /// Error message
        message: String,
    },
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        Self::Other {
            message: error.to_string(),
        }
    }
}

impl From<ConfigError> for FerrobatchError {
    fn from(error: ConfigError) -> Self {
        FerrobatchError::config(error.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Violations carried by an [`ConfigError::Invalid`] error
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            Self::Invalid { violations } => violations,
            _ => &[],
        }
    }
}
