//! Configuration management for ferrobatch
//!
//! Two kinds of configuration live here:
//!
//! - **Task files** ([`TaskFileLoader`]): the declarative list of transfer tasks.
//!   Every field of every task is checked and all problems are reported together
//!   as one [`ConfigError::Invalid`]; a task file that fails validation never
//!   reaches the engine.
//! - **Settings** ([`Settings`], [`SettingsBuilder`]): how the engine and its
//!   sinks behave, layered from defaults, an optional YAML/TOML/JSON file, and
//!   `FERROBATCH_*` environment variables.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferrobatch_config::{Settings, TaskFileLoader};
//!
//! let settings = Settings::load(Some("ferrobatch.yaml".as_ref()))
//!     .expect("Failed to load settings");
//! let tasks = TaskFileLoader::new()
//!     .load("tasks.json")
//!     .expect("Invalid task file");
//!
//! println!("{} tasks, up to {} at a time", tasks.len(), settings.execution.max_concurrent_tasks.get());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use ferrobatch_types::{AgeWindowPolicy, TaskConcurrency};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::SettingsBuilder;
pub use error::{ConfigError, ConfigResult, ConfigViolation};
pub use loader::{TaskFileFormat, TaskFileLoader};

/// Environment variable prefix for settings overrides
pub const ENV_PREFIX: &str = "FERROBATCH";

/// Engine and sink settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How tasks are executed
    pub execution: ExecutionSettings,
    /// Logging and report output
    pub logging: LoggingSettings,
    /// Operator notification
    pub notification: NotificationSettings,
}

impl Settings {
    /// Load settings from defaults, an optional file, and the environment
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = SettingsBuilder::new();
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "Settings file not found",
                    ),
                });
            }
            builder = builder.add_source_file(path);
        }
        builder.add_env_prefix(ENV_PREFIX).build()
    }
}

/// Execution settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Tasks allowed to run at the same time, 1 runs them in order one by one
    pub max_concurrent_tasks: TaskConcurrency,
    /// How `maxAgeDays` becomes a cutoff date
    pub age_policy: AgeWindowPolicy,
}

/// Format of the report written by the log sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
}

impl ReportFormat {
    /// File extension for reports in this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "log",
            Self::Json => "json",
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,
    /// Folder for log files and reports, no files are written when unset
    pub directory: Option<PathBuf>,
    /// Report format
    pub report_format: ReportFormat,
    /// Only write tasks and files that failed
    pub failures_only: bool,
    /// File name prefix for reports and logs
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            report_format: ReportFormat::Text,
            failures_only: true,
            file_prefix: "ferrobatch".to_string(),
        }
    }
}

/// When to alert an operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPolicy {
    /// After every run
    Always,
    /// Only when something failed
    #[default]
    OnFailure,
    /// Never
    Never,
}

impl NotificationPolicy {
    /// Decide whether a run with or without failures should be notified
    pub fn should_notify(self, has_failures: bool) -> bool {
        match self {
            Self::Always => true,
            Self::OnFailure => has_failures,
            Self::Never => false,
        }
    }
}

/// Notification settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// When to notify
    pub policy: NotificationPolicy,
}
