//! Core data types for ferrobatch
//!
//! A [`Task`] is one declarative unit of work. Scanning a task's source folder
//! produces [`Candidate`]s, each transfer attempt produces a
//! [`TransferOutcome`], and a finished task is summarized in a [`TaskResult`].

use crate::error::{Error, ErrorDetail};
use crate::Result;
use chrono::{DateTime, Local, NaiveDate};
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// What to do with a selected file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TransferAction {
    /// Duplicate the file, leaving the source in place
    Copy,
    /// Relocate the file
    Move,
}

impl fmt::Display for TransferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => f.write_str("copy"),
            Self::Move => f.write_str("move"),
        }
    }
}

impl FromStr for TransferAction {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "move" => Ok(Self::Move),
            other => Err(Error::config(format!(
                "unsupported action '{}', expected 'copy' or 'move'",
                other
            ))),
        }
    }
}

/// Compiled file name pattern
///
/// Matching uses substring-search semantics: `Analyse_.*\.xlsx` matches
/// `Analyse_26032025.xlsx` and also `Old_Analyse_1.xlsx.bak`. Anchor the
/// pattern with `^...$` to require a whole-name match.
#[derive(Debug, Clone)]
pub struct NamePattern(Regex);

impl NamePattern {
    /// Compile a pattern. Empty patterns are rejected; use `.*` to match every name.
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::config(
                "name pattern must not be empty, use '.*' to match every file",
            ));
        }
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| Error::config(format!("invalid name pattern '{}': {}", pattern, e)))
    }

    /// Check a file name against the pattern
    pub fn is_match(&self, file_name: &str) -> bool {
        self.0.is_match(file_name)
    }

    /// The source text of the pattern
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for NamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for NamePattern {}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NamePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One validated unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Task {
    /// Display name used in logs and reports
    pub name: String,
    /// Copy or move
    pub action: TransferAction,
    /// Folder to scan
    pub source_folder: PathBuf,
    /// Descend into subfolders of the source folder
    pub recurse: bool,
    /// File name filter
    pub name_pattern: NamePattern,
    /// Folder every selected file lands in
    pub destination_folder: PathBuf,
    /// Replace files already present in the destination
    pub overwrite_existing: bool,
    /// Age window in calendar days, 0 disables it
    pub max_age_days: u32,
}

impl Task {
    /// Create a non-recursive task without age window or overwrite
    pub fn new<S, P1, P2>(
        name: S,
        action: TransferAction,
        source_folder: P1,
        name_pattern: NamePattern,
        destination_folder: P2,
    ) -> Self
    where
        S: Into<String>,
        P1: Into<PathBuf>,
        P2: Into<PathBuf>,
    {
        Self {
            name: name.into(),
            action,
            source_folder: source_folder.into(),
            recurse: false,
            name_pattern,
            destination_folder: destination_folder.into(),
            overwrite_existing: false,
            max_age_days: 0,
        }
    }

    /// Set recursive scanning
    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    /// Set the overwrite policy
    pub fn with_overwrite(mut self, overwrite_existing: bool) -> Self {
        self.overwrite_existing = overwrite_existing;
        self
    }

    /// Set the age window
    pub fn with_max_age_days(mut self, max_age_days: u32) -> Self {
        self.max_age_days = max_age_days;
        self
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} -> {})",
            self.name,
            self.action,
            self.source_folder.display(),
            self.destination_folder.display()
        )
    }
}

/// A file found by scanning, before age filtering
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Candidate {
    /// Full path of the file
    pub path: PathBuf,
    /// When the file was created
    pub creation_time: DateTime<Local>,
}

impl Candidate {
    /// Create a candidate
    pub fn new(path: impl Into<PathBuf>, creation_time: DateTime<Local>) -> Self {
        Self {
            path: path.into(),
            creation_time,
        }
    }

    /// Final path component, lossily converted
    pub fn file_name(&self) -> Option<Cow<'_, str>> {
        self.path.file_name().map(|name| name.to_string_lossy())
    }

    /// Local calendar date of creation
    pub fn creation_date(&self) -> NaiveDate {
        self.creation_time.date_naive()
    }

    /// Path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Record of one transfer attempt
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransferOutcome {
    /// File that was transferred
    pub candidate: Candidate,
    /// Where the file was going
    pub destination: PathBuf,
    /// Action attempted
    pub action: TransferAction,
    /// Whether the transfer completed
    pub succeeded: bool,
    /// Failure detail, present iff `succeeded` is false
    pub error: Option<ErrorDetail>,
    /// Bytes written to the destination
    pub bytes_transferred: u64,
    /// Time spent on the attempt
    pub duration: Duration,
}

impl TransferOutcome {
    /// A successful transfer
    pub fn success(
        candidate: Candidate,
        destination: PathBuf,
        action: TransferAction,
        bytes_transferred: u64,
        duration: Duration,
    ) -> Self {
        Self {
            candidate,
            destination,
            action,
            succeeded: true,
            error: None,
            bytes_transferred,
            duration,
        }
    }

    /// A failed transfer
    pub fn failure(
        candidate: Candidate,
        destination: PathBuf,
        action: TransferAction,
        error: ErrorDetail,
        duration: Duration,
    ) -> Self {
        Self {
            candidate,
            destination,
            action,
            succeeded: false,
            error: Some(error),
            bytes_transferred: 0,
            duration,
        }
    }
}

/// Where a task run ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TaskState {
    /// Enumerating the source folder
    Scanning,
    /// Applying name and age filters
    Selecting,
    /// Transferring selected files
    Transferring,
    /// Finished, possibly with per-file failures
    Done,
    /// Stopped before any file was attempted
    Failed,
}

impl TaskState {
    /// Check if the state is terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Everything that happened while running one task
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TaskResult {
    /// Task that was run
    pub task: Task,
    /// Files found under the source folder whose name matched
    pub files_found: u64,
    /// Files left after the age window
    pub files_selected: u64,
    /// One entry per attempted transfer
    pub outcomes: Vec<TransferOutcome>,
    /// Failure that stopped the task before any transfer
    pub task_level_error: Option<ErrorDetail>,
    /// Terminal state
    pub state: TaskState,
    /// When the task started
    pub started_at: DateTime<Local>,
    /// When the task finished
    pub finished_at: DateTime<Local>,
}

impl TaskResult {
    /// Result of a task that failed before transferring anything
    pub fn failed(
        task: Task,
        error: ErrorDetail,
        started_at: DateTime<Local>,
        finished_at: DateTime<Local>,
    ) -> Self {
        Self {
            task,
            files_found: 0,
            files_selected: 0,
            outcomes: Vec::new(),
            task_level_error: Some(error),
            state: TaskState::Failed,
            started_at,
            finished_at,
        }
    }

    /// Number of successful transfers
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    /// Number of failed transfers
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }

    /// Total bytes written by successful transfers
    pub fn bytes_transferred(&self) -> u64 {
        self.outcomes.iter().map(|o| o.bytes_transferred).sum()
    }

    /// Failed transfers only
    pub fn failed_outcomes(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded)
    }

    /// Check for a task-level error or any failed transfer
    pub fn has_failures(&self) -> bool {
        self.task_level_error.is_some() || self.outcomes.iter().any(|o| !o.succeeded)
    }
}
