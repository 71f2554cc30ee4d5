//! Aggregated results of one batch run

use chrono::{DateTime, Local};
use ferrobatch_types::{ErrorDetail, Task, TaskResult, TransferOutcome};
use std::fmt;
use uuid::Uuid;

/// Every task result of a run, in task-list order
///
/// Holds exactly one [`TaskResult`] per task handed to the orchestrator,
/// including tasks that failed before transferring anything.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FailureReport {
    /// Identifier of the run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Local>,
    /// When the run finished, `None` while still running
    pub finished_at: Option<DateTime<Local>>,
    /// Per-task results in task-list order
    pub results: Vec<TaskResult>,
}

impl FailureReport {
    /// Create an empty report
    pub fn new(run_id: Uuid, started_at: DateTime<Local>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: None,
            results: Vec::new(),
        }
    }

    /// Append the result of the next task
    pub fn push(&mut self, result: TaskResult) {
        self.results.push(result);
    }

    /// Mark the run finished
    pub fn finish(&mut self, finished_at: DateTime<Local>) {
        self.finished_at = Some(finished_at);
    }

    /// Number of task results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if no task was run
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Check if any task or file failed
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(TaskResult::has_failures)
    }

    /// Every failure in the run, task by task
    pub fn failures(&self) -> impl Iterator<Item = Failure<'_>> {
        self.results.iter().flat_map(|result| {
            let task_failure = result
                .task_level_error
                .as_ref()
                .map(|error| Failure::Task {
                    task: &result.task,
                    error,
                });
            let file_failures = result
                .failed_outcomes()
                .map(move |outcome| Failure::File {
                    task: &result.task,
                    outcome,
                });
            task_failure.into_iter().chain(file_failures)
        })
    }

    /// Totals over all tasks
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            tasks: self.results.len(),
            ..ReportSummary::default()
        };

        for result in &self.results {
            if result.task_level_error.is_some() {
                summary.failed_tasks += 1;
            }
            summary.files_found += result.files_found;
            summary.files_selected += result.files_selected;
            summary.files_transferred += result.succeeded_count() as u64;
            summary.files_failed += result.failed_count() as u64;
            summary.bytes_transferred += result.bytes_transferred();
        }

        summary
    }
}

/// One failure found in a report
#[derive(Debug, Clone, Copy)]
pub enum Failure<'a> {
    /// The task stopped before transferring anything
    Task {
        /// Task that failed
        task: &'a Task,
        /// What went wrong
        error: &'a ErrorDetail,
    },
    /// A single file could not be transferred
    File {
        /// Task the file belongs to
        task: &'a Task,
        /// The failed attempt
        outcome: &'a TransferOutcome,
    },
}

impl Failure<'_> {
    /// Task the failure belongs to
    pub fn task(&self) -> &Task {
        match self {
            Self::Task { task, .. } | Self::File { task, .. } => task,
        }
    }

    /// Error detail of the failure
    pub fn error(&self) -> Option<&ErrorDetail> {
        match self {
            Self::Task { error, .. } => Some(error),
            Self::File { outcome, .. } => outcome.error.as_ref(),
        }
    }
}

impl fmt::Display for Failure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error() {
            Some(error) => write!(f, "{}: {}", self.task().name, error),
            None => write!(f, "{}: unknown failure", self.task().name),
        }
    }
}

/// Totals over a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReportSummary {
    /// Tasks run
    pub tasks: usize,
    /// Tasks that failed before any transfer
    pub failed_tasks: usize,
    /// Name-matched files found
    pub files_found: u64,
    /// Files inside the age window
    pub files_selected: u64,
    /// Successful transfers
    pub files_transferred: u64,
    /// Failed transfers
    pub files_failed: u64,
    /// Bytes written by successful transfers
    pub bytes_transferred: u64,
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tasks={} failed_tasks={} found={} selected={} transferred={} failed={} bytes={}",
            self.tasks,
            self.failed_tasks,
            self.files_found,
            self.files_selected,
            self.files_transferred,
            self.files_failed,
            self.bytes_transferred
        )
    }
}
