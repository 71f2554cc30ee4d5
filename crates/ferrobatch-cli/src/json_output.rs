//! JSON output structures for ferrobatch reports

use chrono::{DateTime, Local};
use ferrobatch_engine::{FailureReport, ReportSummary};
use ferrobatch_types::{ErrorDetail, TaskResult, TaskState, TransferAction, TransferOutcome};
use serde::Serialize;
use std::path::PathBuf;

/// Complete JSON document for one run
#[derive(Debug, Serialize)]
pub struct ReportJson {
    /// Run metadata
    pub metadata: RunMetadata,
    /// Totals over the whole run
    pub summary: ReportSummary,
    /// Task entries, filtered to failures when requested
    pub tasks: Vec<TaskEntryJson>,
}

/// Run metadata
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    /// ferrobatch version
    pub version: String,
    /// Run identifier
    pub run_id: String,
    /// When the run started
    pub started_at: DateTime<Local>,
    /// When the run finished
    pub finished_at: Option<DateTime<Local>>,
    /// Whether only failing entries are listed
    pub failures_only: bool,
}

/// One task in the JSON report
#[derive(Debug, Serialize)]
pub struct TaskEntryJson {
    /// Task name
    pub name: String,
    /// Copy or move
    pub action: TransferAction,
    /// Folder that was scanned
    pub source_folder: PathBuf,
    /// Folder files were sent to
    pub destination_folder: PathBuf,
    /// Terminal state
    pub state: TaskState,
    /// Name-matched files found
    pub files_found: u64,
    /// Files inside the age window
    pub files_selected: u64,
    /// Error that stopped the task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    /// File entries, filtered to failures when requested
    pub files: Vec<FileEntryJson>,
}

/// One file in the JSON report
#[derive(Debug, Serialize)]
pub struct FileEntryJson {
    /// Source path
    pub source: PathBuf,
    /// Destination path
    pub destination: PathBuf,
    /// Whether the transfer completed
    pub succeeded: bool,
    /// Bytes written
    pub bytes: u64,
    /// Time spent in milliseconds
    pub duration_ms: u128,
    /// Failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl ReportJson {
    /// Build the document, keeping only failures when `failures_only` is set
    pub fn from_report(report: &FailureReport, failures_only: bool) -> Self {
        let tasks = report
            .results
            .iter()
            .filter(|result| !failures_only || result.has_failures())
            .map(|result| TaskEntryJson::from_result(result, failures_only))
            .collect();

        Self {
            metadata: RunMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                run_id: report.run_id.to_string(),
                started_at: report.started_at,
                finished_at: report.finished_at,
                failures_only,
            },
            summary: report.summary(),
            tasks,
        }
    }
}

impl TaskEntryJson {
    fn from_result(result: &TaskResult, failures_only: bool) -> Self {
        Self {
            name: result.task.name.clone(),
            action: result.task.action,
            source_folder: result.task.source_folder.clone(),
            destination_folder: result.task.destination_folder.clone(),
            state: result.state,
            files_found: result.files_found,
            files_selected: result.files_selected,
            error: result.task_level_error.clone(),
            files: result
                .outcomes
                .iter()
                .filter(|outcome| !failures_only || !outcome.succeeded)
                .map(FileEntryJson::from)
                .collect(),
        }
    }
}

impl From<&TransferOutcome> for FileEntryJson {
    fn from(outcome: &TransferOutcome) -> Self {
        Self {
            source: outcome.candidate.path.clone(),
            destination: outcome.destination.clone(),
            succeeded: outcome.succeeded,
            bytes: outcome.bytes_transferred,
            duration_ms: outcome.duration.as_millis(),
            error: outcome.error.clone(),
        }
    }
}
