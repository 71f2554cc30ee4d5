//! Runs one task through scanning, selection, and transfer

use crate::executor::TransferExecutor;
use crate::filter::FilterCriteria;
use crate::scanner::FileCatalogScanner;
use ferrobatch_types::{
    AgeWindowPolicy, Candidate, Clock, Error, ErrorDetail, NoopReporter, ProgressReporter, Result,
    SystemClock, Task, TaskResult, TaskState,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Drives a single task to a terminal [`TaskState`]
///
/// A task never returns an error: a failed scan ends it in
/// [`TaskState::Failed`] with a task-level error, and each failed transfer is
/// recorded in its outcome while the remaining files are still attempted.
#[derive(Clone)]
pub struct TaskRunner {
    scanner: FileCatalogScanner,
    executor: TransferExecutor,
    clock: Arc<dyn Clock>,
    age_policy: AgeWindowPolicy,
    reporter: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("scanner", &self.scanner)
            .field("executor", &self.executor)
            .field("age_policy", &self.age_policy)
            .finish_non_exhaustive()
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl TaskRunner {
    /// Create a runner reading the date from `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            scanner: FileCatalogScanner::new(),
            executor: TransferExecutor::new(),
            clock,
            age_policy: AgeWindowPolicy::default(),
            reporter: Arc::new(NoopReporter),
        }
    }

    /// Set how `max_age_days` becomes a cutoff date
    pub fn with_age_policy(mut self, age_policy: AgeWindowPolicy) -> Self {
        self.age_policy = age_policy;
        self
    }

    /// Replace the transfer executor
    pub fn with_executor(mut self, executor: TransferExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Set the reporter told about each transfer
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run a task to completion
    pub async fn run(&self, task: &Task) -> TaskResult {
        // one reading per task, shared by every candidate
        let started_at = self.clock.now();
        let criteria = FilterCriteria::for_task(task, self.age_policy, started_at);

        info!(task = %task.name, action = %task.action, "Running task {}", task);
        let mut state = TaskState::Scanning;

        let candidates = match self.scan(task).await {
            Ok(candidates) => candidates,
            Err(err) => {
                error!(task = %task.name, error = %err, "Task failed while scanning");
                self.transition(task, &mut state, TaskState::Failed);
                return TaskResult::failed(
                    task.clone(),
                    ErrorDetail::from(&err),
                    started_at,
                    self.clock.now(),
                );
            }
        };
        let files_found = candidates.len() as u64;

        self.transition(task, &mut state, TaskState::Selecting);
        let selected = criteria.select(candidates);
        let files_selected = selected.len() as u64;
        info!(
            task = %task.name,
            files_found,
            files_selected,
            cutoff = %criteria
                .window()
                .cutoff()
                .map_or_else(|| "none".to_string(), |date| date.to_string()),
            "Selected files"
        );

        self.transition(task, &mut state, state_after_selection(selected.len()));
        let mut outcomes = Vec::with_capacity(selected.len());
        for candidate in selected {
            let outcome = self
                .executor
                .transfer(
                    candidate,
                    &task.destination_folder,
                    task.action,
                    task.overwrite_existing,
                )
                .await;
            self.reporter.file_transferred(task, &outcome);
            outcomes.push(outcome);
        }

        if state == TaskState::Transferring {
            self.transition(task, &mut state, TaskState::Done);
        }
        info!(
            task = %task.name,
            transferred = outcomes.iter().filter(|o| o.succeeded).count(),
            failed = outcomes.iter().filter(|o| !o.succeeded).count(),
            "Task finished"
        );
        TaskResult {
            task: task.clone(),
            files_found,
            files_selected,
            outcomes,
            task_level_error: None,
            state,
            started_at,
            finished_at: self.clock.now(),
        }
    }

    async fn scan(&self, task: &Task) -> Result<Vec<Candidate>> {
        let scanner = self.scanner;
        let root = task.source_folder.clone();
        let recurse = task.recurse;
        let pattern = task.name_pattern.clone();

        tokio::task::spawn_blocking(move || scanner.scan(&root, recurse, &pattern))
            .await
            .map_err(|e| Error::scan(&task.source_folder, format!("scan did not complete: {}", e)))?
    }

    fn transition(&self, task: &Task, state: &mut TaskState, next: TaskState) {
        debug!(task = %task.name, "{:?} -> {:?}", state, next);
        *state = next;
    }
}

/// Nothing selected means nothing to transfer
fn state_after_selection(selected: usize) -> TaskState {
    if selected == 0 {
        TaskState::Done
    } else {
        TaskState::Transferring
    }
}
