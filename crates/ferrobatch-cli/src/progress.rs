//! Progress display for batch runs

use console::style;
use ferrobatch_types::{ProgressReporter, Task, TaskResult, TransferOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Progress bar over the tasks of a batch
///
/// Hidden in quiet mode; the counters are kept either way.
pub struct BatchProgress {
    progress_bar: ProgressBar,
    files_done: AtomicU64,
    files_failed: AtomicU64,
}

impl BatchProgress {
    /// Create a progress display for `total_tasks` tasks
    pub fn new(total_tasks: usize, quiet: bool) -> Self {
        let progress_bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total_tasks as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}/{len} tasks")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▉▊▋▌▍▎▏  "),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        };

        Self {
            progress_bar,
            files_done: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
        }
    }

    /// Bar message: current task and running file counts
    fn message(&self, task_name: &str) -> String {
        let failed = self.files_failed.load(Ordering::Relaxed);
        let failed = if failed > 0 {
            style(format!("{} failed", failed)).red().to_string()
        } else {
            format!("{} failed", failed)
        };
        format!(
            "{} {} file(s), {}",
            style(task_name).cyan(),
            self.files_done.load(Ordering::Relaxed),
            failed
        )
    }

    /// Clear the bar once the run is over
    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}

impl ProgressReporter for BatchProgress {
    fn task_started(&self, _index: usize, task: &Task) {
        self.progress_bar.set_message(self.message(&task.name));
    }

    fn file_transferred(&self, task: &Task, outcome: &TransferOutcome) {
        self.files_done.fetch_add(1, Ordering::Relaxed);
        if !outcome.succeeded {
            self.files_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.progress_bar.set_message(self.message(&task.name));
    }

    fn task_finished(&self, _index: usize, result: &TaskResult) {
        let marker = if result.has_failures() {
            style("✗").red().bold()
        } else {
            style("✓").green().bold()
        };
        self.progress_bar.println(format!(
            "{} {} ({} of {} file(s) transferred)",
            marker,
            result.task.name,
            result.succeeded_count(),
            result.files_selected
        ));
        self.progress_bar.inc(1);
    }
}
