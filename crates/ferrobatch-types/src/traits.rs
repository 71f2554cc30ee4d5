//! Core traits for ferrobatch operations
//!
//! Seams the engine takes from its caller: where "now" comes from, and who
//! hears about progress while a batch is running.

use crate::types::{Task, TaskResult, TransferOutcome};
use chrono::{DateTime, Local};

/// Source of the current date and time
pub trait Clock: Send + Sync {
    /// Current local time
    fn now(&self) -> DateTime<Local>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Local>);

impl FixedClock {
    /// Create a clock that always reports `at`
    pub fn new(at: DateTime<Local>) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Trait for reporting progress while a batch runs
///
/// Every method has an empty default so reporters only implement what they use.
pub trait ProgressReporter: Send + Sync {
    /// A task is about to be scanned
    fn task_started(&self, _index: usize, _task: &Task) {}

    /// One transfer attempt finished
    fn file_transferred(&self, _task: &Task, _outcome: &TransferOutcome) {}

    /// A task reached a terminal state
    fn task_finished(&self, _index: usize, _result: &TaskResult) {}
}

/// Reporter that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {}
