//! Unified test utilities for ferrobatch integration tests

use chrono::{DateTime, Duration, Local};
use ferrobatch_types::{FixedClock, NamePattern, Task, TransferAction};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary tree with named folders for sources and destinations
pub struct BatchFixture {
    dir: TempDir,
}

impl BatchFixture {
    /// Create an empty fixture
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Create (if needed) and return a folder under the root
    pub fn folder(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::create_dir_all(&path).expect("Failed to create folder");
        path
    }

    /// A path under the root that is never created
    pub fn missing(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a file and return its path
    pub fn file(&self, folder: &Path, name: &str, content: &str) -> PathBuf {
        let path = folder.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent folder");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Write a JSON task file under the root and return its path
    pub fn task_file(&self, tasks: &Value) -> PathBuf {
        let path = self.dir.path().join("tasks.json");
        fs::write(&path, serde_json::to_string_pretty(tasks).expect("Invalid JSON"))
            .expect("Failed to write task file");
        path
    }
}

impl Default for BatchFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Task with every option spelled out
pub fn task(
    name: &str,
    action: TransferAction,
    source: &Path,
    pattern: &str,
    destination: &Path,
) -> Task {
    Task::new(
        name,
        action,
        source,
        NamePattern::new(pattern).expect("Invalid pattern"),
        destination,
    )
}

/// JSON object for one task in task-file form
pub fn task_json(
    action: &str,
    source: &Path,
    pattern: &str,
    destination: &Path,
    max_age_days: u32,
) -> Value {
    json!({
        "action": action,
        "sourceFolder": source,
        "recurse": false,
        "nameRegex": pattern,
        "destinationFolder": destination,
        "overwriteExisting": false,
        "maxAgeDays": max_age_days,
    })
}

/// Clock set `days` after now
///
/// Files created during the test look `days` old to it, which stands in for
/// files created in the past since creation times cannot be set portably.
pub fn clock_days_ahead(days: i64) -> FixedClock {
    FixedClock::new(days_ahead(days))
}

/// Current time shifted by `days`
pub fn days_ahead(days: i64) -> DateTime<Local> {
    Local::now() + Duration::days(days)
}

/// Read a file to a string
pub fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("Failed to read file")
}
