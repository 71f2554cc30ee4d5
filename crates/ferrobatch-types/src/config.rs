//! Configuration types for ferrobatch
//!
//! Validated value types shared by the settings loader and the engine.

use std::fmt;
use std::str::FromStr;

/// Number of tasks a batch may run at the same time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct TaskConcurrency(usize);

impl TaskConcurrency {
    /// Minimum concurrency, tasks run one after another
    pub const MIN: usize = 1;
    /// Maximum concurrency
    pub const MAX: usize = 64;
    /// Sequential execution
    pub const SEQUENTIAL: Self = Self(1);

    /// Create a new concurrency limit with validation
    pub fn new(count: usize) -> Result<Self, String> {
        if count < Self::MIN {
            Err(format!("Task concurrency {} is below minimum {}", count, Self::MIN))
        } else if count > Self::MAX {
            Err(format!("Task concurrency {} exceeds maximum {}", count, Self::MAX))
        } else {
            Ok(Self(count))
        }
    }

    /// Get the limit value
    pub fn get(self) -> usize {
        self.0
    }

    /// Check if tasks run strictly one at a time
    pub fn is_sequential(self) -> bool {
        self.0 == 1
    }
}

impl Default for TaskConcurrency {
    fn default() -> Self {
        Self::SEQUENTIAL
    }
}

impl TryFrom<usize> for TaskConcurrency {
    type Error = String;

    fn try_from(count: usize) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<TaskConcurrency> for usize {
    fn from(value: TaskConcurrency) -> Self {
        value.0
    }
}

/// How `max_age_days` turns into a creation-date cutoff
///
/// Both policies treat `max_age_days == 0` as "no age filter".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AgeWindowPolicy {
    /// `cutoff = today - (N - 1)`: N calendar days counting today, so 1 means today only
    #[default]
    InclusiveToday,
    /// `cutoff = today - N`: today plus N full days before it
    FullDays,
}

impl AgeWindowPolicy {
    /// Days to subtract from today to get the cutoff, for a non-zero window
    pub fn lookback_days(self, max_age_days: u32) -> u32 {
        match self {
            Self::InclusiveToday => max_age_days.saturating_sub(1),
            Self::FullDays => max_age_days,
        }
    }
}

impl fmt::Display for AgeWindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InclusiveToday => f.write_str("inclusive_today"),
            Self::FullDays => f.write_str("full_days"),
        }
    }
}

impl FromStr for AgeWindowPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "inclusive_today" => Ok(Self::InclusiveToday),
            "full_days" => Ok(Self::FullDays),
            other => Err(format!(
                "unknown age policy '{}', expected 'inclusive_today' or 'full_days'",
                other
            )),
        }
    }
}
