//! Scan, select, and transfer engine for ferrobatch
//!
//! This crate runs a list of validated tasks: each task's source folder is
//! scanned, files are selected by name and creation date, and every selected
//! file is copied or moved into the task's destination folder.
//!
//! # Components
//!
//! - [`FileCatalogScanner`]: enumerates regular files under a folder
//! - [`FilterCriteria`]: name pattern plus age window
//! - [`TransferExecutor`]: one copy or move, captured as a [`TransferOutcome`]
//! - [`TaskRunner`]: drives one task to a terminal state
//! - [`BatchOrchestrator`]: runs the whole list and builds a [`FailureReport`]
//!
//! Failures never escape as errors. A task that cannot be scanned is recorded
//! as failed and the batch moves on; a file that cannot be transferred is
//! recorded in its outcome and the task moves on.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferrobatch_engine::BatchOrchestrator;
//! use ferrobatch_types::{NamePattern, Task, TransferAction};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let task = Task::new(
//!     "reports",
//!     TransferAction::Copy,
//!     "/data/in",
//!     NamePattern::new(r"Analyse_.*\.xlsx")?,
//!     "/data/out",
//! )
//! .with_max_age_days(1);
//!
//! let report = BatchOrchestrator::new().run_all(&[task]).await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! [`TransferOutcome`]: ferrobatch_types::TransferOutcome

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod executor;
pub mod filter;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod scanner;

pub use executor::TransferExecutor;
pub use filter::{FilterCriteria, SelectionWindow};
pub use orchestrator::{BatchOrchestrator, OrchestratorBuilder};
pub use report::{Failure, FailureReport, ReportSummary};
pub use runner::TaskRunner;
pub use scanner::FileCatalogScanner;
