//! Core type system and error handling for ferrobatch
//!
//! This crate provides the vocabulary shared by the configuration loader, the
//! transfer engine, and the command line front-end:
//!
//! - **Error handling**: [`Error`], its [`ErrorKind`] and [`ErrorScope`], and
//!   [`ErrorDetail`] for failures captured as data
//! - **Core types**: [`Task`], [`Candidate`], [`TransferOutcome`], [`TaskResult`]
//! - **Traits**: [`Clock`] and [`ProgressReporter`]
//! - **Configuration**: validated value types such as [`TaskConcurrency`]
//!
//! # Features
//!
//! - `std` (default): Enable standard library features
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use ferrobatch_types::{NamePattern, Result, Task, TransferAction};
//!
//! fn daily_reports() -> Result<Task> {
//!     let pattern = NamePattern::new(r"Analyse_.*\.xlsx")?;
//!     Ok(Task::new("reports", TransferAction::Copy, "/in", pattern, "/out")
//!         .with_max_age_days(1))
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{AgeWindowPolicy, TaskConcurrency};
pub use error::{Error, ErrorDetail, ErrorKind, ErrorScope};
pub use result::Result;
pub use traits::*;
pub use types::*;
