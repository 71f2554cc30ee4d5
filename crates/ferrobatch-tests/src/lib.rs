//! ferrobatch integration testing support
//!
//! This crate holds the end-to-end tests of the workspace and the fixture
//! helpers they share.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Folder fixtures, task builders, and task file writers used across the
/// integration tests.
pub mod test_utils;
