//! Resolved, schedulable units of work.
//!
//! Actions are derived from declared build nodes when the graph is planned.
//! Each one has concrete input and output paths, an intent describing what to
//! run, and the set of actions that must finish first. They are the unit of
//! staleness checking and execution.
//!
//! # Action Kinds
//!
//! - [`ActionKind::Compile`] - One source file into one object
//! - [`ActionKind::Link`] - Objects and direct sources into an executable
//! - [`ActionKind::Copy`] - Stage a file into the bin directory

mod types;

pub use types::*;
