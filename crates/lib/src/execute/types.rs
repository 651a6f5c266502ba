//! Types for action execution.
//!
//! This module defines the per-action error type, the report of one build
//! run, and the configuration for the scheduler.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::action::{ActionId, ActionKind};
use crate::consts::ENV_JOBS;
use crate::util::hash::SignatureMode;

/// Why a single action failed. Collected per action; never aborts siblings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
  /// The compiler exited unsuccessfully.
  #[error("compile of {action} failed: {command}\n{output}")]
  CompileFailed {
    action: String,
    command: String,
    /// Captured stderr and stdout of the compiler.
    output: String,
  },

  /// The linker exited unsuccessfully.
  #[error("link of {action} failed: {command}\n{output}")]
  LinkFailed {
    action: String,
    command: String,
    output: String,
  },

  /// Copying a staged file failed (missing source, permissions).
  #[error("failed to stage {} -> {}: {message}", .from.display(), .to.display())]
  StagingIo { from: PathBuf, to: PathBuf, message: String },

  /// The toolchain program could not be started.
  #[error("failed to spawn {program}: {message}")]
  Spawn { program: String, message: String },

  /// Preparing an output location failed.
  #[error("io error at {}: {message}", .path.display())]
  Io { path: PathBuf, message: String },

  /// The task running the action panicked or was cancelled.
  #[error("action task aborted: {0}")]
  Aborted(String),
}

/// An action that ran and succeeded during this build.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutedAction {
  pub id: ActionId,
  pub kind: ActionKind,
  pub label: String,
  /// Offset from the start of the build.
  pub started: Duration,
  /// Offset from the start of the build.
  pub finished: Duration,
}

impl ExecutedAction {
  pub fn duration(&self) -> Duration {
    self.finished.saturating_sub(self.started)
  }
}

/// An action skipped because nothing it consumes changed.
#[derive(Debug, Clone, Serialize)]
pub struct UpToDateAction {
  pub id: ActionId,
  pub kind: ActionKind,
  pub label: String,
}

/// An action that ran and failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedAction {
  pub id: ActionId,
  pub kind: ActionKind,
  pub label: String,
  #[serde(serialize_with = "serialize_display")]
  pub error: ActionError,
}

/// An action that never ran because something it depends on failed.
#[derive(Debug, Clone, Serialize)]
pub struct BlockedAction {
  pub id: ActionId,
  pub kind: ActionKind,
  pub label: String,
  /// The failed action that blocked this one.
  pub failed_dependency: ActionId,
}

fn serialize_display<S: serde::Serializer>(value: &ActionError, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.collect_str(value)
}

/// Outcome of one build run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
  pub backend: String,
  pub executed: Vec<ExecutedAction>,
  pub up_to_date: Vec<UpToDateAction>,
  pub failed: Vec<FailedAction>,
  pub blocked: Vec<BlockedAction>,
  /// Wall-clock time of the whole run.
  pub elapsed: Duration,
}

impl BuildReport {
  pub fn new(backend: impl Into<String>) -> Self {
    Self {
      backend: backend.into(),
      ..Self::default()
    }
  }

  /// True when no action failed or was blocked.
  pub fn is_success(&self) -> bool {
    self.failed.is_empty() && self.blocked.is_empty()
  }

  /// Number of actions skipped as up to date.
  pub fn skipped_count(&self) -> usize {
    self.up_to_date.len()
  }

  pub fn executed_count(&self, kind: ActionKind) -> usize {
    self.executed.iter().filter(|a| a.kind == kind).count()
  }

  pub fn total(&self) -> usize {
    self.executed.len() + self.up_to_date.len() + self.failed.len() + self.blocked.len()
  }

  pub fn executed_action(&self, label: &str) -> Option<&ExecutedAction> {
    self.executed.iter().find(|a| a.label == label)
  }
}

impl fmt::Display for BuildReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}: {} executed, {} up to date, {} failed, {} blocked",
      self.backend,
      self.executed.len(),
      self.up_to_date.len(),
      self.failed.len(),
      self.blocked.len()
    )
  }
}

/// Why an action will run, as decided before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
  UpToDate,
  /// No record from a previous successful run.
  NoRecord,
  /// Intent or input signature differs from the record.
  InputsChanged,
  /// A declared output is gone.
  OutputMissing,
  /// A dependency ran (or will run) in this build.
  DependencyRebuilt,
}

impl Staleness {
  pub fn is_stale(&self) -> bool {
    !matches!(self, Self::UpToDate)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::UpToDate => "up to date",
      Self::NoRecord => "never built",
      Self::InputsChanged => "inputs changed",
      Self::OutputMissing => "output missing",
      Self::DependencyRebuilt => "dependency rebuilt",
    }
  }
}

impl fmt::Display for Staleness {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// One row of a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedAction {
  pub id: ActionId,
  pub kind: ActionKind,
  pub label: String,
  pub staleness: Staleness,
  pub command: String,
}

/// Configuration for action execution.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Maximum number of actions running at once.
  pub parallelism: usize,

  /// How input files are fingerprinted.
  pub signature: SignatureMode,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      signature: SignatureMode::default(),
    }
  }
}

impl ExecuteConfig {
  /// Defaults, with `KILN_JOBS` overriding the parallelism when set to a
  /// positive integer.
  pub fn from_env() -> Self {
    let mut config = Self::default();
    if let Ok(value) = std::env::var(ENV_JOBS) {
      match value.trim().parse::<usize>() {
        Ok(jobs) if jobs > 0 => config.parallelism = jobs,
        _ => warn!(var = ENV_JOBS, value = %value, "ignoring invalid job count"),
      }
    }
    config
  }

  pub fn with_parallelism(mut self, parallelism: usize) -> Self {
    self.parallelism = parallelism.max(1);
    self
  }

  pub fn with_signature(mut self, signature: SignatureMode) -> Self {
    self.signature = signature;
    self
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
