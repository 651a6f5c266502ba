use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::ActionKind;
use crate::consts::STATE_VERSION;
use crate::util::hash::ContentHash;

/// What was true the last time an action succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
  pub kind: ActionKind,
  pub label: String,
  /// Signature of the action's intent and inputs when it last succeeded.
  pub signature: ContentHash,
}

/// Persisted staleness record for one backend, keyed by output path.
///
/// Only successful actions have records. A failed action's record is
/// removed so the next build retries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildState {
  pub version: u32,
  /// Backend that produced these records.
  pub backend: String,
  pub records: BTreeMap<PathBuf, ActionRecord>,
}

impl BuildState {
  pub fn new(backend: impl Into<String>) -> Self {
    Self {
      version: STATE_VERSION,
      backend: backend.into(),
      records: BTreeMap::new(),
    }
  }

  pub fn get(&self, output: &Path) -> Option<&ActionRecord> {
    self.records.get(output)
  }

  pub fn insert(&mut self, output: PathBuf, record: ActionRecord) {
    self.records.insert(output, record);
  }

  pub fn remove(&mut self, output: &Path) -> Option<ActionRecord> {
    self.records.remove(output)
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

/// Errors writing the build state. Reading never fails; an unusable file is
/// treated as an empty state.
#[derive(Debug, Error)]
pub enum StateError {
  #[error("failed to create state directory {}: {source}", .path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to serialize build state: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("failed to write build state {}: {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
