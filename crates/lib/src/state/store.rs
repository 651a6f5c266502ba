//! On-disk persistence of [`BuildState`].
//!
//! ```text
//! <root>/<build_dir>/
//! └── .kiln-state.json     # BuildState for this backend
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::consts::STATE_VERSION;

use super::types::{BuildState, StateError};

/// Reads and writes one backend's state file.
#[derive(Debug, Clone)]
pub struct StateStore {
  path: PathBuf,
}

impl StateStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Load the state, or an empty one if the file is absent, unreadable,
  /// written for another backend, or in an unknown format.
  pub fn load(&self, backend: &str) -> BuildState {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %self.path.display(), "no build state, starting fresh");
        return BuildState::new(backend);
      }
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "unreadable build state, rebuilding everything");
        return BuildState::new(backend);
      }
    };

    let state: BuildState = match serde_json::from_str(&content) {
      Ok(state) => state,
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "corrupt build state, rebuilding everything");
        return BuildState::new(backend);
      }
    };

    if state.version != STATE_VERSION {
      warn!(
        path = %self.path.display(),
        found = state.version,
        expected = STATE_VERSION,
        "build state version mismatch, rebuilding everything"
      );
      return BuildState::new(backend);
    }

    if state.backend != backend {
      warn!(
        path = %self.path.display(),
        found = %state.backend,
        expected = %backend,
        "build state belongs to another backend, rebuilding everything"
      );
      return BuildState::new(backend);
    }

    debug!(path = %self.path.display(), records = state.len(), "loaded build state");
    state
  }

  /// Write the state atomically (temp file in the same directory, then rename).
  pub fn save(&self, state: &BuildState) -> Result<(), StateError> {
    let dir = self.path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|source| StateError::CreateDir {
      path: dir.to_path_buf(),
      source,
    })?;

    let content = serde_json::to_string_pretty(state)?;
    let write_err = |source: io::Error| StateError::Write {
      path: self.path.clone(),
      source,
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.persist(&self.path).map_err(|e| write_err(e.error))?;

    debug!(path = %self.path.display(), records = state.len(), "saved build state");
    Ok(())
  }

  /// Delete the state file. Missing is fine.
  pub fn remove(&self) -> io::Result<()> {
    match fs::remove_file(&self.path) {
      Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
      _ => Ok(()),
    }
  }
}
