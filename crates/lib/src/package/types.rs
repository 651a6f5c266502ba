use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::Arch;

/// A resolved external dependency, valid only for the backend it was resolved under.
///
/// `toolchain` and `generation` identify that backend activation. The graph
/// rejects a package whose stamp does not match the active backend, so a
/// caller that switches backends must resolve again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
  pub name: String,
  /// Backend the package was resolved under.
  pub toolchain: String,
  /// Activation generation of the registry at resolution time.
  pub generation: u64,
  pub include_paths: BTreeSet<PathBuf>,
  pub lib_paths: BTreeSet<PathBuf>,
  /// Libraries in link order, spelled the way the owning toolchain expects.
  pub link_libs: Vec<String>,
  /// Absolute paths of files that must sit next to the executable at runtime.
  pub runtime_files: BTreeSet<PathBuf>,
}

impl Package {
  /// An empty, unstamped package. The resolver fills in the stamp.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      toolchain: String::new(),
      generation: 0,
      include_paths: BTreeSet::new(),
      lib_paths: BTreeSet::new(),
      link_libs: Vec::new(),
      runtime_files: BTreeSet::new(),
    }
  }

  /// Appends a library unless it is already listed.
  pub fn push_lib(&mut self, lib: impl Into<String>) {
    let lib = lib.into();
    if !self.link_libs.contains(&lib) {
      self.link_libs.push(lib);
    }
  }
}

impl fmt::Display for Package {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.name, self.toolchain)
  }
}

/// Errors raised while locating a package.
#[derive(Debug, Error)]
pub enum PackageError {
  /// No directory matching the package name exists in any search root.
  #[error("package not found: {name} (searched {})", display_roots(.searched))]
  NotFound { name: String, searched: Vec<PathBuf> },

  /// The package exists, but only for other architectures.
  #[error("package {name} does not match toolchain architecture {expected} (found: {})", display_arches(.found))]
  ToolchainMismatch {
    name: String,
    expected: Arch,
    found: Vec<Arch>,
  },

  /// A runtime file could not be made absolute.
  #[error("package {name}: runtime file {} is missing", .path.display())]
  MissingRuntimeFile { name: String, path: PathBuf },

  #[error("io error reading {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

fn display_roots(roots: &[PathBuf]) -> String {
  if roots.is_empty() {
    return "no search roots configured".to_string();
  }
  roots.iter().map(|r| r.display().to_string()).collect::<Vec<_>>().join(", ")
}

fn display_arches(arches: &[Arch]) -> String {
  arches.iter().map(Arch::as_str).collect::<Vec<_>>().join(", ")
}
