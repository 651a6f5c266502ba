use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::ActionId;
use crate::consts::NAMESPACE_SEPARATOR;
use crate::package::Package;

/// A logical grouping prefix for declared nodes, e.g. `engine` or `engine::render`.
///
/// The root namespace has no segments. Namespaces also pick the physical
/// output directory: an object `game.obj` in `engine` is written to
/// `<build_dir>/engine/game.obj`, so same-named outputs in different
/// namespaces never collide on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace(Vec<String>);

impl Namespace {
  pub fn root() -> Self {
    Self::default()
  }

  /// Parse `a::b` into a namespace. The empty string is the root.
  pub fn parse(text: &str) -> Result<Self, GraphError> {
    if text.is_empty() {
      return Ok(Self::root());
    }
    let segments = text.split(NAMESPACE_SEPARATOR).map(str::to_string).collect::<Vec<_>>();
    for segment in &segments {
      validate_segment(segment)?;
    }
    Ok(Self(segments))
  }

  pub(crate) fn from_segments(segments: &[String]) -> Self {
    Self(segments.to_vec())
  }

  pub fn segments(&self) -> &[String] {
    &self.0
  }

  pub fn is_root(&self) -> bool {
    self.0.is_empty()
  }

  /// `engine::game.obj`, or just `game.obj` in the root namespace.
  pub fn qualify(&self, name: &str) -> String {
    if self.is_root() {
      name.to_string()
    } else {
      format!("{}{}{}", self, NAMESPACE_SEPARATOR, name)
    }
  }

  /// Join this namespace onto `base` as nested directories.
  pub fn dir_under(&self, base: &Path) -> PathBuf {
    self.0.iter().fold(base.to_path_buf(), |acc, seg| acc.join(seg))
  }
}

impl fmt::Display for Namespace {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.join(NAMESPACE_SEPARATOR))
  }
}

/// Namespace segments double as directory names, so they must be plain names.
pub(crate) fn validate_segment(segment: &str) -> Result<(), GraphError> {
  if segment.is_empty()
    || segment == "."
    || segment == ".."
    || segment.contains(['/', '\\'])
    || segment.contains(NAMESPACE_SEPARATOR)
  {
    return Err(GraphError::InvalidName(segment.to_string()));
  }
  Ok(())
}

/// Output names become file names directly under the namespace directory.
pub(crate) fn validate_output_name(name: &str) -> Result<(), GraphError> {
  if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
    return Err(GraphError::InvalidName(name.to_string()));
  }
  Ok(())
}

/// Reference to a declared object node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
  pub(crate) graph: u64,
  pub(crate) index: usize,
}

/// Reference to a declared executable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutableHandle {
  pub(crate) graph: u64,
  pub(crate) index: usize,
}

/// One compile target.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
  pub output_name: String,
  pub source_path: PathBuf,
  pub namespace: Namespace,
  pub packages: Vec<Package>,
}

/// One link target.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableNode {
  pub output_name: String,
  pub namespace: Namespace,
  /// Sources compiled as part of the link step.
  pub sources: Vec<PathBuf>,
  /// Previously declared objects, shared with any other executable that lists them.
  pub objects: Vec<ObjectHandle>,
  pub packages: Vec<Package>,
}

/// A declared, not yet planned target.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildNode {
  Object(ObjectNode),
  Executable(ExecutableNode),
}

impl BuildNode {
  pub fn output_name(&self) -> &str {
    match self {
      Self::Object(o) => &o.output_name,
      Self::Executable(e) => &e.output_name,
    }
  }

  pub fn namespace(&self) -> &Namespace {
    match self {
      Self::Object(o) => &o.namespace,
      Self::Executable(e) => &e.namespace,
    }
  }

  pub fn packages(&self) -> &[Package] {
    match self {
      Self::Object(o) => &o.packages,
      Self::Executable(e) => &e.packages,
    }
  }

  /// Namespace-qualified name used in reports.
  pub fn label(&self) -> String {
    self.namespace().qualify(self.output_name())
  }
}

/// Declaration and planning errors. These indicate a mistake in the build
/// description and abort before anything executes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
  #[error("duplicate output '{name}' in namespace '{namespace}'")]
  DuplicateOutput { namespace: Namespace, name: String },

  #[error("object handle does not belong to this build graph")]
  UnknownObject,

  #[error("invalid name: '{0}'")]
  InvalidName(String),

  #[error(
    "staging conflict at {}: already provided by {existing}, also requested from {}",
    .destination.display(),
    .requested.display()
  )]
  StagingConflict {
    destination: PathBuf,
    existing: String,
    requested: PathBuf,
  },

  #[error("dependency cycle detected in action graph")]
  CyclicGraph,

  #[error("action {action} depends on unknown action {dependency}")]
  DanglingDependency { action: ActionId, dependency: ActionId },

  #[error("package {package} was resolved under backend '{resolved_under}' but '{active}' is active; resolve it again")]
  StalePackage {
    package: String,
    resolved_under: String,
    active: String,
  },
}
