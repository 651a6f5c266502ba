use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::GraphError;
use crate::platform::Arch;
use crate::registry::RegistryError;
use crate::session::BuildError;
use crate::toolchain::{ToolchainFlavor, split_flags};

/// A build description read from `kiln.toml`.
///
/// ```toml
/// active = "mingw"
/// package_roots = ["C:/libs"]
/// packages = ["SDL3"]
///
/// [[backend]]
/// name = "mingw"
/// flavor = "gnu"
/// build_dir = "build-gcc"
/// bin_dir = "bin-gcc"
/// compile_flags = "-g -O0"
///
/// [[object]]
/// name = "game.o"
/// source = "src/game.cpp"
/// namespace = "engine"
/// packages = ["SDL3"]
///
/// [[executable]]
/// name = "game"
/// sources = ["src/main.cpp"]
/// objects = ["engine::game.o"]
/// packages = ["SDL3"]
///
/// [stage]
/// packages = ["SDL3"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildManifest {
  #[serde(default, rename = "backend")]
  pub backends: Vec<BackendSpec>,

  /// Backend activated when none is requested explicitly.
  #[serde(default)]
  pub active: Option<String>,

  /// Package search roots, relative to the manifest directory.
  #[serde(default)]
  pub package_roots: Vec<PathBuf>,

  /// Packages resolved up front. Targets may only reference these.
  #[serde(default)]
  pub packages: Vec<String>,

  #[serde(default, rename = "object")]
  pub objects: Vec<ObjectSpec>,

  #[serde(default, rename = "executable")]
  pub executables: Vec<ExecutableSpec>,

  #[serde(default)]
  pub stage: StageSpec,

  /// Directory containing the manifest; the root of every backend.
  #[serde(skip)]
  pub root_dir: PathBuf,
}

/// One `[[backend]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendSpec {
  pub name: String,
  pub flavor: ToolchainFlavor,
  /// Defaults to the host architecture.
  #[serde(default)]
  pub arch: Option<Arch>,
  pub build_dir: PathBuf,
  pub bin_dir: PathBuf,
  #[serde(default)]
  pub compile_flags: Flags,
  #[serde(default)]
  pub link_flags: Flags,
  #[serde(default)]
  pub program: Option<String>,
}

/// Flags as a single whitespace-separated string or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flags {
  Line(String),
  List(Vec<String>),
}

impl Default for Flags {
  fn default() -> Self {
    Self::List(Vec::new())
  }
}

impl Flags {
  pub fn to_vec(&self) -> Vec<String> {
    match self {
      Self::Line(line) => split_flags(line),
      Self::List(list) => list.clone(),
    }
  }
}

/// One `[[object]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectSpec {
  pub name: String,
  pub source: PathBuf,
  /// `engine` or `engine::render`; empty for the root namespace.
  #[serde(default)]
  pub namespace: String,
  #[serde(default)]
  pub packages: Vec<String>,
}

/// One `[[executable]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutableSpec {
  pub name: String,
  #[serde(default)]
  pub namespace: String,
  #[serde(default)]
  pub sources: Vec<PathBuf>,
  /// Qualified object names, e.g. `engine::game.o`.
  #[serde(default)]
  pub objects: Vec<String>,
  #[serde(default)]
  pub packages: Vec<String>,
}

/// The `[stage]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSpec {
  #[serde(default)]
  pub files: Vec<PathBuf>,
  /// Packages whose runtime files are staged.
  #[serde(default)]
  pub packages: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid manifest: {0}")]
  Parse(String),

  #[error("manifest declares no backends")]
  NoBackends,

  #[error("several backends are declared; set `active` or pass a backend name")]
  AmbiguousBackend,

  #[error("package '{0}' is not listed in `packages`")]
  UndeclaredPackage(String),

  #[error("executable '{executable}' references unknown object '{object}'")]
  UnknownObject { executable: String, object: String },

  #[error(transparent)]
  Registry(#[from] RegistryError),

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Session(#[from] BuildError),
}
