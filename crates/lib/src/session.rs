//! The owned entry point of the engine.
//!
//! A [`Session`] holds the backend registry, the package cache, the declared
//! build graph and the execution config. Nothing is process-global: callers
//! register and activate backends, resolve packages, declare targets, then
//! call [`Session::build`].
//!
//! ```no_run
//! use kiln_lib::session::Session;
//! use kiln_lib::toolchain::{ToolchainDescriptor, ToolchainFlavor};
//!
//! # fn main() -> Result<(), kiln_lib::session::BuildError> {
//! let mut session = Session::new();
//! session.register_backend(ToolchainDescriptor::new("mingw", ToolchainFlavor::Gnu, "build-gcc", "bin-gcc", "."))?;
//! session.activate_backend("mingw")?;
//!
//! let sdl = session.resolve_package("SDL3")?;
//! let game = session.with_namespace("engine", |s| s.declare_object("game.o", "src/game.cpp", &[sdl.clone()]))??;
//! session.declare_executable("game", &["src/main.cpp".into()], &[game], &[sdl.clone()])?;
//! session.stage_files(sdl.runtime_files.iter().cloned())?;
//!
//! let report = session.build_blocking()?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::execute::{self, BuildReport, ExecuteConfig, PlannedAction};
use crate::graph::{self, BuildGraph, ExecutableHandle, GraphError, NamespaceOwner, NamespaceScope, ObjectHandle};
use crate::package::{Package, PackageError, PackageResolver, package_roots_from_env};
use crate::registry::{BackendRegistry, RegistryError};
use crate::state::{StateError, StateStore};
use crate::toolchain::{Toolchain, ToolchainDescriptor};

/// Errors surfaced by [`Session`] operations.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Registry(#[from] RegistryError),

  #[error(transparent)]
  Package(#[from] PackageError),

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  State(#[from] StateError),

  #[error("failed to start async runtime: {0}")]
  Runtime(#[source] io::Error),

  #[error("failed to remove {}: {source}", .path.display())]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// One or more actions failed. Everything that could run did.
  #[error(transparent)]
  Failed(Box<FailedBuild>),
}

/// Aggregate of every action that failed or was blocked in one build.
#[derive(Debug)]
pub struct FailedBuild {
  pub report: BuildReport,
}

impl fmt::Display for FailedBuild {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "build failed: {} action(s) failed, {} blocked",
      self.report.failed.len(),
      self.report.blocked.len()
    )?;
    for failed in &self.report.failed {
      write!(f, "\n  {} {}: {}", failed.kind, failed.label, failed.error)?;
    }
    Ok(())
  }
}

impl std::error::Error for FailedBuild {}

/// Outputs removed by [`Session::clean`].
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
  pub removed: Vec<PathBuf>,
}

/// Registry, package cache, declared graph and config for one caller.
#[derive(Debug)]
pub struct Session {
  registry: BackendRegistry,
  resolver: PackageResolver,
  graph: BuildGraph,
  config: ExecuteConfig,
}

impl Default for Session {
  fn default() -> Self {
    Self::new()
  }
}

impl Session {
  /// A session configured from the environment (`KILN_JOBS`, `KILN_PACKAGE_PATH`).
  pub fn new() -> Self {
    Self::with_config(ExecuteConfig::from_env(), package_roots_from_env())
  }

  pub fn with_config(config: ExecuteConfig, package_roots: Vec<PathBuf>) -> Self {
    Self {
      registry: BackendRegistry::new(),
      resolver: PackageResolver::new(package_roots),
      graph: BuildGraph::new(),
      config,
    }
  }

  pub fn config(&self) -> &ExecuteConfig {
    &self.config
  }

  pub fn config_mut(&mut self) -> &mut ExecuteConfig {
    &mut self.config
  }

  pub fn add_package_root(&mut self, root: impl Into<PathBuf>) {
    self.resolver.add_root(root);
  }

  pub fn package_roots(&self) -> &[PathBuf] {
    self.resolver.roots()
  }

  // --- backends -----------------------------------------------------------

  pub fn register_backend(&mut self, descriptor: ToolchainDescriptor) -> Result<(), RegistryError> {
    self.registry.register(descriptor)
  }

  pub fn register_toolchain(&mut self, toolchain: Arc<dyn Toolchain>) -> Result<(), RegistryError> {
    self.registry.register_toolchain(toolchain)
  }

  /// Activate `name`. Packages resolved before this call are stale and must
  /// be resolved again before they can be used in a build.
  pub fn activate_backend(&mut self, name: &str) -> Result<(), RegistryError> {
    self.registry.activate(name)?;
    self.resolver.invalidate();
    Ok(())
  }

  pub fn active_backend(&self) -> Option<&ToolchainDescriptor> {
    self.registry.active().ok().map(|t| t.descriptor())
  }

  pub fn backends(&self) -> impl Iterator<Item = &ToolchainDescriptor> {
    self.registry.descriptors()
  }

  // --- packages -----------------------------------------------------------

  /// Resolve a package for the active backend. Cached until the next activation.
  pub fn resolve_package(&mut self, name: &str) -> Result<Package, BuildError> {
    let toolchain = self.registry.active()?;
    let package = self.resolver.resolve(toolchain.as_ref(), self.registry.generation(), name)?;
    Ok(package)
  }

  // --- declarations -------------------------------------------------------

  pub fn graph(&self) -> &BuildGraph {
    &self.graph
  }

  pub fn enter_namespace(&mut self, name: &str) -> Result<NamespaceScope<'_, Self>, GraphError> {
    NamespaceScope::enter(self, name)
  }

  /// Run `f` with `name` pushed onto the namespace stack.
  pub fn with_namespace<R>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> R) -> Result<R, GraphError> {
    let mut scope = self.enter_namespace(name)?;
    Ok(f(&mut *scope))
  }

  pub fn declare_object(
    &mut self,
    output_name: &str,
    source_path: impl Into<PathBuf>,
    packages: &[Package],
  ) -> Result<ObjectHandle, GraphError> {
    self.graph.declare_object(output_name, source_path, packages)
  }

  pub fn declare_executable(
    &mut self,
    output_name: &str,
    sources: &[PathBuf],
    objects: &[ObjectHandle],
    packages: &[Package],
  ) -> Result<ExecutableHandle, GraphError> {
    self.graph.declare_executable(output_name, sources, objects, packages)
  }

  pub fn stage_files<I, P>(&mut self, files: I) -> Result<(), GraphError>
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.graph.stage_files(files)
  }

  // --- building -----------------------------------------------------------

  fn state_store(toolchain: &dyn Toolchain) -> StateStore {
    StateStore::new(toolchain.descriptor().state_path())
  }

  /// Plan the declared graph and report what a build would do.
  pub fn plan(&self) -> Result<Vec<PlannedAction>, BuildError> {
    let toolchain = self.registry.active()?;
    let dag = graph::plan(&self.graph, toolchain.as_ref(), self.registry.generation())?;
    let state = Self::state_store(toolchain.as_ref()).load(toolchain.name());
    Ok(execute::plan_staleness(&dag, &state, self.config.signature))
  }

  /// Build everything stale under the active backend.
  ///
  /// The build state is saved even when actions fail, so a corrected re-run
  /// only repeats what is still stale.
  pub async fn build(&self) -> Result<BuildReport, BuildError> {
    let toolchain = self.registry.active()?;
    let dag = graph::plan(&self.graph, toolchain.as_ref(), self.registry.generation())?;

    let store = Self::state_store(toolchain.as_ref());
    let mut state = store.load(toolchain.name());

    info!(backend = %toolchain.name(), actions = dag.len(), "build started");
    let report = execute::execute(&dag, &mut state, &self.config).await;

    if let Err(e) = store.save(&state) {
      if report.is_success() {
        return Err(e.into());
      }
      error!(error = %e, "failed to save build state");
    }

    info!(backend = %toolchain.name(), elapsed = ?report.elapsed, "{}", report);
    if report.is_success() {
      Ok(report)
    } else {
      Err(BuildError::Failed(Box::new(FailedBuild { report })))
    }
  }

  /// [`build`](Self::build) on a fresh tokio runtime. Must not be called
  /// from inside an async context.
  pub fn build_blocking(&self) -> Result<BuildReport, BuildError> {
    let runtime = tokio::runtime::Runtime::new().map_err(BuildError::Runtime)?;
    runtime.block_on(self.build())
  }

  /// Remove every output recorded for the active backend, and its state file.
  pub fn clean(&self) -> Result<CleanReport, BuildError> {
    let toolchain = self.registry.active()?;
    let store = Self::state_store(toolchain.as_ref());
    let state = store.load(toolchain.name());

    let mut report = CleanReport::default();
    for output in state.records.keys() {
      match std::fs::remove_file(output) {
        Ok(()) => report.removed.push(output.clone()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
          return Err(BuildError::Remove {
            path: output.clone(),
            source,
          });
        }
      }
    }

    store.remove().map_err(|source| BuildError::Remove {
      path: store.path().to_path_buf(),
      source,
    })?;

    info!(backend = %toolchain.name(), removed = report.removed.len(), "cleaned outputs");
    Ok(report)
  }
}

impl NamespaceOwner for Session {
  fn build_graph_mut(&mut self) -> &mut BuildGraph {
    &mut self.graph
  }
}
