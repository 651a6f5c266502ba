//! Package resolution with a per-backend cache.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::consts::ENV_PACKAGE_PATH;
use crate::toolchain::Toolchain;

use super::types::{Package, PackageError};

/// Locates packages for the active toolchain and memoizes the results.
///
/// The cache is keyed by `(toolchain, package)` and only holds entries from
/// the current activation generation; [`invalidate`](Self::invalidate) is
/// called whenever a backend is activated.
#[derive(Debug, Default)]
pub struct PackageResolver {
  roots: Vec<PathBuf>,
  cache: HashMap<(String, String), Package>,
}

impl PackageResolver {
  pub fn new(roots: Vec<PathBuf>) -> Self {
    Self {
      roots,
      cache: HashMap::new(),
    }
  }

  /// Search roots, in priority order.
  pub fn roots(&self) -> &[PathBuf] {
    &self.roots
  }

  /// Append a search root. Cached packages stay valid; new roots only affect misses.
  pub fn add_root(&mut self, root: impl Into<PathBuf>) {
    let root = root.into();
    if !self.roots.contains(&root) {
      self.roots.push(root);
    }
  }

  /// Resolve `name` for `toolchain`, scanning the filesystem only on a cache miss.
  pub fn resolve(&mut self, toolchain: &dyn Toolchain, generation: u64, name: &str) -> Result<Package, PackageError> {
    let key = (toolchain.descriptor().name.clone(), name.to_string());

    if let Some(cached) = self.cache.get(&key)
      && cached.generation == generation
    {
      debug!(package = %name, backend = %key.0, "package cache hit");
      return Ok(cached.clone());
    }

    debug!(package = %name, backend = %key.0, roots = self.roots.len(), "scanning for package");
    let mut package = toolchain.describe_package(name, &self.roots)?;

    for file in &package.runtime_files {
      if !file.is_absolute() || !file.exists() {
        return Err(PackageError::MissingRuntimeFile {
          name: name.to_string(),
          path: file.clone(),
        });
      }
    }

    package.name = name.to_string();
    package.toolchain = key.0.clone();
    package.generation = generation;

    info!(
      package = %name,
      backend = %key.0,
      libs = package.link_libs.len(),
      runtime_files = package.runtime_files.len(),
      "resolved package"
    );

    self.cache.insert(key, package.clone());
    Ok(package)
  }

  /// Drop every cached package.
  pub fn invalidate(&mut self) {
    if !self.cache.is_empty() {
      debug!(entries = self.cache.len(), "invalidating package cache");
    }
    self.cache.clear();
  }

  /// Number of cached entries.
  pub fn cached(&self) -> usize {
    self.cache.len()
  }
}

/// Search roots from `KILN_PACKAGE_PATH`, in the platform's path-list syntax.
pub fn package_roots_from_env() -> Vec<PathBuf> {
  std::env::var_os(ENV_PACKAGE_PATH)
    .map(|value| {
      std::env::split_paths(&value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
    })
    .unwrap_or_default()
}
