//! Registered toolchains and the single active backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::toolchain::{Toolchain, ToolchainDescriptor, from_descriptor};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
  #[error("backend already registered: {0}")]
  DuplicateName(String),

  #[error("unknown backend: {0}")]
  UnknownBackend(String),

  #[error("no backend has been activated")]
  NoActiveBackend,
}

/// Table of toolchains keyed by name, with at most one active.
///
/// Every activation bumps [`generation`](Self::generation). Packages carry the
/// generation they were resolved under, which is how handles from an earlier
/// activation are recognized as stale.
#[derive(Debug, Default)]
pub struct BackendRegistry {
  toolchains: BTreeMap<String, Arc<dyn Toolchain>>,
  active: Option<String>,
  generation: u64,
}

impl BackendRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a descriptor using the built-in implementation for its flavor.
  pub fn register(&mut self, descriptor: ToolchainDescriptor) -> Result<(), RegistryError> {
    if self.toolchains.contains_key(&descriptor.name) {
      return Err(RegistryError::DuplicateName(descriptor.name));
    }
    self.insert(from_descriptor(descriptor));
    Ok(())
  }

  /// Register a caller-provided toolchain implementation.
  pub fn register_toolchain(&mut self, toolchain: Arc<dyn Toolchain>) -> Result<(), RegistryError> {
    let name = toolchain.descriptor().name.clone();
    if self.toolchains.contains_key(&name) {
      return Err(RegistryError::DuplicateName(name));
    }
    self.insert(toolchain);
    Ok(())
  }

  fn insert(&mut self, toolchain: Arc<dyn Toolchain>) {
    let desc = toolchain.descriptor();
    info!(
      backend = %desc.name,
      flavor = %desc.flavor,
      arch = %desc.arch,
      build_dir = %desc.build_dir.display(),
      "registered backend"
    );
    self.toolchains.insert(desc.name.clone(), toolchain);
  }

  /// Make `name` the active backend and start a new generation.
  pub fn activate(&mut self, name: &str) -> Result<u64, RegistryError> {
    if !self.toolchains.contains_key(name) {
      return Err(RegistryError::UnknownBackend(name.to_string()));
    }
    self.active = Some(name.to_string());
    self.generation += 1;
    info!(backend = %name, generation = self.generation, "activated backend");
    Ok(self.generation)
  }

  /// The active toolchain.
  pub fn active(&self) -> Result<&Arc<dyn Toolchain>, RegistryError> {
    self
      .active
      .as_ref()
      .and_then(|name| self.toolchains.get(name))
      .ok_or(RegistryError::NoActiveBackend)
  }

  pub fn active_name(&self) -> Option<&str> {
    self.active.as_deref()
  }

  /// Current activation generation; `0` before the first activation.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn get(&self, name: &str) -> Option<&Arc<dyn Toolchain>> {
    self.toolchains.get(name)
  }

  /// Registered descriptors in name order.
  pub fn descriptors(&self) -> impl Iterator<Item = &ToolchainDescriptor> {
    self.toolchains.values().map(|t| t.descriptor())
  }

  pub fn len(&self) -> usize {
    self.toolchains.len()
  }

  pub fn is_empty(&self) -> bool {
    self.toolchains.is_empty()
  }
}
