//! Declarative build descriptions.
//!
//! A [`BuildManifest`] is the TOML form of the calls a build script makes on
//! a [`Session`]: register backends, resolve packages, declare objects and
//! executables, stage files. [`BuildManifest::apply`] replays it.

mod types;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::graph::Namespace;
use crate::package::Package;
use crate::session::Session;
use crate::toolchain::ToolchainDescriptor;

pub use types::*;

impl BuildManifest {
  /// Read a manifest file. Its directory becomes the root of every backend.
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let root = dunce::canonicalize(dir).map_err(|source| ManifestError::Read {
      path: dir.to_path_buf(),
      source,
    })?;
    Self::parse(&content, &root)
  }

  /// Parse a manifest rooted at `root_dir`.
  pub fn parse(content: &str, root_dir: &Path) -> Result<Self, ManifestError> {
    let mut manifest: BuildManifest = toml::from_str(content).map_err(|e| ManifestError::Parse(e.to_string()))?;
    manifest.root_dir = root_dir.to_path_buf();
    Ok(manifest)
  }

  /// Descriptors for every `[[backend]]`, rooted at the manifest directory.
  pub fn descriptors(&self) -> Vec<ToolchainDescriptor> {
    self
      .backends
      .iter()
      .map(|spec| {
        let mut desc = ToolchainDescriptor::new(
          &spec.name,
          spec.flavor,
          &spec.build_dir,
          &spec.bin_dir,
          &self.root_dir,
        )
        .with_compile_flags(spec.compile_flags.to_vec())
        .with_link_flags(spec.link_flags.to_vec());
        if let Some(arch) = spec.arch {
          desc = desc.with_arch(arch);
        }
        if let Some(program) = &spec.program {
          desc = desc.with_program(program);
        }
        desc
      })
      .collect()
  }

  /// Name of the backend to activate: `requested`, else `active`, else the
  /// only declared backend.
  pub fn active_backend<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str, ManifestError> {
    if let Some(name) = requested.or(self.active.as_deref()) {
      return Ok(name);
    }
    match self.backends.as_slice() {
      [] => Err(ManifestError::NoBackends),
      [only] => Ok(&only.name),
      _ => Err(ManifestError::AmbiguousBackend),
    }
  }

  /// Register every backend and package root, then activate one.
  ///
  /// Returns the activated backend's name.
  pub fn apply_backends(&self, session: &mut Session, requested: Option<&str>) -> Result<String, ManifestError> {
    for root in &self.package_roots {
      session.add_package_root(self.root_dir.join(root));
    }
    for desc in self.descriptors() {
      session.register_backend(desc)?;
    }
    let active = self.active_backend(requested)?.to_string();
    session.activate_backend(&active)?;
    Ok(active)
  }

  /// Apply the whole manifest: backends, packages, targets and staging.
  pub fn apply(&self, session: &mut Session, requested: Option<&str>) -> Result<(), ManifestError> {
    let active = self.apply_backends(session, requested)?;

    let mut packages: BTreeMap<&str, Package> = BTreeMap::new();
    for name in &self.packages {
      packages.insert(name.as_str(), session.resolve_package(name)?);
    }
    let lookup = |names: &[String]| -> Result<Vec<Package>, ManifestError> {
      names
        .iter()
        .map(|n| {
          packages
            .get(n.as_str())
            .cloned()
            .ok_or_else(|| ManifestError::UndeclaredPackage(n.clone()))
        })
        .collect()
    };

    for object in &self.objects {
      let deps = lookup(&object.packages)?;
      let namespace = Namespace::parse(&object.namespace)?;
      within(session, namespace.segments(), |s| {
        s.declare_object(&object.name, &object.source, &deps)?;
        Ok(())
      })?;
    }

    for exe in &self.executables {
      let deps = lookup(&exe.packages)?;
      let mut objects = Vec::with_capacity(exe.objects.len());
      for reference in &exe.objects {
        let handle = session
          .graph()
          .find_object(reference)
          .ok_or_else(|| ManifestError::UnknownObject {
            executable: exe.name.clone(),
            object: reference.clone(),
          })?;
        objects.push(handle);
      }
      let namespace = Namespace::parse(&exe.namespace)?;
      within(session, namespace.segments(), |s| {
        s.declare_executable(&exe.name, &exe.sources, &objects, &deps)?;
        Ok(())
      })?;
    }

    session.stage_files(self.stage.files.iter().cloned())?;
    for package in lookup(&self.stage.packages)? {
      debug!(package = %package.name, files = package.runtime_files.len(), "staging runtime files");
      session.stage_files(package.runtime_files)?;
    }

    info!(
      backend = %active,
      objects = self.objects.len(),
      executables = self.executables.len(),
      "applied build manifest"
    );
    Ok(())
  }
}

/// Run `f` inside nested namespace scopes, one per segment.
fn within<R>(
  session: &mut Session,
  segments: &[String],
  f: impl FnOnce(&mut Session) -> Result<R, ManifestError>,
) -> Result<R, ManifestError> {
  match segments.split_first() {
    None => f(session),
    Some((first, rest)) => {
      let mut scope = session.enter_namespace(first)?;
      within(&mut *scope, rest, f)
    }
  }
}
