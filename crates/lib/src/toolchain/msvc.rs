//! Microsoft Visual C++ (`cl.exe`).
//!
//! Packages follow the Visual C++ development layout:
//!
//! ```text
//! SDL3-3.2.4/
//! ├── include/
//! └── lib/
//!     ├── x64/   SDL3.lib  SDL3.dll
//!     └── x86/   SDL3.lib  SDL3.dll
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::package::layout::{absolute_runtime_file, candidate_dirs, files_with_suffix};
use crate::package::{Package, PackageError};
use crate::platform::Arch;

use super::{CommandSpec, CompileUnit, LinkUnit, Toolchain, ToolchainDescriptor};

#[derive(Debug)]
pub struct MsvcToolchain {
  descriptor: ToolchainDescriptor,
}

impl MsvcToolchain {
  pub fn new(descriptor: ToolchainDescriptor) -> Self {
    Self { descriptor }
  }

  fn command(&self) -> CommandSpec {
    let program = self.descriptor.program.as_deref().unwrap_or("cl");
    let mut cmd = CommandSpec::new(program, self.descriptor.build_path());
    cmd.arg("/nologo").args(self.descriptor.compile_flags.iter().cloned());
    cmd
  }

  fn package_from(&self, name: &str, dir: &Path, lib_dir: &Path) -> Result<Package, PackageError> {
    let mut package = Package::new(name);

    let include = dir.join("include");
    if include.is_dir() {
      package.include_paths.insert(include);
    }
    package.lib_paths.insert(lib_dir.to_path_buf());

    for lib in files_with_suffix(lib_dir, &[".lib"])? {
      if let Some(file_name) = lib.file_name().and_then(|n| n.to_str()) {
        package.push_lib(file_name);
      }
    }

    // A flat bin/ only counts for packages without per-arch directories.
    let arch_bin = dir.join("bin").join(self.descriptor.arch.msvc_dir());
    let per_arch = lib_dir != dir.join("lib") || arch_bin.is_dir();
    let mut runtime_dirs = vec![lib_dir.to_path_buf(), arch_bin];
    if !per_arch {
      runtime_dirs.push(dir.join("bin"));
    }
    for runtime_dir in runtime_dirs {
      for dll in files_with_suffix(&runtime_dir, &[".dll"])? {
        package.runtime_files.insert(absolute_runtime_file(name, &dll)?);
      }
    }

    Ok(package)
  }
}

impl Toolchain for MsvcToolchain {
  fn descriptor(&self) -> &ToolchainDescriptor {
    &self.descriptor
  }

  fn compile(&self, unit: &CompileUnit<'_>) -> CommandSpec {
    let mut cmd = self.command();
    cmd
      .arg("/c")
      .path_arg(unit.source)
      .arg(format!("/Fo{}", unit.output.display()));
    for dir in unit.include_dirs {
      cmd.arg(format!("/I{}", dir.display()));
    }
    cmd
  }

  fn link(&self, unit: &LinkUnit<'_>) -> CommandSpec {
    let mut cmd = self.command();
    for dir in unit.include_dirs {
      cmd.arg(format!("/I{}", dir.display()));
    }
    for source in unit.sources {
      cmd.path_arg(source);
    }
    for object in unit.objects {
      cmd.path_arg(object);
    }
    cmd.arg(format!("/Fe{}", unit.output.display()));
    cmd.arg("/link").args(self.descriptor.link_flags.iter().cloned());
    for dir in unit.lib_dirs {
      cmd.arg(format!("/LIBPATH:{}", dir.display()));
    }
    cmd.args(unit.libs.iter().cloned());
    cmd
  }

  fn describe_package(&self, name: &str, roots: &[PathBuf]) -> Result<Package, PackageError> {
    let arch = self.descriptor.arch;
    let candidates = candidate_dirs(roots, name);
    let mut other_arches: Vec<Arch> = Vec::new();

    for dir in &candidates {
      let lib_root = dir.join("lib");
      let own = lib_root.join(arch.msvc_dir());
      if own.is_dir() {
        debug!(package = %name, dir = %dir.display(), "matched visual c++ layout");
        return self.package_from(name, dir, &own);
      }

      let found: Vec<Arch> = Arch::ALL
        .into_iter()
        .filter(|a| *a != arch && lib_root.join(a.msvc_dir()).is_dir())
        .collect();

      if found.is_empty() && !files_with_suffix(&lib_root, &[".lib"])?.is_empty() {
        debug!(package = %name, dir = %dir.display(), "matched arch-neutral lib layout");
        return self.package_from(name, dir, &lib_root);
      }

      for a in found {
        if !other_arches.contains(&a) {
          other_arches.push(a);
        }
      }
    }

    if !other_arches.is_empty() {
      return Err(PackageError::ToolchainMismatch {
        name: name.to_string(),
        expected: arch,
        found: other_arches,
      });
    }

    Err(PackageError::NotFound {
      name: name.to_string(),
      searched: roots.to_vec(),
    })
  }
}
