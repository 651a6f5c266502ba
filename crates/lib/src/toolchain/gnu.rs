//! GCC-style drivers: `g++` (native or MinGW) and `zig c++`.
//!
//! Packages use either a MinGW triple prefix or a flat install prefix:
//!
//! ```text
//! SDL3-3.2.4/                       SDL3/
//! └── x86_64-w64-mingw32/           ├── include/
//!     ├── bin/      SDL3.dll        ├── lib/    libSDL3.so
//!     ├── include/                  └── bin/
//!     └── lib/      libSDL3.dll.a
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::package::layout::{absolute_runtime_file, candidate_dirs, files_with_suffix};
use crate::package::{Package, PackageError};
use crate::platform::Arch;

use super::{CommandSpec, CompileUnit, LinkUnit, Toolchain, ToolchainDescriptor};

/// Library suffixes in preference order; `.dll.a` must precede `.a`.
const LIB_SUFFIXES: [&str; 4] = [".dll.a", ".a", ".so", ".dylib"];

#[derive(Debug)]
pub struct GnuToolchain {
  descriptor: ToolchainDescriptor,
  program: &'static str,
  /// Arguments placed right after the program (`c++` for zig).
  driver_args: &'static [&'static str],
}

impl GnuToolchain {
  pub fn gnu(descriptor: ToolchainDescriptor) -> Self {
    Self {
      descriptor,
      program: "g++",
      driver_args: &[],
    }
  }

  pub fn zig(descriptor: ToolchainDescriptor) -> Self {
    Self {
      descriptor,
      program: "zig",
      driver_args: &["c++"],
    }
  }

  fn command(&self) -> CommandSpec {
    let program = self.descriptor.program.as_deref().unwrap_or(self.program);
    let mut cmd = CommandSpec::new(program, self.descriptor.build_path());
    cmd
      .args(self.driver_args.iter().copied())
      .args(self.descriptor.compile_flags.iter().cloned());
    cmd
  }

  fn package_from(&self, name: &str, prefix: &Path) -> Result<Package, PackageError> {
    let mut package = Package::new(name);

    let include = prefix.join("include");
    if include.is_dir() {
      package.include_paths.insert(include);
    }

    let lib_dir = prefix.join("lib");
    if lib_dir.is_dir() {
      package.lib_paths.insert(lib_dir.clone());
    }
    for lib in files_with_suffix(&lib_dir, &LIB_SUFFIXES)? {
      if let Some(stem) = lib.file_name().and_then(|n| n.to_str()).and_then(library_name) {
        package.push_lib(stem);
      }
    }

    for dll in files_with_suffix(&prefix.join("bin"), &[".dll"])? {
      package.runtime_files.insert(absolute_runtime_file(name, &dll)?);
    }

    Ok(package)
  }
}

/// `libSDL3.dll.a` -> `SDL3`. Files without the `lib` prefix are not linkable with `-l`.
fn library_name(file_name: &str) -> Option<&str> {
  let rest = file_name.strip_prefix("lib")?;
  LIB_SUFFIXES
    .iter()
    .find_map(|suffix| rest.strip_suffix(suffix))
    .filter(|stem| !stem.is_empty())
}

impl Toolchain for GnuToolchain {
  fn descriptor(&self) -> &ToolchainDescriptor {
    &self.descriptor
  }

  fn compile(&self, unit: &CompileUnit<'_>) -> CommandSpec {
    let mut cmd = self.command();
    cmd.arg("-c").path_arg(unit.source).arg("-o").path_arg(unit.output);
    for dir in unit.include_dirs {
      cmd.arg(format!("-I{}", dir.display()));
    }
    cmd
  }

  fn link(&self, unit: &LinkUnit<'_>) -> CommandSpec {
    let mut cmd = self.command();
    for dir in unit.include_dirs {
      cmd.arg(format!("-I{}", dir.display()));
    }
    for source in unit.sources {
      cmd.path_arg(source);
    }
    for object in unit.objects {
      cmd.path_arg(object);
    }
    cmd.arg("-o").path_arg(unit.output);
    cmd.args(self.descriptor.link_flags.iter().cloned());
    for dir in unit.lib_dirs {
      cmd.arg(format!("-L{}", dir.display()));
    }
    for lib in unit.libs {
      cmd.arg(format!("-l{}", lib));
    }
    cmd
  }

  fn describe_package(&self, name: &str, roots: &[PathBuf]) -> Result<Package, PackageError> {
    let arch = self.descriptor.arch;
    let candidates = candidate_dirs(roots, name);
    let mut other_arches: Vec<Arch> = Vec::new();

    for dir in &candidates {
      let own = dir.join(arch.mingw_triple());
      if own.is_dir() {
        debug!(package = %name, dir = %own.display(), "matched triple prefix");
        return self.package_from(name, &own);
      }

      if dir.join("include").is_dir() || dir.join("lib").is_dir() {
        debug!(package = %name, dir = %dir.display(), "matched flat prefix");
        return self.package_from(name, dir);
      }

      for a in Arch::ALL {
        if a != arch && dir.join(a.mingw_triple()).is_dir() && !other_arches.contains(&a) {
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
