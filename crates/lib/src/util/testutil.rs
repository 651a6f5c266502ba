//! Test utilities for kiln-lib.
//!
//! [`ScriptToolchain`] is a toolchain double whose compile and link steps are
//! `/bin/sh` one-liners, so scheduler tests run real processes without a C++
//! compiler installed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::package::{Package, PackageError};
use crate::toolchain::{CommandSpec, CompileUnit, LinkUnit, Toolchain, ToolchainDescriptor, ToolchainFlavor};

/// Copies the source to the object, failing when the source contains `FAIL`.
const COMPILE_SCRIPT: &str = r#"if grep -q FAIL "$1"; then echo "error: $1" >&2; exit 1; fi; cp "$1" "$2""#;

/// Concatenates every non-flag argument after the output into the output.
const LINK_SCRIPT: &str = r#"out="$1"; shift; : > "$out"; for f in "$@"; do case "$f" in -*) ;; *) if grep -q FAIL "$f"; then echo "undefined reference in $f" >&2; exit 1; fi; cat "$f" >> "$out";; esac; done"#;

/// Toolchain double counting package scans.
///
/// Named `name`, it builds into `<root>/build-<name>` and `<root>/bin-<name>`.
/// `describe_package("missing")` fails with `NotFound`; any other name yields
/// a package under `<root>/pkgs/<name>`.
#[derive(Debug)]
pub struct ScriptToolchain {
  descriptor: ToolchainDescriptor,
  scans: AtomicUsize,
  runtime_files: Vec<PathBuf>,
}

impl ScriptToolchain {
  pub fn new(name: &str, root: &Path) -> Self {
    let descriptor = ToolchainDescriptor::new(
      name,
      ToolchainFlavor::Gnu,
      format!("build-{name}"),
      format!("bin-{name}"),
      root,
    );
    Self {
      descriptor,
      scans: AtomicUsize::new(0),
      runtime_files: Vec::new(),
    }
  }

  pub fn with_compile_flags(mut self, flags: &[&str]) -> Self {
    self.descriptor = self.descriptor.with_compile_flags(flags.iter().copied());
    self
  }

  /// Runtime file reported for every described package.
  pub fn with_runtime_file(mut self, path: PathBuf) -> Self {
    self.runtime_files.push(path);
    self
  }

  /// Number of `describe_package` calls so far.
  pub fn scans(&self) -> usize {
    self.scans.load(Ordering::SeqCst)
  }

  fn sh(&self, script: &str, step: &str) -> CommandSpec {
    let mut cmd = CommandSpec::new("/bin/sh", self.descriptor.build_path());
    cmd.arg("-c").arg(script).arg(step);
    cmd
  }
}

impl Toolchain for ScriptToolchain {
  fn descriptor(&self) -> &ToolchainDescriptor {
    &self.descriptor
  }

  fn compile(&self, unit: &CompileUnit<'_>) -> CommandSpec {
    let mut cmd = self.sh(COMPILE_SCRIPT, "compile");
    cmd.path_arg(unit.source).path_arg(unit.output);
    cmd.args(self.descriptor.compile_flags.iter().cloned());
    for dir in unit.include_dirs {
      cmd.arg(format!("-I{}", dir.display()));
    }
    cmd
  }

  fn link(&self, unit: &LinkUnit<'_>) -> CommandSpec {
    let mut cmd = self.sh(LINK_SCRIPT, "link");
    cmd.path_arg(unit.output);
    for input in unit.sources.iter().chain(unit.objects) {
      cmd.path_arg(input);
    }
    for dir in unit.lib_dirs {
      cmd.arg(format!("-L{}", dir.display()));
    }
    for lib in unit.libs {
      cmd.arg(format!("-l{}", lib));
    }
    cmd
  }

  fn describe_package(&self, name: &str, roots: &[PathBuf]) -> Result<Package, PackageError> {
    self.scans.fetch_add(1, Ordering::SeqCst);
    if name == "missing" {
      return Err(PackageError::NotFound {
        name: name.to_string(),
        searched: roots.to_vec(),
      });
    }

    let prefix = self.descriptor.root_dir.join("pkgs").join(name);
    let mut package = Package::new(name);
    package.include_paths.insert(prefix.join("include"));
    package.lib_paths.insert(prefix.join("lib"));
    package.push_lib(name);
    package.runtime_files.extend(self.runtime_files.iter().cloned());
    Ok(package)
  }
}
