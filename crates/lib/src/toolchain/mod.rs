//! Toolchain abstraction.
//!
//! A toolchain is a named compiler/linker combination. Every flavor conforms to
//! the same capability set ([`Toolchain`]): produce a compile command, produce a
//! link command, and describe a package in the layout that toolchain can
//! consume. The flavor is picked once, when a descriptor is turned into a
//! toolchain by [`from_descriptor`]; nothing downstream branches on it.
//!
//! # Submodules
//!
//! - [`msvc`] - `cl.exe` commands and Visual C++ package layout
//! - [`gnu`] - GCC-style commands (`g++`, `zig c++`) and MinGW/prefix package layout

pub mod gnu;
pub mod msvc;
mod types;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub use types::*;

use crate::package::{Package, PackageError};

/// The capability set every backend implements.
pub trait Toolchain: fmt::Debug + Send + Sync {
  /// The immutable descriptor this toolchain was built from.
  fn descriptor(&self) -> &ToolchainDescriptor;

  /// Command that compiles one source file into one object file.
  fn compile(&self, unit: &CompileUnit<'_>) -> CommandSpec;

  /// Command that links objects (and compiles direct sources) into an executable.
  fn link(&self, unit: &LinkUnit<'_>) -> CommandSpec;

  /// Search `roots` for package `name` in this toolchain's layout.
  ///
  /// The returned package is unstamped; [`PackageResolver`](crate::package::PackageResolver)
  /// records the backend and generation.
  fn describe_package(&self, name: &str, roots: &[PathBuf]) -> Result<Package, PackageError>;

  fn name(&self) -> &str {
    &self.descriptor().name
  }
}

/// Build the conforming implementation for a descriptor's flavor.
pub fn from_descriptor(descriptor: ToolchainDescriptor) -> Arc<dyn Toolchain> {
  match descriptor.flavor {
    ToolchainFlavor::Msvc => Arc::new(msvc::MsvcToolchain::new(descriptor)),
    ToolchainFlavor::Gnu => Arc::new(gnu::GnuToolchain::gnu(descriptor)),
    ToolchainFlavor::Zig => Arc::new(gnu::GnuToolchain::zig(descriptor)),
  }
}
