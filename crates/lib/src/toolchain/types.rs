use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::STATE_FILENAME;
use crate::platform::{Arch, host_arch};

/// Which conforming [`Toolchain`](super::Toolchain) implementation a descriptor selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolchainFlavor {
  /// Microsoft `cl.exe` / `link.exe`.
  Msvc,
  /// GCC-compatible drivers (`g++`, MinGW, clang++).
  Gnu,
  /// `zig c++`, which takes GCC-style arguments.
  Zig,
}

impl ToolchainFlavor {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Msvc => "msvc",
      Self::Gnu => "gnu",
      Self::Zig => "zig",
    }
  }
}

impl fmt::Display for ToolchainFlavor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for ToolchainFlavor {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "msvc" | "cl" => Ok(Self::Msvc),
      "gnu" | "gcc" | "mingw" | "clang" => Ok(Self::Gnu),
      "zig" | "zigcc" => Ok(Self::Zig),
      other => Err(format!("unknown toolchain flavor: {}", other)),
    }
  }
}

/// Immutable record of one compiler/linker combination.
///
/// `build_dir` and `bin_dir` are relative to `root_dir` (absolute paths are
/// honoured as-is). Each descriptor should use its own pair so switching
/// backends never clobbers another backend's artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainDescriptor {
  /// Unique identity within a registry.
  pub name: String,
  pub flavor: ToolchainFlavor,
  /// Architecture the toolchain emits code for.
  pub arch: Arch,
  /// Intermediate objects and the persisted build state live here.
  pub build_dir: PathBuf,
  /// Linked executables and staged runtime files land here.
  pub bin_dir: PathBuf,
  /// Working root that relative sources and directories resolve against.
  pub root_dir: PathBuf,
  pub compile_flags: Vec<String>,
  pub link_flags: Vec<String>,
  /// Overrides the driver program (`cl`, `g++`, `zig`).
  pub program: Option<String>,
}

impl ToolchainDescriptor {
  pub fn new(
    name: impl Into<String>,
    flavor: ToolchainFlavor,
    build_dir: impl Into<PathBuf>,
    bin_dir: impl Into<PathBuf>,
    root_dir: impl Into<PathBuf>,
  ) -> Self {
    Self {
      name: name.into(),
      flavor,
      arch: host_arch(),
      build_dir: build_dir.into(),
      bin_dir: bin_dir.into(),
      root_dir: root_dir.into(),
      compile_flags: Vec::new(),
      link_flags: Vec::new(),
      program: None,
    }
  }

  pub fn with_arch(mut self, arch: Arch) -> Self {
    self.arch = arch;
    self
  }

  pub fn with_compile_flags<I, S>(mut self, flags: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.compile_flags = flags.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_link_flags<I, S>(mut self, flags: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.link_flags = flags.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_program(mut self, program: impl Into<String>) -> Self {
    self.program = Some(program.into());
    self
  }

  /// Absolute directory for intermediate objects.
  pub fn build_path(&self) -> PathBuf {
    self.root_dir.join(&self.build_dir)
  }

  /// Absolute directory for executables and staged files.
  pub fn bin_path(&self) -> PathBuf {
    self.root_dir.join(&self.bin_dir)
  }

  /// Location of this backend's persisted build state.
  pub fn state_path(&self) -> PathBuf {
    self.build_path().join(STATE_FILENAME)
  }

  /// Resolve a declared path against the working root.
  pub fn resolve_path(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.root_dir.join(path)
    }
  }
}

/// Split a flag string the way build scripts usually write them (`"-g -O0"`).
pub fn split_flags(flags: &str) -> Vec<String> {
  flags.split_whitespace().map(str::to_string).collect()
}

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  /// Working directory for the process.
  pub cwd: PathBuf,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: cwd.into(),
    }
  }

  pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(&mut self, args: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn path_arg(&mut self, path: &Path) -> &mut Self {
    self.arg(path.display().to_string())
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      if arg.contains(' ') {
        write!(f, " \"{}\"", arg)?;
      } else {
        write!(f, " {}", arg)?;
      }
    }
    Ok(())
  }
}

/// Everything a toolchain needs to turn one source file into an object.
#[derive(Debug, Clone, Copy)]
pub struct CompileUnit<'a> {
  pub source: &'a Path,
  pub output: &'a Path,
  pub include_dirs: &'a [PathBuf],
}

/// Everything a toolchain needs to produce an executable.
///
/// `sources` are compiled as part of the link step, the way `cl main.cpp a.obj`
/// or `g++ main.cpp a.o` do.
#[derive(Debug, Clone, Copy)]
pub struct LinkUnit<'a> {
  pub sources: &'a [PathBuf],
  pub objects: &'a [PathBuf],
  pub output: &'a Path,
  pub include_dirs: &'a [PathBuf],
  pub lib_dirs: &'a [PathBuf],
  pub libs: &'a [String],
}
