//! Shared helpers for engine integration tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use kiln_lib::execute::{BuildReport, ExecuteConfig};
use kiln_lib::platform::Arch;
use kiln_lib::session::Session;
use kiln_lib::toolchain::{ToolchainDescriptor, ToolchainFlavor};
use tempfile::TempDir;

/// Stand-in for `g++`.
///
/// Concatenates every non-flag argument into the `-o` output, failing when an
/// input contains `FAIL`. Each call appends its output path to
/// `invocations.log` next to the script.
const FAKE_CXX: &str = r#"#!/bin/sh
out=""
inputs=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) shift; out="$1" ;;
    -*) ;;
    *) inputs="$inputs $1" ;;
  esac
  shift
done
echo "$out" >> "$(dirname "$0")/invocations.log"
for f in $inputs; do
  if grep -q FAIL "$f"; then
    echo "$f:1:1: error: FAIL" >&2
    exit 1
  fi
done
: > "$out"
for f in $inputs; do
  cat "$f" >> "$out"
done
"#;

/// Isolated project directory with a fake compiler installed.
pub struct TestProject {
  pub temp: TempDir,
  pub compiler: PathBuf,
}

impl TestProject {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let tools = temp.path().join("tools");
    fs::create_dir_all(&tools).unwrap();
    let compiler = tools.join("fake-cxx");
    fs::write(&compiler, FAKE_CXX).unwrap();
    fs::set_permissions(&compiler, fs::Permissions::from_mode(0o755)).unwrap();
    Self { temp, compiler }
  }

  /// Canonical project root.
  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
    let path = self.root().join(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
  }

  pub fn read_file(&self, relative: &str) -> String {
    fs::read_to_string(self.root().join(relative)).unwrap()
  }

  pub fn exists(&self, relative: &str) -> bool {
    self.root().join(relative).exists()
  }

  /// x86_64 GCC backend `name` building into `build-<name>` and `bin-<name>`.
  pub fn backend(&self, name: &str) -> ToolchainDescriptor {
    ToolchainDescriptor::new(
      name,
      ToolchainFlavor::Gnu,
      format!("build-{name}"),
      format!("bin-{name}"),
      self.root(),
    )
    .with_arch(Arch::X86_64)
    .with_program(self.compiler.to_string_lossy())
  }

  /// Session with `backends` registered and the first one active.
  pub fn session(&self, backends: &[&str]) -> Session {
    let mut session = Session::with_config(ExecuteConfig::default().with_parallelism(4), vec![self.root().join("libs")]);
    for name in backends {
      session.register_backend(self.backend(name)).unwrap();
    }
    if let Some(first) = backends.first() {
      session.activate_backend(first).unwrap();
    }
    session
  }

  /// Output paths passed to the fake compiler, in call order.
  pub fn invocations(&self) -> Vec<String> {
    match fs::read_to_string(self.compiler.with_file_name("invocations.log")) {
      Ok(log) => log.lines().map(str::to_string).collect(),
      Err(_) => Vec::new(),
    }
  }

  /// Install a MinGW-layout package under `libs/`.
  pub fn install_mingw_package(&self, name: &str, version: &str, dlls: &[&str]) -> PathBuf {
    let prefix = self
      .root()
      .join("libs")
      .join(format!("{name}-{version}"))
      .join("x86_64-w64-mingw32");
    fs::create_dir_all(prefix.join("include")).unwrap();
    fs::create_dir_all(prefix.join("lib")).unwrap();
    fs::create_dir_all(prefix.join("bin")).unwrap();
    fs::write(prefix.join("lib").join(format!("lib{name}.dll.a")), "").unwrap();
    for dll in dlls {
      fs::write(prefix.join("bin").join(dll), format!("{dll} contents")).unwrap();
    }
    prefix
  }
}

/// Labels of executed actions, sorted.
pub fn executed_labels(report: &BuildReport) -> Vec<String> {
  let mut labels: Vec<String> = report.executed.iter().map(|a| a.label.clone()).collect();
  labels.sort();
  labels
}
