//! Shared test helpers for CLI integration tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Concatenates its non-flag arguments into the `-o` output; fails on `FAIL`.
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

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Isolated project directory with a fake compiler.
pub struct TestEnv {
  pub temp: TempDir,
  pub manifest_path: PathBuf,
}

impl TestEnv {
  /// Create from a fixture manifest, pointing its backends at the fake compiler.
  pub fn from_fixture(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let compiler = temp.path().join("tools").join("fake-cxx");
    fs::create_dir_all(compiler.parent().unwrap()).unwrap();
    fs::write(&compiler, FAKE_CXX).unwrap();
    fs::set_permissions(&compiler, fs::Permissions::from_mode(0o755)).unwrap();

    let content = fs::read_to_string(fixture_path(name))
      .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
      .replace("@COMPILER@", &compiler.to_string_lossy());
    let manifest_path = temp.path().join("kiln.toml");
    fs::write(&manifest_path, content).unwrap();

    Self { temp, manifest_path }
  }

  /// The `game.toml` project: an engine object, a game executable and SDL3.
  pub fn game() -> Self {
    let env = Self::from_fixture("game.toml");
    env.write_file("src/main.cpp", "main\n");
    env.write_file("src/game.cpp", "game\n");
    env.install_sdl();
    env
  }

  pub fn install_sdl(&self) {
    let prefix = "libs/SDL3-3.2.4/x86_64-w64-mingw32";
    self.write_file(&format!("{prefix}/include/SDL3/SDL.h"), "");
    self.write_file(&format!("{prefix}/lib/libSDL3.dll.a"), "");
    self.write_file(&format!("{prefix}/bin/SDL3.dll"), "dll");
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// `kiln` with `-f` pointing at this project's manifest.
  pub fn kiln(&self, subcommand: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("kiln");
    cmd
      .arg(subcommand)
      .arg("-f")
      .arg(&self.manifest_path)
      .env_remove("KILN_JOBS")
      .env_remove("KILN_PACKAGE_PATH")
      .env_remove("KILN_LOG");
    cmd
  }
}
