//! Builds described by `kiln.toml`.

use kiln_lib::consts::MANIFEST_FILENAME;
use kiln_lib::execute::ExecuteConfig;
use kiln_lib::manifest::{BuildManifest, ManifestError};
use kiln_lib::session::Session;

use super::common::TestProject;

fn manifest_text(project: &TestProject) -> String {
  format!(
    r#"
active = "mingw"
package_roots = ["libs"]
packages = ["SDL3"]

[[backend]]
name = "mingw"
flavor = "gnu"
arch = "x86_64"
build_dir = "build-gcc"
bin_dir = "bin-gcc"
compile_flags = "-g -O0"
program = "{compiler}"

[[backend]]
name = "release"
flavor = "gnu"
arch = "x86_64"
build_dir = "build-rel"
bin_dir = "bin-rel"
compile_flags = ["-O2"]
program = "{compiler}"

[[object]]
name = "game.o"
source = "src/game.cpp"
namespace = "engine"
packages = ["SDL3"]

[[executable]]
name = "game"
sources = ["src/main.cpp"]
objects = ["engine::game.o"]
packages = ["SDL3"]

[stage]
packages = ["SDL3"]
"#,
    compiler = project.compiler.display()
  )
}

fn game_project() -> TestProject {
  let project = TestProject::new();
  project.write_file("src/main.cpp", "main\n");
  project.write_file("src/game.cpp", "game\n");
  project.install_mingw_package("SDL3", "3.2.4", &["SDL3.dll"]);
  let text = manifest_text(&project);
  project.write_file(MANIFEST_FILENAME, &text);
  project
}

fn load(project: &TestProject, backend: Option<&str>) -> Session {
  let manifest = BuildManifest::load(&project.root().join(MANIFEST_FILENAME)).unwrap();
  let mut session = Session::with_config(ExecuteConfig::default(), vec![]);
  manifest.apply(&mut session, backend).unwrap();
  session
}

#[test]
fn manifest_builds_and_stages() {
  let project = game_project();
  let report = load(&project, None).build_blocking().unwrap();

  assert_eq!(report.backend, "mingw");
  assert_eq!(report.executed.len(), 3);
  assert_eq!(project.read_file("bin-gcc/game"), "main\ngame\n");
  assert!(project.exists("build-gcc/engine/game.o"));
  assert!(project.exists("bin-gcc/SDL3.dll"));
}

#[test]
fn requested_backend_overrides_active() {
  let project = game_project();
  let report = load(&project, Some("release")).build_blocking().unwrap();

  assert_eq!(report.backend, "release");
  assert!(project.exists("bin-rel/game"));
  assert!(!project.exists("bin-gcc"));
}

#[test]
fn unknown_backend_is_rejected() {
  let project = game_project();
  let manifest = BuildManifest::load(&project.root().join(MANIFEST_FILENAME)).unwrap();
  let mut session = Session::with_config(ExecuteConfig::default(), vec![]);

  let err = manifest.apply(&mut session, Some("msvc")).unwrap_err();
  assert!(matches!(err, ManifestError::Registry(_)));
}

#[test]
fn missing_package_aborts_before_building() {
  let project = game_project();
  std::fs::remove_dir_all(project.root().join("libs")).unwrap();
  let manifest = BuildManifest::load(&project.root().join(MANIFEST_FILENAME)).unwrap();
  let mut session = Session::with_config(ExecuteConfig::default(), vec![]);

  let err = manifest.apply(&mut session, None).unwrap_err();
  assert!(matches!(err, ManifestError::Session(_)));
  assert!(err.to_string().contains("SDL3"));
  assert!(project.invocations().is_empty());
}
