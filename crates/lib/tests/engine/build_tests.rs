//! Full builds through a [`Session`].

use kiln_lib::action::ActionKind;
use kiln_lib::execute::ActionError;
use kiln_lib::registry::RegistryError;
use kiln_lib::session::BuildError;

use super::common::{TestProject, executed_labels};

fn game_project() -> TestProject {
  let project = TestProject::new();
  project.write_file("src/main.cpp", "main\n");
  project.write_file("src/game.cpp", "game\n");
  project.install_mingw_package("SDL3", "3.2.4", &["SDL3.dll"]);
  project
}

#[tokio::test]
async fn builds_namespaced_game_with_package() {
  let project = game_project();
  let mut session = project.session(&["mingw"]);

  let sdl = session.resolve_package("SDL3").unwrap();
  let game = session
    .with_namespace("engine", |s| s.declare_object("game.o", "src/game.cpp", &[sdl.clone()]))
    .unwrap()
    .unwrap();
  session
    .declare_executable("game", &["src/main.cpp".into()], &[game], &[sdl.clone()])
    .unwrap();
  session.stage_files(sdl.runtime_files.iter().cloned()).unwrap();

  let report = session.build().await.unwrap();

  assert_eq!(report.backend, "mingw");
  assert_eq!(report.executed_count(ActionKind::Compile), 1);
  assert_eq!(report.executed_count(ActionKind::Link), 1);
  assert_eq!(report.executed_count(ActionKind::Copy), 1);
  assert_eq!(project.read_file("build-mingw/engine/game.o"), "game\n");
  assert_eq!(project.read_file("bin-mingw/game"), "main\ngame\n");
  assert_eq!(project.read_file("bin-mingw/SDL3.dll"), "SDL3.dll contents");
}

#[test]
fn link_command_carries_package_search_paths() {
  let project = game_project();
  let mut session = project.session(&["mingw"]);

  let sdl = session.resolve_package("SDL3").unwrap();
  session
    .declare_executable("game", &["src/main.cpp".into()], &[], &[sdl])
    .unwrap();

  let planned = session.plan().unwrap();
  assert_eq!(planned.len(), 1);
  let command = &planned[0].command;
  assert!(command.contains("-lSDL3"), "missing -lSDL3 in {command}");
  assert!(command.contains("x86_64-w64-mingw32/lib"), "missing -L in {command}");
  assert!(command.contains("x86_64-w64-mingw32/include"), "missing -I in {command}");
}

#[tokio::test]
async fn link_failure_reports_diagnostics() {
  let project = TestProject::new();
  project.write_file("main.cpp", "FAIL\n");
  let mut session = project.session(&["gcc"]);
  session.declare_executable("app", &["main.cpp".into()], &[], &[]).unwrap();

  let err = session.build().await.unwrap_err();
  let BuildError::Failed(failed) = err else {
    panic!("expected aggregate failure");
  };
  assert_eq!(failed.report.failed.len(), 1);
  match &failed.report.failed[0].error {
    ActionError::LinkFailed { action, output, .. } => {
      assert_eq!(action, "app");
      assert!(output.contains("error: FAIL"), "diagnostics were {output}");
    }
    other => panic!("expected link failure, got {other:?}"),
  }
  assert!(!project.exists("bin-gcc/app"));
}

#[tokio::test]
async fn independent_failures_are_all_reported() {
  let project = TestProject::new();
  project.write_file("a.cpp", "FAIL a\n");
  project.write_file("b.cpp", "FAIL b\n");
  project.write_file("c.cpp", "c\n");
  let mut session = project.session(&["gcc"]);
  let a = session.declare_object("a.o", "a.cpp", &[]).unwrap();
  let b = session.declare_object("b.o", "b.cpp", &[]).unwrap();
  let c = session.declare_object("c.o", "c.cpp", &[]).unwrap();
  session.declare_executable("app", &[], &[a, b, c], &[]).unwrap();

  let Err(BuildError::Failed(failed)) = session.build().await else {
    panic!("expected aggregate failure");
  };
  let report = &failed.report;
  let mut failed_labels: Vec<&str> = report.failed.iter().map(|f| f.label.as_str()).collect();
  failed_labels.sort();
  assert_eq!(failed_labels, vec!["a.o", "b.o"]);
  assert_eq!(executed_labels(report), vec!["c.o"]);
  assert_eq!(report.blocked.len(), 1);
  assert_eq!(report.blocked[0].label, "app");

  let message = failed.to_string();
  assert!(message.contains("2 action(s) failed"));
  assert!(message.contains("a.o"));
  assert!(message.contains("b.o"));
}

#[test]
fn build_requires_an_active_backend() {
  let project = TestProject::new();
  let mut session = project.session(&[]);
  session.register_backend(project.backend("gcc")).unwrap();

  let err = session.build_blocking().unwrap_err();
  assert!(matches!(err, BuildError::Registry(RegistryError::NoActiveBackend)));
}

#[test]
fn backends_build_into_separate_directories() {
  let project = TestProject::new();
  project.write_file("main.cpp", "main\n");
  let mut session = project.session(&["debug", "release"]);
  session.declare_executable("app", &["main.cpp".into()], &[], &[]).unwrap();

  assert_eq!(session.build_blocking().unwrap().executed.len(), 1);
  session.activate_backend("release").unwrap();
  assert_eq!(session.build_blocking().unwrap().executed.len(), 1);
  assert!(project.exists("bin-debug/app"));
  assert!(project.exists("bin-release/app"));

  session.activate_backend("debug").unwrap();
  let report = session.build_blocking().unwrap();
  assert!(report.executed.is_empty());
  assert_eq!(report.skipped_count(), 1);
}

#[test]
fn unresolvable_package_is_reported() {
  let project = TestProject::new();
  let mut session = project.session(&["gcc"]);
  let err = session.resolve_package("Nope").unwrap_err();
  assert!(matches!(err, BuildError::Package(_)));
  assert!(err.to_string().contains("Nope"));
}
