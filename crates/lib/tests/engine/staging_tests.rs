//! Staging runtime files next to executables.

use kiln_lib::action::ActionKind;
use kiln_lib::graph::GraphError;
use kiln_lib::session::BuildError;

use super::common::{TestProject, executed_labels};

#[test]
fn staged_files_land_in_bin_dir() {
  let project = TestProject::new();
  let readme = project.write_file("assets/readme.txt", "hello");
  let mut session = project.session(&["gcc"]);
  session.stage_files([readme]).unwrap();

  let report = session.build_blocking().unwrap();
  assert_eq!(report.executed_count(ActionKind::Copy), 1);
  assert_eq!(project.read_file("bin-gcc/readme.txt"), "hello");
}

#[test]
fn restaging_the_same_file_is_a_no_op() {
  let project = TestProject::new();
  let dll = project.write_file("x.dll", "x");
  let mut session = project.session(&["gcc"]);
  session.stage_files([dll.clone()]).unwrap();
  session.stage_files([dll]).unwrap();

  assert_eq!(session.plan().unwrap().len(), 1);
}

#[test]
fn conflicting_sources_are_rejected() {
  let project = TestProject::new();
  let first = project.write_file("a/x.dll", "a");
  let second = project.write_file("b/x.dll", "b");
  let mut session = project.session(&["gcc"]);
  session.stage_files([first]).unwrap();

  let err = session.stage_files([second.clone()]).unwrap_err();
  match err {
    GraphError::StagingConflict { requested, .. } => assert_eq!(requested, second),
    other => panic!("expected staging conflict, got {other:?}"),
  }
}

#[test]
fn staged_file_colliding_with_executable_is_rejected() {
  let project = TestProject::new();
  project.write_file("main.cpp", "main\n");
  let other = project.write_file("vendor/app", "prebuilt");
  let mut session = project.session(&["gcc"]);
  session.declare_executable("app", &["main.cpp".into()], &[], &[]).unwrap();
  session.stage_files([other]).unwrap();

  let err = session.plan().unwrap_err();
  assert!(matches!(err, BuildError::Graph(GraphError::StagingConflict { .. })));
}

#[test]
fn changed_staged_file_is_copied_again() {
  let project = TestProject::new();
  let dll = project.write_file("x.dll", "v1");
  let mut session = project.session(&["gcc"]);
  session.stage_files([dll]).unwrap();
  session.build_blocking().unwrap();

  assert!(session.build_blocking().unwrap().executed.is_empty());

  project.write_file("x.dll", "v2");
  let report = session.build_blocking().unwrap();
  assert_eq!(executed_labels(&report), vec!["x.dll"]);
  assert_eq!(project.read_file("bin-gcc/x.dll"), "v2");
}

#[test]
fn staging_proceeds_when_compilation_fails() {
  let project = TestProject::new();
  project.write_file("bad.cpp", "FAIL\n");
  let dll = project.write_file("x.dll", "x");
  let mut session = project.session(&["gcc"]);
  let bad = session.declare_object("bad.o", "bad.cpp", &[]).unwrap();
  session.declare_executable("app", &[], &[bad], &[]).unwrap();
  session.stage_files([dll]).unwrap();

  let Err(BuildError::Failed(failed)) = session.build_blocking() else {
    panic!("expected aggregate failure");
  };
  assert_eq!(executed_labels(&failed.report), vec!["x.dll"]);
  assert!(project.exists("bin-gcc/x.dll"));
}

#[test]
fn missing_staged_source_fails_only_its_copy() {
  let project = TestProject::new();
  project.write_file("main.cpp", "main\n");
  let mut session = project.session(&["gcc"]);
  session.declare_executable("app", &["main.cpp".into()], &[], &[]).unwrap();
  session.stage_files([project.root().join("gone.dll")]).unwrap();

  let Err(BuildError::Failed(failed)) = session.build_blocking() else {
    panic!("expected aggregate failure");
  };
  assert_eq!(failed.report.failed.len(), 1);
  assert_eq!(failed.report.failed[0].label, "gone.dll");
  assert_eq!(executed_labels(&failed.report), vec!["app"]);
}
