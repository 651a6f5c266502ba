//! `kiln clean` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn clean_requires_force_when_not_interactive() {
  let env = TestEnv::game();
  env.kiln("build").assert().success();

  env
    .kiln("clean")
    .assert()
    .failure()
    .stderr(predicate::str::contains("--force"));
  assert!(env.path("bin-gcc/game").exists());
}

#[test]
fn clean_removes_outputs_then_rebuild_runs_everything() {
  let env = TestEnv::game();
  env.kiln("build").assert().success();

  env
    .kiln("clean")
    .arg("--force")
    .assert()
    .success()
    .stdout(predicate::str::contains("removed 3 output(s)"));
  assert!(!env.path("bin-gcc/game").exists());
  assert!(!env.path("bin-gcc/SDL3.dll").exists());

  env
    .kiln("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("mingw: 3 executed"));
}

#[test]
fn clean_with_nothing_built() {
  let env = TestEnv::game();

  env
    .kiln("clean")
    .arg("--force")
    .assert()
    .success()
    .stdout(predicate::str::contains("nothing to clean"));
}
