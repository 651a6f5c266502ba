//! `kiln plan` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn plan_lists_stale_actions_without_building() {
  let env = TestEnv::game();

  env
    .kiln("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("engine::game.o"))
    .stdout(predicate::str::contains("never built"))
    .stdout(predicate::str::contains("Would run: 3"));

  assert!(!env.path("bin-gcc").exists());
  assert!(!env.path("build-gcc").exists());
}

#[test]
fn plan_after_build_is_up_to_date() {
  let env = TestEnv::game();
  env.kiln("build").assert().success();

  env
    .kiln("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("everything up to date"));
}

#[test]
fn plan_reports_edited_source() {
  let env = TestEnv::game();
  env.kiln("build").assert().success();
  env.write_file("src/game.cpp", "game v2\n");

  let output = env.kiln("plan").arg("--json").assert().success().get_output().stdout.clone();
  let plan: serde_json::Value = serde_json::from_slice(&output).unwrap();

  assert_eq!(plan["backend"], "mingw");
  assert_eq!(plan["stale"], 2);
  let status = |label: &str| {
    plan["actions"]
      .as_array()
      .unwrap()
      .iter()
      .find(|a| a["label"] == label)
      .unwrap()["staleness"]
      .clone()
  };
  assert_eq!(status("engine::game.o"), "inputs_changed");
  assert_eq!(status("game"), "dependency_rebuilt");
  assert_eq!(status("SDL3.dll"), "up_to_date");
}
