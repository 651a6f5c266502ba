//! `kiln build` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn build_game_project() {
  let env = TestEnv::game();

  env
    .kiln("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("engine::game.o"))
    .stdout(predicate::str::contains("mingw: 3 executed"));

  assert_eq!(std::fs::read_to_string(env.path("bin-gcc/game")).unwrap(), "main\ngame\n");
  assert!(env.path("bin-gcc/SDL3.dll").exists());
  assert!(env.path("build-gcc/engine/game.o").exists());
}

#[test]
fn second_build_is_up_to_date() {
  let env = TestEnv::game();
  env.kiln("build").assert().success();

  env
    .kiln("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("everything up to date"));
}

#[test]
fn backend_flag_overrides_active() {
  let env = TestEnv::game();

  env
    .kiln("build")
    .arg("--backend")
    .arg("release")
    .assert()
    .success()
    .stdout(predicate::str::contains("release: 3 executed"));

  assert!(env.path("bin-rel/game").exists());
  assert!(!env.path("bin-gcc").exists());
}

#[test]
fn unknown_backend_fails() {
  let env = TestEnv::game();

  env
    .kiln("build")
    .arg("-b")
    .arg("msvc")
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown backend: msvc"));
}

#[test]
fn compile_error_fails_with_diagnostics() {
  let env = TestEnv::game();
  env.write_file("src/game.cpp", "FAIL\n");

  env
    .kiln("build")
    .arg("-j")
    .arg("1")
    .assert()
    .failure()
    .stderr(predicate::str::contains("compile engine::game.o failed"))
    .stderr(predicate::str::contains("error: FAIL"))
    .stderr(predicate::str::contains("link game not run: engine::game.o failed"))
    .stderr(predicate::str::contains("1 action(s) failed, 1 blocked"));

  assert!(env.path("bin-gcc/SDL3.dll").exists(), "staging runs despite the failure");
}

#[test]
fn json_report_lists_actions() {
  let env = TestEnv::from_fixture("hello.toml");
  env.write_file("hello.cpp", "hello\n");

  let output = env.kiln("build").arg("--json").assert().success().get_output().stdout.clone();
  let report: serde_json::Value = serde_json::from_slice(&output).unwrap();

  assert_eq!(report["backend"], "gcc");
  assert_eq!(report["executed"].as_array().unwrap().len(), 1);
  assert_eq!(report["executed"][0]["kind"], "link");
  assert_eq!(report["executed"][0]["label"], "hello");
  assert!(report["failed"].as_array().unwrap().is_empty());
}

#[test]
fn json_report_is_printed_on_failure() {
  let env = TestEnv::from_fixture("hello.toml");
  env.write_file("hello.cpp", "FAIL\n");

  let output = env.kiln("build").arg("--json").assert().failure().get_output().stdout.clone();
  let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
  assert_eq!(report["failed"][0]["label"], "hello");
  assert!(report["failed"][0]["error"].as_str().unwrap().contains("error: FAIL"));
}

#[test]
fn missing_manifest_fails() {
  let env = TestEnv::from_fixture("hello.toml");
  std::fs::remove_file(&env.manifest_path).unwrap();

  env
    .kiln("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("build description not found"));
}

#[test]
fn invalid_manifest_fails() {
  let env = TestEnv::from_fixture("hello.toml");
  std::fs::write(&env.manifest_path, "[[backend]]\nname = 3\n").unwrap();

  env
    .kiln("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid manifest"));
}
