#![cfg(unix)]

use assert_cmd::cargo::cargo_bin_cmd;
use ocusage_testing::{ExportFixture, SessionFixture, TestWorld};
use predicates::prelude::*;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

fn two_session_world() -> TestWorld {
    TestWorld::new()
        .with_session(
            SessionFixture::new("ses_a").project("p1").directory("api").at(0),
            ExportFixture::new("ses_a")
                .user("msg_u1", 0)
                .assistant("msg_a1", 1_000, 100, 20)
                .assistant("msg_a2", 2_000, 50, 10),
        )
        .with_session(
            SessionFixture::new("ses_b").project("p1").directory("web").at(10_000),
            ExportFixture::new("ses_b").assistant("msg_b1", 11_000, 5, 5),
        )
}

/// Fake `ccusage` that records its environment and arguments, then exits with `code`
fn fake_ccusage(world: &TestWorld, code: i32) -> PathBuf {
    let log = world.temp_dir().join("ccusage.log");
    let path = world.temp_dir().join("bin").join("ccusage");
    std::fs::write(
        &path,
        format!(
            "#!/bin/sh\necho \"$CLAUDE_CONFIG_DIR $*\" >> '{}'\nexit {}\n",
            log.display(),
            code
        ),
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn ccusage_log(world: &TestWorld) -> String {
    std::fs::read_to_string(world.temp_dir().join("ccusage.log")).unwrap_or_default()
}

#[test]
fn test_clean_export_prints_one_line() {
    let world = two_session_world();

    let mut cmd = cargo_bin_cmd!("ocusage");
    world.configure_command(&mut cmd).arg("export");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 sessions (3 messages)"))
        .stdout(predicate::str::contains("Export summary").not());

    assert_eq!(world.output_files().len(), 2);
}

#[test]
fn test_output_dir_flag_overrides_config() {
    let world = two_session_world();
    let elsewhere = world.temp_dir().join("elsewhere");

    let mut cmd = cargo_bin_cmd!("ocusage");
    world
        .configure_command(&mut cmd)
        .arg("export")
        .arg("--output-dir")
        .arg(&elsewhere)
        .arg("--grouping")
        .arg("flat");
    cmd.assert().success();

    assert!(world.output_files().is_empty());
    assert!(elsewhere.join("projects/opencode/ses_a.jsonl").is_file());
    assert!(elsewhere.join("projects/opencode/ses_b.jsonl").is_file());
}

#[test]
fn test_verbose_prints_summary_and_debug_logs() {
    let world = two_session_world();

    let mut cmd = cargo_bin_cmd!("ocusage");
    world.configure_command(&mut cmd).args(["--verbose", "export"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Export summary"))
        .stdout(predicate::str::contains("Messages converted:  3"))
        .stderr(predicate::str::contains("Exported session"));
}

#[test]
fn test_session_errors_exit_with_two() {
    let world = two_session_world().with_failing_session(SessionFixture::new("ses_bad").at(20_000));

    let mut cmd = cargo_bin_cmd!("ocusage");
    world
        .configure_command(&mut cmd)
        .args(["export", "--max-retries", "0"]);
    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains("Failed:              1"))
        .stdout(predicate::str::contains("ses_bad"))
        .stderr(predicate::str::contains("simulated failure for ses_bad"));

    assert_eq!(world.output_files().len(), 2);
}

#[test]
fn test_missing_opencode_is_fatal() {
    let world = two_session_world().with_env("OCUSAGE_OPENCODE_BIN", "/nonexistent/opencode");

    let mut cmd = cargo_bin_cmd!("ocusage");
    world.configure_command(&mut cmd).arg("export");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("not available"));

    assert!(world.output_files().is_empty());
    assert!(world.export_calls().is_empty());
}

#[test]
fn test_dry_run_writes_nothing() {
    let world = two_session_world();

    let mut cmd = cargo_bin_cmd!("ocusage");
    world.configure_command(&mut cmd).args(["export", "--dry-run"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Would export 2 sessions"))
        .stderr(predicate::str::contains("Would write session file"));

    assert!(!world.output_dir().exists());
}

#[test]
fn test_dry_run_output_survives_rust_log() {
    let world = two_session_world().with_env("RUST_LOG", "error");

    let mut cmd = cargo_bin_cmd!("ocusage");
    world.configure_command(&mut cmd).args(["export", "--dry-run"]);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Would write session file"));
}

#[test]
fn test_rerun_skips_unless_overwrite() {
    let world = two_session_world();

    for _ in 0..2 {
        let mut cmd = cargo_bin_cmd!("ocusage");
        world.configure_command(&mut cmd).arg("export");
        cmd.assert().success();
    }
    assert_eq!(world.export_calls().len(), 2);

    let mut cmd = cargo_bin_cmd!("ocusage");
    world.configure_command(&mut cmd).args(["export", "--overwrite"]);
    cmd.assert().success();
    assert_eq!(world.export_calls().len(), 4);
}

#[test]
fn test_no_reasoning_flag() {
    let world = TestWorld::new().with_session(
        SessionFixture::new("ses_r"),
        ExportFixture::new("ses_r").assistant_with(
            "msg_1",
            1_000,
            serde_json::json!({
                "input": 10,
                "output": 100,
                "reasoning": 40,
                "cache": { "read": 0, "write": 0 }
            }),
        ),
    );

    let mut cmd = cargo_bin_cmd!("ocusage");
    world.configure_command(&mut cmd).args(["export", "--no-reasoning"]);
    cmd.assert().success();

    let path = world.output_file_for("ses_r").unwrap();
    let lines = world.read_lines(&path).unwrap();
    assert_eq!(lines[0]["message"]["usage"]["output_tokens"], 100);
}

#[test]
fn test_export_then_report() {
    let world = two_session_world();
    let ccusage = fake_ccusage(&world, 0);

    let mut cmd = cargo_bin_cmd!("ocusage");
    world
        .configure_command(&mut cmd)
        .args(["export", "--report", "--ccusage-bin"])
        .arg(&ccusage);
    cmd.assert().success();

    let log = ccusage_log(&world);
    assert_eq!(log.trim(), format!("{} daily", world.output_dir().display()));
}

#[test]
fn test_report_passes_arguments_and_exit_code() {
    let world = two_session_world();
    let ccusage = fake_ccusage(&world, 3);

    let mut cmd = cargo_bin_cmd!("ocusage");
    world
        .configure_command(&mut cmd)
        .arg("report")
        .arg("--ccusage-bin")
        .arg(&ccusage)
        .args(["monthly", "--json"]);
    cmd.assert().code(3);

    let log = ccusage_log(&world);
    assert!(log.ends_with("monthly --json\n"), "got: {}", log);
    assert!(log.starts_with(&world.output_dir().display().to_string()));
}

#[test]
fn test_report_without_ccusage_is_fatal() {
    let world = TestWorld::new();

    let mut cmd = cargo_bin_cmd!("ocusage");
    world
        .configure_command(&mut cmd)
        .args(["report", "--ccusage-bin", "/nonexistent/ccusage"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("npm install -g ccusage"));
}

#[test]
fn test_skip_validation_accepts_foreign_messages() {
    let world = TestWorld::new().with_session(
        SessionFixture::new("ses_a"),
        ExportFixture::new("ses_a").assistant("msg_1", 1_000, 1, 1),
    );
    let mut payload = ExportFixture::new("ses_other")
        .assistant("msg_1", 1_000, 1, 1)
        .to_json();
    payload["info"]["id"] = serde_json::json!("ses_a");
    std::fs::write(world.fixtures_dir().join("ses_a.json"), payload.to_string()).unwrap();

    let mut cmd = cargo_bin_cmd!("ocusage");
    world
        .configure_command(&mut cmd)
        .args(["export", "--max-retries", "0"]);
    cmd.assert().code(2);

    let mut cmd = cargo_bin_cmd!("ocusage");
    world
        .configure_command(&mut cmd)
        .args(["export", "--skip-validation"]);
    cmd.assert().success();
    assert!(world.output_file_for("ses_a").is_some());
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = cargo_bin_cmd!("ocusage");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("sessions"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("config"));
}
