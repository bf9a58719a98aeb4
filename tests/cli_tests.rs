mod common;

use std::fs;
use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const TEMPLATE: &str = "[.rs]\n// Copyright (c) {regex:\\d{4}(-\\d{4})?} Test Company\n";

fn renotice(dir: &Path) -> Command {
  let mut cmd = Command::cargo_bin("renotice").expect("binary builds");
  cmd.current_dir(dir);
  cmd
}

fn setup_workspace() -> Result<tempfile::TempDir> {
  let temp_dir = tempdir()?;
  fs::write(temp_dir.path().join("copyright.txt"), TEMPLATE)?;
  fs::create_dir_all(temp_dir.path().join("src"))?;
  fs::write(temp_dir.path().join("src/main.rs"), "fn main() {}\n")?;
  fs::write(temp_dir.path().join("src/lib.rs"), "pub fn add() {}\n")?;
  Ok(temp_dir)
}

#[test]
fn test_version_reports_crate_version() -> Result<()> {
  let temp_dir = tempdir()?;

  renotice(temp_dir.path())
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));

  Ok(())
}

#[test]
fn test_check_mode_exits_one_when_headers_are_missing() -> Result<()> {
  let temp_dir = setup_workspace()?;

  renotice(temp_dir.path())
    .args(["--no-git", "src"])
    .assert()
    .code(1)
    .stdout(predicate::str::contains("missing a copyright header"));

  // Check mode never touches files.
  assert_eq!(fs::read_to_string(temp_dir.path().join("src/main.rs"))?, "fn main() {}\n");

  Ok(())
}

#[test]
fn test_modify_inserts_headers_and_check_passes_afterwards() -> Result<()> {
  let temp_dir = setup_workspace()?;

  renotice(temp_dir.path())
    .args(["--no-git", "--modify", "src"])
    .assert()
    .success();

  let main = fs::read_to_string(temp_dir.path().join("src/main.rs"))?;
  assert!(main.starts_with("// Copyright (c)"));
  assert!(main.contains("Test Company"));

  renotice(temp_dir.path())
    .args(["--no-git", "src"])
    .assert()
    .success()
    .stdout(predicate::str::contains("All files carry an up-to-date copyright header"));

  Ok(())
}

#[test]
fn test_malformed_template_exits_two() -> Result<()> {
  let temp_dir = tempdir()?;
  fs::write(temp_dir.path().join("copyright.txt"), "no section header here\n")?;
  fs::create_dir_all(temp_dir.path().join("src"))?;
  fs::write(temp_dir.path().join("src/main.rs"), "fn main() {}\n")?;

  renotice(temp_dir.path())
    .args(["--no-git", "src"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("malformed template file"));

  Ok(())
}

#[test]
fn test_missing_patterns_exits_two() -> Result<()> {
  let temp_dir = tempdir()?;

  renotice(temp_dir.path())
    .assert()
    .code(2)
    .stderr(predicate::str::contains("Missing required argument"));

  Ok(())
}

#[test]
fn test_quiet_mode_prints_only_paths() -> Result<()> {
  let temp_dir = setup_workspace()?;

  renotice(temp_dir.path())
    .args(["--no-git", "--quiet", "src"])
    .assert()
    .code(1)
    .stdout(predicate::str::contains("main.rs"))
    .stdout(predicate::str::contains("Summary").not());

  Ok(())
}

#[test]
fn test_ignore_pattern_skips_files() -> Result<()> {
  let temp_dir = setup_workspace()?;

  renotice(temp_dir.path())
    .args(["--no-git", "--modify", "--ignore", "lib.rs", "src"])
    .assert()
    .success();

  assert_eq!(
    fs::read_to_string(temp_dir.path().join("src/lib.rs"))?,
    "pub fn add() {}\n"
  );
  let main = fs::read_to_string(temp_dir.path().join("src/main.rs"))?;
  assert!(main.starts_with("// Copyright (c)"));

  Ok(())
}

#[test]
fn test_json_report_is_written() -> Result<()> {
  let temp_dir = setup_workspace()?;
  let report_path = temp_dir.path().join("report.json");

  renotice(temp_dir.path())
    .args(["--no-git", "--report-json"])
    .arg(&report_path)
    .arg("src")
    .assert()
    .code(1);

  let report = fs::read_to_string(&report_path)?;
  assert!(report.contains("total_files"));
  assert!(report.contains("inserted"));

  Ok(())
}

#[test]
fn test_fixed_template_flag_overrides_hierarchy() -> Result<()> {
  let temp_dir = setup_workspace()?;
  let fixed = "[.rs]\n// Copyright (c) {regex:\\d{4}(-\\d{4})?} Other Division\n";
  fs::write(temp_dir.path().join("HEADER.txt"), fixed)?;

  renotice(temp_dir.path())
    .args(["--no-git", "--modify", "--template", "HEADER.txt", "src"])
    .assert()
    .success();

  let main = fs::read_to_string(temp_dir.path().join("src/main.rs"))?;
  assert!(main.contains("Other Division"));
  assert!(!main.contains("Test Company"));

  Ok(())
}

#[test]
fn test_config_file_supplies_defaults() -> Result<()> {
  let temp_dir = tempdir()?;
  fs::write(
    temp_dir.path().join(".renotice.toml"),
    "template-filename = \"NOTICE.txt\"\n",
  )?;
  fs::write(temp_dir.path().join("NOTICE.txt"), TEMPLATE)?;
  fs::create_dir_all(temp_dir.path().join("src"))?;
  fs::write(temp_dir.path().join("src/main.rs"), "fn main() {}\n")?;

  renotice(temp_dir.path())
    .args(["--no-git", "--modify", "src"])
    .assert()
    .success();

  let main = fs::read_to_string(temp_dir.path().join("src/main.rs"))?;
  assert!(main.starts_with("// Copyright (c)"));

  Ok(())
}
