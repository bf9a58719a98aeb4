use std::process::Command;

fn main() {
  // Full version string shown by `--version`: the crate version, plus the
  // commit hash and date when building inside a git checkout.
  let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
  let hash = git_output(&["rev-parse", "--short", "HEAD"]);
  let date = git_output(&["log", "-1", "--format=%cs"]);
  let full_version = if hash.is_empty() {
    pkg_version
  } else {
    format!("{pkg_version} ({hash} {date})")
  };
  println!("cargo:rustc-env=RENOTICE_VERSION={full_version}");

  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-changed=.git/HEAD");
}

fn git_output(args: &[&str]) -> String {
  Command::new("git")
    .args(args)
    .output()
    .ok()
    .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
    .unwrap_or_default()
}
