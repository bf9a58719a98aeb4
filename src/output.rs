//! # Output Module
//!
//! This module centralizes all user-facing output for the renotice tool.
//! It provides consistent formatting, colors, and symbols for terminal output.
//!
//! ## Design Goals
//!
//! - **Informative**: Show actionable information without requiring flags
//! - **Scannable**: Use formatting to make output easy to parse visually
//! - **Progressive**: More detail with `-v`, silence with `-q`
//! - **Scriptable**: Keep stdout predictable for piping/automation

use std::path::Path;

use owo_colors::{OwoColorize, Stream};

use crate::logging::{is_quiet, is_verbose};
use crate::report::{FileAction, FileReport, ProcessingSummary};

/// Symbols used in output
pub mod symbols {
  /// Up to date / change applied
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Missing header / failure
  pub const FAILURE: &str = "\u{2717}"; // ✗
  /// Foreign or skipped
  pub const IGNORED: &str = "-";
  /// Header replaced or years refreshed
  pub const UPDATED: &str = "\u{21bb}"; // ↻
}

/// Maximum number of files to show in the default output before truncating
const DEFAULT_FILE_LIST_LIMIT: usize = 20;

/// Print the initial "Checking N files..." or "Updating N files..." message.
pub fn print_start_message(file_count: usize, modify_mode: bool) {
  if is_quiet() {
    return;
  }

  let verb = if modify_mode { "Updating" } else { "Checking" };
  let files_word = if file_count == 1 { "file" } else { "files" };

  println!("{} {} {}...", verb, file_count, files_word);
}

/// Print a blank line for visual separation (respects quiet mode).
pub fn print_blank_line() {
  if !is_quiet() {
    println!();
  }
}

/// Print the list of files without any copyright header.
///
/// In check mode these are the files that would receive a header; in modify
/// mode they are the files that just got one. In quiet mode only the paths
/// are printed, for scripting.
pub fn print_inserted_files(files: &[&FileReport], workspace_root: Option<&Path>, modify_mode: bool) {
  if files.is_empty() {
    return;
  }

  let sorted = sorted_by_path(files);
  if is_quiet() {
    print_paths_only(&sorted, workspace_root);
    return;
  }

  let count = sorted.len();
  let files_word = if count == 1 { "file" } else { "files" };
  if modify_mode {
    println!(
      "{} Inserted header in {} {}:",
      symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
      count,
      files_word
    );
  } else {
    println!(
      "{} {} {} missing a copyright header:",
      symbols::FAILURE.if_supports_color(Stream::Stdout, |s| s.red()),
      count,
      files_word
    );
  }
  print_file_list(&sorted, workspace_root);
}

/// Print the list of files whose header was (or would be) replaced.
///
/// Entries with a similarity score are reworded headers; entries without one
/// are pure year refreshes.
pub fn print_replaced_files(files: &[&FileReport], workspace_root: Option<&Path>, modify_mode: bool) {
  if files.is_empty() {
    return;
  }

  let sorted = sorted_by_path(files);
  if is_quiet() {
    print_paths_only(&sorted, workspace_root);
    return;
  }

  let count = sorted.len();
  let files_word = if count == 1 { "file" } else { "files" };
  let verb = if modify_mode { "Updated" } else { "Outdated" };
  println!(
    "{} {} header in {} {}:",
    symbols::UPDATED.if_supports_color(Stream::Stdout, |s| s.yellow()),
    verb,
    count,
    files_word
  );

  let show_all = is_verbose();
  let limit = if show_all { count } else { DEFAULT_FILE_LIST_LIMIT };
  for file in sorted.iter().take(limit) {
    let display_path = make_relative_path(&file.path, workspace_root);
    match (file.score, &file.years) {
      (Some(score), Some(years)) => println!("  {} (similarity {:.2}, {})", display_path, score, years),
      (None, Some(years)) => println!("  {} ({})", display_path, years),
      _ => println!("  {}", display_path),
    }
  }
  print_truncation_note(count, limit, show_all);
}

/// Print the list of files left untouched because their header belongs to
/// someone else. Only shown in verbose mode.
pub fn print_foreign_files(files: &[&FileReport], workspace_root: Option<&Path>) {
  if !is_verbose() || files.is_empty() {
    return;
  }

  let count = files.len();
  println!(
    "{} {} {} with a foreign header (left untouched):",
    symbols::IGNORED.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    count,
    if count == 1 { "file" } else { "files" }
  );
  for file in sorted_by_path(files) {
    let display_path = make_relative_path(&file.path, workspace_root);
    match file.score {
      Some(score) => println!("  {} (similarity {:.2})", display_path, score),
      None => println!("  {}", display_path),
    }
  }
}

/// Print the list of files that failed to read or write.
pub fn print_failed_files(files: &[&FileReport], workspace_root: Option<&Path>) {
  if is_quiet() || files.is_empty() {
    return;
  }

  let count = files.len();
  println!(
    "{} {} {} failed:",
    symbols::FAILURE.if_supports_color(Stream::Stdout, |s| s.red()),
    count,
    if count == 1 { "file" } else { "files" }
  );
  for file in sorted_by_path(files) {
    let display_path = make_relative_path(&file.path, workspace_root);
    match &file.detail {
      Some(detail) => println!("  {} ({})", display_path, detail),
      None => println!("  {}", display_path),
    }
  }
}

/// Print the success message when every file already carries its header.
pub fn print_all_files_ok() {
  if is_quiet() {
    return;
  }

  println!(
    "{} All files carry an up-to-date copyright header.",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green())
  );
}

/// Print the processing summary.
///
/// Format: "Summary: X OK, Y inserted, Z replaced, N foreign, M skipped"
/// In verbose mode, also shows timing.
pub fn print_summary(summary: &ProcessingSummary) {
  if is_quiet() {
    return;
  }

  let ok_str = summary
    .up_to_date
    .if_supports_color(Stream::Stdout, |s| s.cyan())
    .to_string();
  let inserted_str = colored_count(summary.inserted);
  let replaced_str = colored_count(summary.replaced);
  let foreign_str = summary
    .foreign
    .if_supports_color(Stream::Stdout, |s| s.dimmed())
    .to_string();
  let skipped_str = summary
    .skipped
    .if_supports_color(Stream::Stdout, |s| s.dimmed())
    .to_string();

  let mut summary_line = format!(
    "Summary: {} OK, {} inserted, {} replaced, {} foreign, {} skipped",
    ok_str, inserted_str, replaced_str, foreign_str, skipped_str
  );

  if summary.failed > 0 {
    summary_line.push_str(&format!(
      ", {} failed",
      summary.failed.if_supports_color(Stream::Stdout, |s| s.red())
    ));
  }

  if is_verbose() {
    summary_line.push_str(&format!(" ({:.2}s)", summary.processing_time.as_secs_f64()));
  }

  println!("{}", summary_line);
}

/// Print a hint for the user about what to do next.
pub fn print_hint(message: &str) {
  if is_quiet() {
    return;
  }

  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.yellow()));
}

fn colored_count(count: usize) -> String {
  if count > 0 {
    count.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string()
  } else {
    count.if_supports_color(Stream::Stdout, |s| s.cyan()).to_string()
  }
}

fn sorted_by_path<'a>(files: &[&'a FileReport]) -> Vec<&'a FileReport> {
  let mut sorted: Vec<_> = files.to_vec();
  sorted.sort_by(|a, b| a.path.cmp(&b.path));
  sorted
}

fn print_paths_only(files: &[&FileReport], workspace_root: Option<&Path>) {
  for file in files {
    println!("{}", make_relative_path(&file.path, workspace_root));
  }
}

fn print_file_list(files: &[&FileReport], workspace_root: Option<&Path>) {
  let count = files.len();
  let show_all = is_verbose();
  let limit = if show_all { count } else { DEFAULT_FILE_LIST_LIMIT };

  for file in files.iter().take(limit) {
    println!("  {}", make_relative_path(&file.path, workspace_root));
  }
  print_truncation_note(count, limit, show_all);
}

fn print_truncation_note(count: usize, limit: usize, show_all: bool) {
  if !show_all && count > limit {
    let remaining = count - limit;
    println!(
      "  {} ... and {} more (use -v to see all)",
      "".if_supports_color(Stream::Stdout, |s| s.dimmed()),
      remaining
    );
  }
}

/// Categorize file reports into different groups for output.
pub struct CategorizedReports<'a> {
  /// Files missing a header (inserted in modify mode)
  pub inserted: Vec<&'a FileReport>,
  /// Files with an outdated or reworded header (replaced in modify mode)
  pub replaced: Vec<&'a FileReport>,
  /// Files already carrying the canonical header
  pub ok: Vec<&'a FileReport>,
  /// Files with a foreign header, left untouched
  pub foreign: Vec<&'a FileReport>,
  /// Files skipped by filters or for lack of a template
  pub skipped: Vec<&'a FileReport>,
  /// Files that failed to read or write
  pub failed: Vec<&'a FileReport>,
}

impl<'a> CategorizedReports<'a> {
  /// Categorize a slice of file reports.
  pub fn from_reports(reports: &'a [FileReport]) -> Self {
    let mut inserted = Vec::new();
    let mut replaced = Vec::new();
    let mut ok = Vec::new();
    let mut foreign = Vec::new();
    let mut skipped = Vec::new();
    let mut failed = Vec::new();

    for report in reports {
      match report.action {
        FileAction::Inserted => inserted.push(report),
        FileAction::Replaced => replaced.push(report),
        FileAction::UpToDate => ok.push(report),
        FileAction::Foreign => foreign.push(report),
        FileAction::Skipped => skipped.push(report),
        FileAction::Failed => failed.push(report),
      }
    }

    Self {
      inserted,
      replaced,
      ok,
      foreign,
      skipped,
      failed,
    }
  }
}

/// Make a path relative to the workspace root for display.
fn make_relative_path(path: &Path, workspace_root: Option<&Path>) -> String {
  if let Some(root) = workspace_root {
    pathdiff::diff_paths(path, root)
      .map(|p| p.to_string_lossy().to_string())
      .unwrap_or_else(|| path.to_string_lossy().to_string())
  } else {
    path.to_string_lossy().to_string()
  }
}
