//! # Diff Module
//!
//! Renders diffs between a file's current content and the content a run
//! would write. Used in check mode to show what an insertion or replacement
//! would change before anyone opts into `--modify`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use similar::{ChangeTag, TextDiff};

use crate::error_log;

/// Manages diff rendering for header changes.
///
/// Handles displaying diffs to stderr with change markers and appending them
/// to a consolidated diff file.
pub struct DiffManager {
  /// Whether to show diffs on stderr
  pub show_diff: bool,

  /// Path to append diffs to, if any
  pub save_diff_path: Option<PathBuf>,
}

impl DiffManager {
  /// Creates a new DiffManager with the specified configuration.
  pub fn new(show_diff: bool, save_diff_path: Option<PathBuf>) -> Self {
    Self {
      show_diff,
      save_diff_path,
    }
  }

  /// Whether rendering is enabled at all; callers can skip diff generation
  /// entirely when it is not.
  pub const fn is_active(&self) -> bool {
    self.show_diff || self.save_diff_path.is_some()
  }

  /// Displays and/or saves a diff between the current and would-be content.
  ///
  /// Diffs from multiple files are appended to the same save file, forming
  /// one consolidated diff for the run.
  ///
  /// # Parameters
  ///
  /// * `path` - Path to the file being processed
  /// * `original` - Current file content
  /// * `updated` - Content the run would write
  pub fn display_diff(&self, path: &Path, original: &str, updated: &str) -> Result<()> {
    if !self.is_active() {
      return Ok(());
    }

    let diff = TextDiff::from_lines(original, updated);
    let mut diff_content = format!("Diff for {}:\n", path.display());

    for change in diff.iter_all_changes() {
      let sign = match change.tag() {
        ChangeTag::Delete => "-",
        ChangeTag::Insert => "+",
        ChangeTag::Equal => " ",
      };
      diff_content.push_str(&format!("{sign}{change}"));
    }
    diff_content.push('\n');

    if self.show_diff {
      eprint!("{diff_content}");
    }

    if let Some(ref diff_path) = self.save_diff_path {
      match OpenOptions::new().create(true).append(true).open(diff_path) {
        Ok(mut file) => {
          if let Err(e) = file.write_all(diff_content.as_bytes()) {
            error_log!("Error writing to diff file: {e}");
          }
        }
        Err(e) => {
          error_log!("Error opening diff file: {e}");
        }
      }
    }

    Ok(())
  }
}
