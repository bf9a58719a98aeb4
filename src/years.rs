//! # Years Module
//!
//! Copyright year ranges and the rules for merging them with file
//! provenance. A range is rendered as `2021-2026`, or `2025` when it covers
//! a single year.
//!
//! Merging follows the provenance of the file being processed:
//! - an unchanged file keeps its existing range verbatim
//! - a modified (or untracked) file extends its range to cover both the
//!   provenance start year and the current year
//! - a file without an existing range starts at the provenance year (or the
//!   current year when provenance is unknown)

use std::fmt;
use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;

/// Matches `YYYY` or `YYYY-YYYY` with optional spaces around the dash.
static YEAR_RANGE_REGEX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b(\d{4})(?:\s*-\s*(\d{4}))?\b").expect("year range regex must compile"));

/// An inclusive copyright year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
  pub start: i32,
  pub end: i32,
}

impl YearRange {
  /// Creates a range, swapping the bounds if they arrive reversed.
  pub fn new(start: i32, end: i32) -> Self {
    if end < start {
      Self { start: end, end: start }
    } else {
      Self { start, end }
    }
  }

  /// Creates a single-year range.
  pub const fn single(year: i32) -> Self {
    Self { start: year, end: year }
  }

  /// Extracts the first year range found in `text`.
  ///
  /// Accepts both `2024` and `2021-2024` forms. Returns `None` when the text
  /// contains no four-digit year.
  pub fn find_in(text: &str) -> Option<Self> {
    let caps = YEAR_RANGE_REGEX.captures(text)?;
    let start: i32 = caps.get(1)?.as_str().parse().ok()?;
    let end = match caps.get(2) {
      Some(m) => m.as_str().parse().ok()?,
      None => start,
    };
    Some(Self::new(start, end))
  }
}

impl fmt::Display for YearRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.start == self.end {
      write!(f, "{}", self.start)
    } else {
      write!(f, "{}-{}", self.start, self.end)
    }
  }
}

/// The current year in local time.
pub fn current_year() -> i32 {
  chrono::Local::now().year()
}

/// How the start of a year range is determined for files that need one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum YearPolicy {
  /// Every file shares the repository's inception year as its start year.
  #[default]
  ProjectWide,
  /// Each file starts at the year of its own first commit.
  PerFile,
}

/// Provenance facts for a single file, as far as they are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
  /// Start year supplied by the active [`YearPolicy`]: the repository
  /// inception year or the file's first-commit year. `None` outside a git
  /// repository or for files with no history.
  pub start_year: Option<i32>,
  /// Whether the file has uncommitted changes (untracked files count as
  /// modified). Non-git runs treat every file as modified.
  pub modified: bool,
}

impl Provenance {
  /// Provenance for runs without git awareness.
  pub const fn unknown() -> Self {
    Self {
      start_year: None,
      modified: true,
    }
  }
}

/// Merges an existing year range with provenance facts.
///
/// # Parameters
///
/// * `existing` - The range currently present in the file's header, if any
/// * `provenance` - Git-derived facts about the file
/// * `current_year` - The year to extend modified files to
///
/// # Returns
///
/// The range the header should carry after this run. Unchanged files keep
/// their range verbatim; modified files extend to cover both the provenance
/// start and the current year; files without a range start fresh at the
/// provenance year (falling back to the current year).
pub fn merge_years(existing: Option<YearRange>, provenance: Provenance, current_year: i32) -> YearRange {
  match existing {
    Some(range) if !provenance.modified => range,
    Some(range) => {
      let start = match provenance.start_year {
        Some(year) => range.start.min(year),
        None => range.start,
      };
      YearRange::new(start, range.end.max(current_year))
    }
    None => YearRange::new(provenance.start_year.unwrap_or(current_year), current_year),
  }
}
