//! # File Filter Module
//!
//! Components for filtering the files a run processes: glob ignore
//! patterns from the CLI or config, plus a handful of built-in exclusions
//! (template definition files themselves, VCS metadata).

use std::path::Path;

use anyhow::{Context, Result};
use glob::Pattern;

use crate::verbose_log;

/// Result of a file filtering operation.
pub struct FilterResult {
  /// Whether the file should be processed
  pub should_process: bool,
  /// Reason why the file should not be processed (if any)
  pub reason: Option<String>,
}

impl FilterResult {
  /// Creates a new FilterResult indicating the file should be processed.
  pub const fn process() -> Self {
    Self {
      should_process: true,
      reason: None,
    }
  }

  /// Creates a new FilterResult indicating the file should be skipped.
  pub fn skip(reason: impl Into<String>) -> Self {
    Self {
      should_process: false,
      reason: Some(reason.into()),
    }
  }
}

/// Trait for components that filter files based on certain criteria.
pub trait FileFilter: Send + Sync {
  /// Determines whether a file should be processed.
  ///
  /// # Parameters
  ///
  /// * `path` - The path to the file to check
  ///
  /// # Returns
  ///
  /// A `FilterResult` indicating whether the file should be processed and why
  /// not if applicable.
  fn should_process(&self, path: &Path) -> Result<FilterResult>;
}

/// Filter that excludes files matching glob ignore patterns.
///
/// Patterns match both the full path and the bare file name, so `*.bak`
/// works without a leading `**/`.
pub struct IgnoreFilter {
  patterns: Vec<Pattern>,
}

impl IgnoreFilter {
  /// Compiles a list of glob patterns into a filter.
  ///
  /// # Errors
  ///
  /// Fails when a pattern is not a valid glob.
  pub fn from_patterns(patterns: &[String]) -> Result<Self> {
    let patterns = patterns
      .iter()
      .map(|raw| Pattern::new(raw).with_context(|| format!("invalid ignore pattern: {raw}")))
      .collect::<Result<Vec<_>>>()?;
    Ok(Self { patterns })
  }

  fn is_ignored(&self, path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy());
    self.patterns.iter().any(|pattern| {
      pattern.matches_path(path) || name.as_deref().is_some_and(|file_name| pattern.matches(file_name))
    })
  }
}

impl FileFilter for IgnoreFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    if self.is_ignored(path) {
      verbose_log!("Skipping: {} (matches ignore pattern)", path.display());
      Ok(FilterResult::skip("Matches ignore pattern"))
    } else {
      Ok(FilterResult::process())
    }
  }
}

/// Filter that excludes the template definition files themselves; rewriting
/// the file that defines the header would be circular.
pub struct TemplateFileFilter {
  filename: String,
}

impl TemplateFileFilter {
  pub const fn new(filename: String) -> Self {
    Self { filename }
  }
}

impl FileFilter for TemplateFileFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    let matches = path
      .file_name()
      .is_some_and(|name| name.to_string_lossy().eq_ignore_ascii_case(&self.filename));
    if matches {
      Ok(FilterResult::skip("Template definition file"))
    } else {
      Ok(FilterResult::process())
    }
  }
}

/// Filter that combines multiple filters.
pub struct CompositeFilter {
  filters: Vec<Box<dyn FileFilter>>,
}

impl CompositeFilter {
  /// Creates a new CompositeFilter with the given filters.
  pub fn new(filters: Vec<Box<dyn FileFilter>>) -> Self {
    Self { filters }
  }

  /// Adds a filter to this CompositeFilter.
  pub fn add_filter(&mut self, filter: Box<dyn FileFilter>) {
    self.filters.push(filter);
  }
}

impl FileFilter for CompositeFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    for filter in &self.filters {
      let result = filter.should_process(path)?;
      if !result.should_process {
        return Ok(result);
      }
    }
    Ok(FilterResult::process())
  }
}

/// Constructs the default filter chain for a run.
///
/// # Parameters
///
/// * `ignore_patterns` - Glob patterns for files to ignore
/// * `template_filename` - Name of the template definition file to exclude
///
/// # Returns
///
/// A new CompositeFilter with the specified filters.
pub fn create_default_filter(ignore_patterns: &[String], template_filename: &str) -> Result<CompositeFilter> {
  let filters: Vec<Box<dyn FileFilter>> = vec![
    Box::new(IgnoreFilter::from_patterns(ignore_patterns)?),
    Box::new(TemplateFileFilter::new(template_filename.to_string())),
  ];
  Ok(CompositeFilter::new(filters))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ignore_filter_matches_globs() {
    let patterns = vec!["*.bak".to_string(), "tmp/*".to_string()];
    let filter = IgnoreFilter::from_patterns(&patterns).unwrap();

    assert!(filter.should_process(Path::new("src/main.rs")).unwrap().should_process);

    let result = filter.should_process(Path::new("src/main.rs.bak")).unwrap();
    assert!(!result.should_process);
    assert!(result.reason.is_some());

    assert!(!filter.should_process(Path::new("tmp/scratch.py")).unwrap().should_process);
  }

  #[test]
  fn invalid_pattern_is_rejected() {
    assert!(IgnoreFilter::from_patterns(&["[".to_string()]).is_err());
  }

  #[test]
  fn template_files_are_excluded() {
    let filter = TemplateFileFilter::new("copyright.txt".to_string());
    assert!(!filter.should_process(Path::new("sub/copyright.txt")).unwrap().should_process);
    assert!(filter.should_process(Path::new("sub/module.py")).unwrap().should_process);
  }

  #[test]
  fn composite_filter_short_circuits_on_skip() {
    let mut composite = CompositeFilter::new(Vec::new());

    struct MockFilter;
    impl FileFilter for MockFilter {
      fn should_process(&self, path: &Path) -> Result<FilterResult> {
        if path.to_string_lossy().contains("pass") {
          Ok(FilterResult::process())
        } else {
          Ok(FilterResult::skip("not a pass file"))
        }
      }
    }

    composite.add_filter(Box::new(MockFilter));

    assert!(composite.should_process(Path::new("src/pass_test.rs")).unwrap().should_process);
    assert!(!composite.should_process(Path::new("src/fail_test.rs")).unwrap().should_process);
  }
}
