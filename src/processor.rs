//! # Processor Module
//!
//! Drives the whole run: collects candidate files from the given patterns,
//! filters them, evaluates each one against its resolved header template and
//! either reports (check mode) or rewrites (modify mode) the file. Files are
//! processed in parallel batches; all shared state is read-only except the
//! report sink.

use std::collections::HashSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::decision::{self, Decision, DecisionContext};
use crate::diff::DiffManager;
use crate::entity::EntityGuard;
use crate::file_filter::{CompositeFilter, FileFilter, create_default_filter};
use crate::git::ProvenanceIndex;
use crate::report::{FileAction, FileReport};
use crate::resolver::TemplateResolver;
use crate::years::{self, YearPolicy};
use crate::{info_log, verbose_log};

/// Number of files handed to each rayon task.
const BATCH_SIZE: usize = 8;

/// Configuration for a processor run.
pub struct ProcessorConfig {
  /// Root of the workspace being processed.
  pub workspace_root: PathBuf,
  /// Resolves the header template that governs each file.
  pub resolver: TemplateResolver,
  /// Guards replacements against headers owned by another organizational unit.
  pub guard: EntityGuard,
  /// Commit provenance for the workspace, or a no-git fallback.
  pub provenance: ProvenanceIndex,
  /// How the starting year of inserted headers is chosen.
  pub year_policy: YearPolicy,
  /// When `true`, files are rewritten in place; otherwise the run only reports.
  pub modify: bool,
  /// Glob patterns for files to skip entirely.
  pub ignore_patterns: Vec<String>,
  /// Name of the template definition files, which are never processed.
  pub template_filename: String,
  /// Diff display for files that would change.
  pub diff: DiffManager,
}

/// Parallel file processor.
///
/// Built once per run from a [`ProcessorConfig`]; `process` may then be called
/// with the user's path patterns. Reports accumulate across the run and are
/// read back with [`Processor::reports`].
pub struct Processor {
  config: ProcessorConfig,
  filter: CompositeFilter,
  reports: Arc<Mutex<Vec<FileReport>>>,
  files_processed: Arc<AtomicUsize>,
}

impl Processor {
  /// Creates a processor, building the default filter chain from the config.
  ///
  /// # Errors
  ///
  /// Returns an error if any ignore pattern is not a valid glob.
  pub fn new(config: ProcessorConfig) -> Result<Self> {
    let filter = create_default_filter(&config.ignore_patterns, &config.template_filename)?;
    Ok(Self {
      config,
      filter,
      reports: Arc::new(Mutex::new(Vec::new())),
      files_processed: Arc::new(AtomicUsize::new(0)),
    })
  }

  /// Processes all files matching the given patterns.
  ///
  /// Each pattern may be an existing file, an existing directory (traversed
  /// recursively), or a glob. Duplicate matches are processed once.
  ///
  /// # Returns
  ///
  /// `true` if any file needed a change (or failed), `false` if everything
  /// was already up to date.
  ///
  /// # Errors
  ///
  /// Returns an error for invalid glob patterns or a malformed template file.
  /// Per-file read and write failures do not abort the run; they surface as
  /// failed entries in the reports.
  pub fn process(&self, patterns: &[String]) -> Result<bool> {
    let files = self.collect_files(patterns)?;
    self.process_collected(&files)
  }

  /// Processes an already-collected list of files.
  ///
  /// Used when the caller wants the file count up front; see
  /// [`Processor::collect_files`].
  pub fn process_collected(&self, files: &[PathBuf]) -> Result<bool> {
    let start_time = std::time::Instant::now();
    debug!(
      "Processing {} files under {}",
      files.len(),
      self.config.workspace_root.display()
    );
    let current_year = years::current_year();
    let batches: Vec<&[PathBuf]> = files.chunks(BATCH_SIZE).collect();

    let batch_results: Result<Vec<Vec<FileReport>>> = batches
      .into_par_iter()
      .map(|batch| self.process_batch(batch, current_year))
      .collect();

    let mut all_reports = self.reports.lock().expect("mutex poisoned");
    for batch in batch_results? {
      all_reports.extend(batch);
    }

    let needs_changes = all_reports
      .iter()
      .any(|r| r.action.is_change() || r.action == FileAction::Failed);

    debug!(
      "Processed {} files in {}ms",
      self.files_processed.load(Ordering::Relaxed),
      start_time.elapsed().as_millis()
    );

    Ok(needs_changes)
  }

  /// Returns a snapshot of all reports accumulated so far.
  pub fn reports(&self) -> Vec<FileReport> {
    self.reports.lock().expect("mutex poisoned").clone()
  }

  /// Expands patterns into a deduplicated, sorted list of files.
  ///
  /// Each pattern may be an existing file, an existing directory (traversed
  /// recursively), or a glob. Symlinks are never followed.
  pub fn collect_files(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    let mut push = |path: PathBuf| {
      // Symlinks are skipped so a run never writes through to files
      // outside the workspace.
      match std::fs::symlink_metadata(&path) {
        Ok(meta) if meta.file_type().is_symlink() => {
          trace!("Skipping symlink: {}", path.display());
        }
        Ok(meta) if meta.is_file() => {
          let canonical = path.canonicalize().unwrap_or(path);
          if seen.insert(canonical.clone()) {
            files.push(canonical);
          }
        }
        _ => {}
      }
    };

    for pattern in patterns {
      let raw = PathBuf::from(pattern);
      if raw.is_file() {
        push(raw);
      } else if raw.is_dir() {
        for entry in WalkDir::new(&raw).into_iter().filter_map(|e| e.ok()) {
          if entry.file_type().is_file() {
            push(entry.path().to_path_buf());
          }
        }
      } else {
        let matches = glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))?;
        for path in matches.filter_map(|p| p.ok()) {
          push(path);
        }
      }
    }

    files.sort();
    Ok(files)
  }

  /// Processes one batch of files, returning the reports generated for it.
  fn process_batch(&self, batch: &[PathBuf], current_year: i32) -> Result<Vec<FileReport>> {
    let mut reports = Vec::with_capacity(batch.len());
    for path in batch {
      reports.push(self.process_file(path, current_year)?);
      self.files_processed.fetch_add(1, Ordering::Relaxed);
    }
    Ok(reports)
  }

  /// Evaluates a single file and, in modify mode, applies the outcome.
  ///
  /// Only template resolution failures abort the run; everything else is
  /// reported per file so the batch keeps going.
  fn process_file(&self, path: &Path, current_year: i32) -> Result<FileReport> {
    trace!("Processing file: {}", path.display());

    let filter_result = self.filter.should_process(path)?;
    if !filter_result.should_process {
      let reason = filter_result.reason.unwrap_or_else(|| "filtered".to_string());
      return Ok(FileReport::new(path.to_path_buf(), FileAction::Skipped).with_detail(reason));
    }

    let Some(set) = self.config.resolver.resolve(path)? else {
      verbose_log!("Skipping {}: no template file found", path.display());
      return Ok(FileReport::new(path.to_path_buf(), FileAction::Skipped).with_detail("no template file found"));
    };
    let Some(template) = set.for_path(path) else {
      verbose_log!("Skipping {}: no template section for this file type", path.display());
      return Ok(
        FileReport::new(path.to_path_buf(), FileAction::Skipped).with_detail("no template section for this file type"),
      );
    };

    let raw = match std::fs::read_to_string(path) {
      Ok(raw) => raw,
      Err(e) => {
        debug!("Failed to read {}: {}", path.display(), e);
        return Ok(FileReport::new(path.to_path_buf(), FileAction::Failed).with_detail(format!("read failed: {e}")));
      }
    };

    // Work on LF internally; the original line endings are restored on write.
    let uses_crlf = raw.contains("\r\n");
    let content = if uses_crlf { raw.replace("\r\n", "\n") } else { raw };

    let ctx = DecisionContext {
      template: template.as_ref(),
      guard: &self.config.guard,
      provenance: self.config.provenance.provenance_for(path, self.config.year_policy),
      current_year,
    };

    match decision::evaluate(&ctx, &content) {
      Decision::UpToDate => {
        trace!("Up to date: {}", path.display());
        Ok(FileReport::new(path.to_path_buf(), FileAction::UpToDate))
      }
      Decision::Insert { content: updated, years } => {
        if self.config.modify {
          info_log!("Inserting header in {} ({})", path.display(), years);
        } else {
          verbose_log!("Header missing in {} ({})", path.display(), years);
        }
        let report = FileReport::new(path.to_path_buf(), FileAction::Inserted).with_years(years.to_string());
        Ok(self.apply_change(path, &content, &updated, uses_crlf, report))
      }
      Decision::Replace {
        content: updated,
        years,
        score,
      } => {
        if self.config.modify {
          match score {
            Some(score) => info_log!(
              "Replacing header in {} (similarity {:.2}, {})",
              path.display(),
              score,
              years
            ),
            None => info_log!("Refreshing years in {} ({})", path.display(), years),
          }
        } else {
          verbose_log!("Header outdated in {} ({})", path.display(), years);
        }
        let report = FileReport::new(path.to_path_buf(), FileAction::Replaced)
          .with_years(years.to_string())
          .with_score(score);
        Ok(self.apply_change(path, &content, &updated, uses_crlf, report))
      }
      Decision::Foreign { score } => {
        verbose_log!(
          "Leaving foreign header in {} untouched (similarity {:.2})",
          path.display(),
          score
        );
        Ok(FileReport::new(path.to_path_buf(), FileAction::Foreign).with_score(Some(score)))
      }
    }
  }

  /// Shows the diff and, in modify mode, writes the updated content.
  ///
  /// A write failure downgrades the report to [`FileAction::Failed`] instead
  /// of aborting the run.
  fn apply_change(&self, path: &Path, original: &str, updated: &str, uses_crlf: bool, report: FileReport) -> FileReport {
    if self.config.diff.is_active()
      && let Err(e) = self.config.diff.display_diff(path, original, updated)
    {
      debug!("Failed to display diff for {}: {}", path.display(), e);
    }

    if !self.config.modify {
      return report;
    }

    let output = if uses_crlf {
      updated.replace('\n', "\r\n")
    } else {
      updated.to_string()
    };

    match write_atomic(path, &output) {
      Ok(()) => report,
      Err(e) => {
        debug!("Failed to write {}: {}", path.display(), e);
        FileReport::new(report.path, FileAction::Failed).with_detail(format!("write failed: {e}"))
      }
    }
  }
}

/// Writes content to `path` via a temporary file in the same directory,
/// retrying once before giving up.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
  match try_write_atomic(path, content) {
    Ok(()) => Ok(()),
    Err(e) => {
      debug!("Atomic write to {} failed ({}), retrying once", path.display(), e);
      try_write_atomic(path, content)
    }
  }
}

fn try_write_atomic(path: &Path, content: &str) -> Result<()> {
  let parent = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));
  let mut temp =
    tempfile::NamedTempFile::new_in(parent).with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
  temp
    .write_all(content.as_bytes())
    .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
  temp
    .persist(path)
    .with_context(|| format!("Failed to replace {}", path.display()))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;
  use crate::template::DEFAULT_TEMPLATE_FILENAME;

  const TEMPLATE: &str = r"[VARIABLES]
COMPANY = Acme Corporation

[.rs]
// Copyright (c) {regex:\d{4}(-\d{4})?} {COMPANY}
// All rights reserved.
";

  fn test_processor(root: &Path, modify: bool) -> Processor {
    let config = ProcessorConfig {
      workspace_root: root.to_path_buf(),
      resolver: TemplateResolver::hierarchical(root, DEFAULT_TEMPLATE_FILENAME),
      guard: EntityGuard::new(Vec::new()),
      provenance: ProvenanceIndex::without_git(),
      year_policy: YearPolicy::default(),
      modify,
      ignore_patterns: Vec::new(),
      template_filename: DEFAULT_TEMPLATE_FILENAME.to_string(),
      diff: DiffManager::new(false, None),
    };
    Processor::new(config).unwrap()
  }

  #[test]
  fn test_check_mode_leaves_files_untouched() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_TEMPLATE_FILENAME), TEMPLATE).unwrap();
    let file = dir.path().join("main.rs");
    fs::write(&file, "fn main() {}\n").unwrap();

    let processor = test_processor(dir.path(), false);
    let needs_changes = processor
      .process(&[dir.path().to_string_lossy().to_string()])
      .unwrap();

    assert!(needs_changes);
    assert_eq!(fs::read_to_string(&file).unwrap(), "fn main() {}\n");
    let reports = processor.reports();
    assert!(
      reports
        .iter()
        .any(|r| r.path.ends_with("main.rs") && r.action == FileAction::Inserted)
    );
  }

  #[test]
  fn test_modify_mode_inserts_header() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_TEMPLATE_FILENAME), TEMPLATE).unwrap();
    let file = dir.path().join("main.rs");
    fs::write(&file, "fn main() {}\n").unwrap();

    let processor = test_processor(dir.path(), true);
    processor
      .process(&[dir.path().to_string_lossy().to_string()])
      .unwrap();

    let written = fs::read_to_string(&file).unwrap();
    assert!(written.starts_with("// Copyright (c)"));
    assert!(written.contains("Acme Corporation"));
    assert!(written.ends_with("fn main() {}\n"));
  }

  #[test]
  fn test_modify_mode_is_idempotent() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_TEMPLATE_FILENAME), TEMPLATE).unwrap();
    let file = dir.path().join("lib.rs");
    fs::write(&file, "pub fn answer() -> u32 {\n  42\n}\n").unwrap();

    let processor = test_processor(dir.path(), true);
    processor
      .process(&[dir.path().to_string_lossy().to_string()])
      .unwrap();
    let first_pass = fs::read_to_string(&file).unwrap();

    let second = test_processor(dir.path(), true);
    let needs_changes = second
      .process(&[dir.path().to_string_lossy().to_string()])
      .unwrap();

    assert!(!needs_changes);
    assert_eq!(fs::read_to_string(&file).unwrap(), first_pass);
  }

  #[test]
  fn test_crlf_line_endings_preserved() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_TEMPLATE_FILENAME), TEMPLATE).unwrap();
    let file = dir.path().join("windows.rs");
    fs::write(&file, "fn main() {}\r\n").unwrap();

    let processor = test_processor(dir.path(), true);
    processor
      .process(&[dir.path().to_string_lossy().to_string()])
      .unwrap();

    let written = fs::read_to_string(&file).unwrap();
    assert!(written.contains("\r\n"));
    assert!(!written.replace("\r\n", "").contains('\n'));
    assert!(written.ends_with("fn main() {}\r\n"));
  }

  #[test]
  fn test_files_without_template_section_are_skipped() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_TEMPLATE_FILENAME), TEMPLATE).unwrap();
    let file = dir.path().join("notes.md");
    fs::write(&file, "# Notes\n").unwrap();

    let processor = test_processor(dir.path(), true);
    processor
      .process(&[dir.path().to_string_lossy().to_string()])
      .unwrap();

    assert_eq!(fs::read_to_string(&file).unwrap(), "# Notes\n");
    let reports = processor.reports();
    assert!(
      reports
        .iter()
        .any(|r| r.path.ends_with("notes.md") && r.action == FileAction::Skipped)
    );
  }

  #[test]
  fn test_missing_template_file_skips_instead_of_failing() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("main.rs");
    fs::write(&file, "fn main() {}\n").unwrap();

    let processor = test_processor(dir.path(), true);
    let needs_changes = processor
      .process(&[dir.path().to_string_lossy().to_string()])
      .unwrap();

    assert!(!needs_changes);
    assert_eq!(fs::read_to_string(&file).unwrap(), "fn main() {}\n");
  }

  #[test]
  fn test_template_definition_file_is_never_processed() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_TEMPLATE_FILENAME), TEMPLATE).unwrap();

    let processor = test_processor(dir.path(), true);
    processor
      .process(&[dir.path().to_string_lossy().to_string()])
      .unwrap();

    assert_eq!(
      fs::read_to_string(dir.path().join(DEFAULT_TEMPLATE_FILENAME)).unwrap(),
      TEMPLATE
    );
  }

  #[test]
  fn test_malformed_template_aborts_run() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_TEMPLATE_FILENAME), "no sections here\n").unwrap();
    fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();

    let processor = test_processor(dir.path(), false);
    let result = processor.process(&[dir.path().to_string_lossy().to_string()]);

    assert!(result.is_err());
  }

  #[test]
  fn test_write_atomic_replaces_content() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("out.txt");
    fs::write(&file, "old").unwrap();

    write_atomic(&file, "new").unwrap();

    assert_eq!(fs::read_to_string(&file).unwrap(), "new");
  }
}
