//! # Git Module
//!
//! Builds the provenance index the year merger works from: which files have
//! uncommitted changes, the year each tracked file first appeared in
//! history, and the repository's inception year. Everything is gathered in
//! one pass before files are dispatched to workers, so the index is plain
//! shared-nothing data afterwards.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike};
use git2::{Repository, Sort, StatusOptions};
use tracing::debug;

use crate::verbose_log;
use crate::years::{Provenance, YearPolicy};

/// Provenance facts for every file in the workspace, collected once per run.
#[derive(Debug, Default)]
pub struct ProvenanceIndex {
  /// The repository work directory; lookup paths are made relative to it.
  workdir: Option<PathBuf>,
  /// Workdir-relative paths with uncommitted (or untracked) changes.
  changed: HashSet<PathBuf>,
  /// Workdir-relative path to the year of the commit that introduced it.
  created: HashMap<PathBuf, i32>,
  /// Year of the repository's first commit.
  inception_year: Option<i32>,
}

impl ProvenanceIndex {
  /// Builds the index for the repository containing `root`.
  ///
  /// Falls back to a non-git index (every file treated as modified, no year
  /// history) when `root` is not inside a repository.
  ///
  /// # Errors
  ///
  /// Fails when a repository exists but its status or history cannot be
  /// read.
  pub fn collect(root: &Path) -> Result<Self> {
    let repo = match Repository::discover(root) {
      Ok(repo) => repo,
      Err(err) => {
        debug!(error = %err, "not a git repository, falling back to current-year provenance");
        return Ok(Self::without_git());
      }
    };
    let workdir = match repo.workdir() {
      // canonicalized so lookups with canonicalized file paths line up
      Some(dir) => dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()),
      None => {
        debug!("bare repository, falling back to current-year provenance");
        return Ok(Self::without_git());
      }
    };

    let changed = collect_changed(&repo)?;
    let (created, inception_year) = collect_history(&repo)?;
    verbose_log!(
      "Provenance: {} changed files, {} tracked paths, inception year {:?}",
      changed.len(),
      created.len(),
      inception_year
    );

    Ok(Self {
      workdir: Some(workdir),
      changed,
      created,
      inception_year,
    })
  }

  /// An index for runs without git awareness: every file counts as modified
  /// and no start years are known.
  pub fn without_git() -> Self {
    Self::default()
  }

  /// Whether real git history backs this index.
  pub const fn is_git_aware(&self) -> bool {
    self.workdir.is_some()
  }

  /// Year of the repository's first commit, when known.
  pub const fn inception_year(&self) -> Option<i32> {
    self.inception_year
  }

  /// Provenance facts for one file under the given year policy.
  pub fn provenance_for(&self, path: &Path, policy: YearPolicy) -> Provenance {
    let Some(workdir) = &self.workdir else {
      return Provenance::unknown();
    };
    let relative = match path.strip_prefix(workdir) {
      Ok(rel) => rel,
      // outside the repository work tree, treat as unknown
      Err(_) => return Provenance::unknown(),
    };
    let start_year = match policy {
      YearPolicy::ProjectWide => self.inception_year,
      YearPolicy::PerFile => self.created.get(relative).copied(),
    };
    Provenance {
      start_year,
      modified: self.changed.contains(relative),
    }
  }
}

/// Finds the work-tree root of the repository containing `start`, if any.
pub fn discover_repo_root(start: &Path) -> Result<Option<PathBuf>> {
  match Repository::discover(start) {
    Ok(repo) => Ok(repo.workdir().map(|dir| dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()))),
    Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
    Err(err) => Err(err).context("failed to discover git repository"),
  }
}

/// Workdir-relative paths with modifications in the index or work tree.
/// Untracked files count: they have no committed history to be "unchanged"
/// relative to.
fn collect_changed(repo: &Repository) -> Result<HashSet<PathBuf>> {
  let mut status_opts = StatusOptions::new();
  status_opts.include_untracked(true).recurse_untracked_dirs(true);

  let statuses = repo
    .statuses(Some(&mut status_opts))
    .context("failed to read git status")?;

  let mut changed = HashSet::new();
  for entry in statuses.iter() {
    let Some(path) = entry.path() else { continue };
    let status = entry.status();
    if status.is_wt_modified()
      || status.is_wt_new()
      || status.is_wt_renamed()
      || status.is_index_modified()
      || status.is_index_new()
      || status.is_index_renamed()
    {
      changed.insert(PathBuf::from(path));
    }
  }
  Ok(changed)
}

/// Walks history oldest-first, recording the year each path was introduced
/// and the year of the first commit.
fn collect_history(repo: &Repository) -> Result<(HashMap<PathBuf, i32>, Option<i32>)> {
  let mut created: HashMap<PathBuf, i32> = HashMap::new();

  let mut revwalk = match repo.revwalk() {
    Ok(walk) => walk,
    // unborn HEAD: a repository with no commits yet
    Err(_) => return Ok((created, None)),
  };
  if revwalk.push_head().is_err() {
    return Ok((created, None));
  }
  revwalk
    .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
    .context("failed to sort git history")?;

  let mut inception_year: Option<i32> = None;
  for oid in revwalk {
    let oid = oid.context("failed to walk git history")?;
    let commit = repo.find_commit(oid).context("failed to load commit")?;
    let Some(year) = commit_year(&commit) else { continue };
    inception_year.get_or_insert(year);

    // Merge commits restate their parents' files; skipping them keeps the
    // introduction year attributed to the original commit.
    if commit.parent_count() > 1 {
      continue;
    }
    let tree = commit.tree().context("failed to load commit tree")?;
    let parent_tree = match commit.parent(0) {
      Ok(parent) => Some(parent.tree().context("failed to load parent tree")?),
      Err(_) => None,
    };
    let diff = repo
      .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
      .context("failed to diff commit against parent")?;
    for delta in diff.deltas() {
      if let Some(path) = delta.new_file().path() {
        created.entry(path.to_path_buf()).or_insert(year);
      }
    }
  }
  Ok((created, inception_year))
}

fn commit_year(commit: &git2::Commit<'_>) -> Option<i32> {
  DateTime::from_timestamp(commit.time().seconds(), 0).map(|when| when.year())
}
