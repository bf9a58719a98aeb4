//! # Workspace Module
//!
//! Defines the workspace root a run operates on. The root bounds the
//! hierarchical template lookup and anchors relative paths in output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::git;

/// Workspace root selection.
pub enum Workspace {
  /// Workspace rooted at a git repository work tree.
  Git { root: PathBuf },
  /// Workspace rooted at a plain directory.
  Directory { root: PathBuf },
}

impl Workspace {
  pub fn root(&self) -> &Path {
    match self {
      Self::Git { root } | Self::Directory { root } => root.as_path(),
    }
  }

  pub const fn is_git(&self) -> bool {
    matches!(self, Self::Git { .. })
  }
}

/// Resolves the workspace from the current directory and the CLI patterns.
///
/// A surrounding git repository wins. Otherwise the current directory is the
/// root, unless every existing pattern target lives outside it, in which
/// case the first such target picks the root. The root bounds the upward
/// template lookup, so `renotice src/` still finds a template next to the
/// invocation directory.
pub fn resolve_workspace(patterns: &[String]) -> Result<Workspace> {
  let current_dir = std::env::current_dir().context("Failed to get current directory")?;
  let current_dir = current_dir.canonicalize().unwrap_or(current_dir);

  if let Some(root) = git::discover_repo_root(&current_dir)? {
    return Ok(Workspace::Git { root });
  }

  if let Some(root) = resolve_workspace_from_patterns(patterns, &current_dir)
    && !root.starts_with(&current_dir)
  {
    return Ok(Workspace::Directory { root });
  }

  Ok(Workspace::Directory { root: current_dir })
}

fn resolve_workspace_from_patterns(patterns: &[String], current_dir: &Path) -> Option<PathBuf> {
  for pattern in patterns {
    let candidate = PathBuf::from(pattern);
    if candidate.exists() {
      let target = if candidate.is_dir() {
        Some(abs_path_or_current(&candidate, current_dir))
      } else if candidate.is_file() {
        candidate.parent().map(|parent| abs_path_or_current(parent, current_dir))
      } else {
        None
      };
      if let Some(target) = target {
        return Some(target.canonicalize().unwrap_or(target));
      }
    }
  }

  None
}

fn abs_path_or_current(path: &Path, current_dir: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    current_dir.join(path)
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_root_accessor_covers_both_variants() {
    let git = Workspace::Git {
      root: PathBuf::from("/repo"),
    };
    let dir = Workspace::Directory {
      root: PathBuf::from("/work"),
    };
    assert_eq!(git.root(), Path::new("/repo"));
    assert!(git.is_git());
    assert_eq!(dir.root(), Path::new("/work"));
    assert!(!dir.is_git());
  }

  #[test]
  fn test_directory_pattern_resolves_to_that_directory() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let target = temp_dir.path().join("project");
    std::fs::create_dir(&target).expect("create project dir");

    let resolved = resolve_workspace_from_patterns(
      &[target.to_string_lossy().to_string()],
      Path::new("/unrelated"),
    )
    .expect("pattern resolves");
    assert_eq!(resolved, target.canonicalize().expect("canonicalize"));
  }

  #[test]
  fn test_file_pattern_resolves_to_its_parent() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let file = temp_dir.path().join("main.rs");
    std::fs::write(&file, "fn main() {}\n").expect("write file");

    let resolved = resolve_workspace_from_patterns(
      &[file.to_string_lossy().to_string()],
      Path::new("/unrelated"),
    )
    .expect("pattern resolves");
    assert_eq!(resolved, temp_dir.path().canonicalize().expect("canonicalize"));
  }

  #[test]
  fn test_missing_patterns_resolve_to_none() {
    assert!(resolve_workspace_from_patterns(&["no/such/path".to_string()], Path::new("/unrelated")).is_none());
    assert!(resolve_workspace_from_patterns(&[], Path::new("/unrelated")).is_none());
  }
}
