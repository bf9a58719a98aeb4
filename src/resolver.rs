//! # Resolver Module
//!
//! Finds the template definition file governing each processed file. In
//! hierarchical mode the resolver walks from the file's directory up to the
//! workspace root and the nearest definition file wins, so subtrees can
//! carry their own notice. Results are cached per directory; the cache is
//! shared across worker threads behind a mutex and each directory is parsed
//! at most once per run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::debug;

use crate::template::TemplateSet;

/// Resolves the [`TemplateSet`] governing a file path.
#[derive(Debug)]
pub struct TemplateResolver {
  mode: Mode,
  cache: Mutex<HashMap<PathBuf, Option<Arc<TemplateSet>>>>,
}

#[derive(Debug)]
enum Mode {
  /// Walk from the file's directory up to `root`, looking for `filename`.
  Hierarchical { root: PathBuf, filename: String },
  /// One template file for the whole run.
  Fixed(Arc<TemplateSet>),
}

impl TemplateResolver {
  /// Creates a hierarchical resolver rooted at the workspace root.
  pub fn hierarchical(root: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
    // Processed file paths are canonicalized, so the root boundary must be
    // canonical too or the upward walk would never recognize it.
    let root: PathBuf = root.into();
    let root = root.canonicalize().unwrap_or(root);
    Self {
      mode: Mode::Hierarchical { root, filename: filename.into() },
      cache: Mutex::new(HashMap::new()),
    }
  }

  /// Creates a resolver that serves one template file for every path.
  ///
  /// # Errors
  ///
  /// Fails when the file cannot be read or does not parse; a broken template
  /// aborts the run before any file is touched.
  pub fn fixed(template_path: &Path) -> Result<Self> {
    let set = load_template_file(template_path)?;
    Ok(Self {
      mode: Mode::Fixed(Arc::new(set)),
      cache: Mutex::new(HashMap::new()),
    })
  }

  /// Resolves the template set governing `file`.
  ///
  /// # Returns
  ///
  /// `Ok(None)` when no template definition file exists anywhere up the
  /// directory chain; the caller skips the file.
  ///
  /// # Errors
  ///
  /// Fails when a definition file exists but is malformed; this is fatal for
  /// the whole run.
  pub fn resolve(&self, file: &Path) -> Result<Option<Arc<TemplateSet>>> {
    let (root, filename) = match &self.mode {
      Mode::Fixed(set) => return Ok(Some(Arc::clone(set))),
      Mode::Hierarchical { root, filename } => (root, filename),
    };

    let start = match file.parent() {
      Some(parent) => parent.to_path_buf(),
      None => return Ok(None),
    };

    // Collect the directories visited on a cache miss so they can all be
    // backfilled with the final answer.
    let mut visited: Vec<PathBuf> = Vec::new();
    let mut dir = Some(start);
    let mut resolved: Option<Option<Arc<TemplateSet>>> = None;

    while let Some(current) = dir {
      {
        let cache = self.cache.lock().expect("template cache lock poisoned");
        if let Some(cached) = cache.get(&current) {
          resolved = Some(cached.clone());
          break;
        }
      }

      let candidate = current.join(filename);
      if candidate.is_file() {
        debug!(template = %candidate.display(), "resolved template definition");
        let set = Arc::new(load_template_file(&candidate)?);
        visited.push(current);
        resolved = Some(Some(set));
        break;
      }

      let at_root = current == *root;
      visited.push(current.clone());
      dir = if at_root { None } else { current.parent().map(Path::to_path_buf) };
    }

    let result = resolved.unwrap_or(None);
    let mut cache = self.cache.lock().expect("template cache lock poisoned");
    for dir_path in visited {
      cache.insert(dir_path, result.clone());
    }
    Ok(result)
  }
}

fn load_template_file(path: &Path) -> Result<TemplateSet> {
  let text =
    std::fs::read_to_string(path).with_context(|| format!("failed to read template file: {}", path.display()))?;
  TemplateSet::parse(&text).with_context(|| format!("malformed template file: {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;

  const TEMPLATE: &str = "[.py]\n# Copyright {regex:\\d{4}(-\\d{4})?} Acme Corporation\n";
  const SUB_TEMPLATE: &str = "[.py]\n# Copyright {regex:\\d{4}(-\\d{4})?} Acme Labs Division\n";

  #[test]
  fn nearest_directory_template_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    std::fs::write(root.join("copyright.txt"), TEMPLATE).expect("write root template");
    std::fs::create_dir_all(root.join("sub/deeper")).expect("mkdirs");
    std::fs::write(root.join("sub/copyright.txt"), SUB_TEMPLATE).expect("write sub template");

    let resolver = TemplateResolver::hierarchical(root, "copyright.txt");

    let from_sub = resolver
      .resolve(&root.join("sub/deeper/mod.py"))
      .expect("resolve")
      .expect("template found");
    let template = from_sub.for_path(Path::new("mod.py")).expect("python section");
    assert!(template.render(crate::years::YearRange::single(2026)).contains("Acme Labs Division"));

    let from_root = resolver
      .resolve(&root.join("main.py"))
      .expect("resolve")
      .expect("template found");
    let template = from_root.for_path(Path::new("main.py")).expect("python section");
    assert!(
      template
        .render(crate::years::YearRange::single(2026))
        .contains("Acme Corporation")
    );
  }

  #[test]
  fn missing_template_resolves_to_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = TemplateResolver::hierarchical(dir.path(), "copyright.txt");
    assert!(resolver.resolve(&dir.path().join("a/b/c.py")).expect("resolve").is_none());
  }

  #[test]
  fn resolution_is_cached_per_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    std::fs::write(root.join("copyright.txt"), TEMPLATE).expect("write template");
    let resolver = TemplateResolver::hierarchical(root, "copyright.txt");

    let first = resolver.resolve(&root.join("a.py")).expect("resolve").expect("found");
    // removing the file no longer changes the answer within the run
    std::fs::remove_file(root.join("copyright.txt")).expect("remove");
    let second = resolver.resolve(&root.join("b.py")).expect("resolve").expect("found");
    assert!(Arc::ptr_eq(&first, &second));
  }

  #[test]
  fn malformed_template_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    std::fs::write(root.join("copyright.txt"), "[.py]\n# Copyright {MISSING}\n").expect("write template");
    let resolver = TemplateResolver::hierarchical(root, "copyright.txt");
    assert!(resolver.resolve(&root.join("a.py")).is_err());
  }

  #[test]
  fn fixed_mode_ignores_directory_templates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    std::fs::write(root.join("project.txt"), TEMPLATE).expect("write template");
    std::fs::create_dir_all(root.join("sub")).expect("mkdir");
    std::fs::write(root.join("sub/copyright.txt"), SUB_TEMPLATE).expect("write sub template");

    let resolver = TemplateResolver::fixed(&root.join("project.txt")).expect("fixed resolver");
    let set = resolver
      .resolve(&root.join("sub/mod.py"))
      .expect("resolve")
      .expect("template found");
    let template = set.for_path(Path::new("mod.py")).expect("python section");
    assert!(
      template
        .render(crate::years::YearRange::single(2026))
        .contains("Acme Corporation")
    );
  }
}
