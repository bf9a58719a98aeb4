//! # Entity Module
//!
//! Guards header replacement across organizational boundaries. A header that
//! names a different business unit in its `Author:` field must never be
//! replaced no matter how similar its boilerplate looks, so the decision
//! engine extracts an org-unit signature from both headers and forces the
//! similarity score to zero when the signatures disagree.

use std::sync::LazyLock;

use regex::Regex;

use crate::similarity;

/// Minimum composite similarity between two org-unit signatures for them to
/// be treated as the same unit.
pub const ENTITY_MATCH_THRESHOLD: f64 = 0.70;

static AUTHOR_LINE_REGEX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?im)\bauthors?\s*:\s*(.+)$").expect("author line regex must compile"));

/// Abbreviation spellings folded to one form before signatures are compared,
/// so `Research & Development Center` and `R&D Center` read as the same unit.
const ALIASES: &[(&str, &str)] = &[
  ("research and development", "r&d"),
  ("research & development", "r&d"),
  ("laboratories", "lab"),
  ("laboratory", "lab"),
];

/// Extracts and compares org-unit signatures.
///
/// An ordered list of known unit names is consulted first; the earliest name
/// found verbatim in the author text becomes the signature. Otherwise the
/// signature falls back to the author's first comma-delimited segment with
/// trailing `Laboratory`/`Lab` noise stripped.
#[derive(Debug, Default, Clone)]
pub struct EntityGuard {
  known_units: Vec<String>,
}

impl EntityGuard {
  /// Creates a guard with an ordered list of known unit names.
  pub fn new(known_units: Vec<String>) -> Self {
    let known_units = known_units.into_iter().map(|unit| unit.to_lowercase()).collect();
    Self { known_units }
  }

  /// Extracts the org-unit signature from a header block, if it carries an
  /// `Author:` field.
  pub fn extract(&self, header: &str) -> Option<String> {
    let author = AUTHOR_LINE_REGEX.captures(header)?.get(1)?.as_str();
    let lowered = author.to_lowercase();
    for unit in &self.known_units {
      if lowered.contains(unit.as_str()) {
        return Some(unit.clone());
      }
    }
    Some(fallback_signature(&lowered))
  }

  /// Whether two headers belong to the same organizational unit.
  ///
  /// Headers without an `Author:` field on either side are not guarded; a
  /// field present on exactly one side is treated as a mismatch.
  pub fn entities_match(&self, existing: &str, canonical: &str) -> bool {
    match (self.extract(existing), self.extract(canonical)) {
      (None, None) => true,
      (Some(a), Some(b)) => signature_similarity(&a, &b) >= ENTITY_MATCH_THRESHOLD,
      _ => false,
    }
  }
}

/// Composite similarity over canonicalized signature tokens.
fn signature_similarity(a: &str, b: &str) -> f64 {
  let tokens_a = similarity::normalize(&canonicalize(a));
  let tokens_b = similarity::normalize(&canonicalize(b));
  similarity::composite(&tokens_a, &tokens_b)
}

fn canonicalize(signature: &str) -> String {
  let mut out = signature.to_lowercase();
  for (long, short) in ALIASES {
    out = out.replace(long, short);
  }
  out
}

/// First comma segment of the author text, lowercased, with trailing
/// punctuation and `laboratory`/`lab` suffixes stripped.
fn fallback_signature(author: &str) -> String {
  let segment = author.split(',').next().unwrap_or(author).trim();
  let segment = segment.trim_end_matches(['.', ';', ':']).trim();
  let stripped = segment
    .strip_suffix(" laboratory")
    .or_else(|| segment.strip_suffix(" lab"))
    .unwrap_or(segment);
  stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn guard() -> EntityGuard {
    EntityGuard::default()
  }

  #[test]
  fn extracts_first_comma_segment() {
    let header = "# Copyright 2024 Acme Corporation\n# Author: Systems Group, Acme Corporation";
    assert_eq!(guard().extract(header), Some("systems group".to_string()));
  }

  #[test]
  fn strips_trailing_laboratory_suffix() {
    let header = "# Author: Advanced Imaging Laboratory, Acme Corporation";
    assert_eq!(guard().extract(header), Some("advanced imaging".to_string()));
  }

  #[test]
  fn strips_trailing_punctuation() {
    let header = "# Author: Platform Team.";
    assert_eq!(guard().extract(header), Some("platform team".to_string()));
  }

  #[test]
  fn known_unit_list_wins_over_fallback() {
    let units = EntityGuard::new(vec!["r&d center europe".to_string()]);
    let header = "# Author: R&D Center Europe Field Office, Acme Corporation";
    assert_eq!(units.extract(header), Some("r&d center europe".to_string()));
  }

  #[test]
  fn header_without_author_extracts_nothing() {
    assert_eq!(guard().extract("# Copyright 2024 Acme Corporation"), None);
  }

  #[test]
  fn same_unit_matches() {
    let a = "# Author: Systems Group, Acme Corporation";
    let b = "# Author: Systems Group, Acme Corporation";
    assert!(guard().entities_match(a, b));
  }

  #[test]
  fn abbreviation_variants_match() {
    let a = "# Author: Research & Development Center Europe, Acme Corporation";
    let b = "# Author: R&D Center Europe, Acme Corporation";
    assert!(guard().entities_match(a, b));
  }

  #[test]
  fn different_units_do_not_match() {
    let a = "# Author: Systems Group, Acme Corporation";
    let b = "# Author: Imaging Research, Acme Corporation";
    assert!(!guard().entities_match(a, b));
  }

  #[test]
  fn author_on_one_side_only_is_a_mismatch() {
    let with_author = "# Author: Systems Group, Acme Corporation";
    let without = "# Copyright 2024 Acme Corporation";
    assert!(!guard().entities_match(without, with_author));
    assert!(!guard().entities_match(with_author, without));
  }

  #[test]
  fn no_author_on_either_side_does_not_block() {
    let a = "# Copyright 2024 Acme Corporation";
    let b = "# Copyright 2021-2026 Acme Corporation";
    assert!(guard().entities_match(a, b));
  }
}
