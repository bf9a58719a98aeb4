//! # Similarity Module
//!
//! Fuzzy comparison of copyright headers. Headers are normalized into token
//! vectors (years, copyright marks, and boilerplate phrases stripped) and
//! scored with a weighted composite of three metrics:
//!
//! - token Jaccard (0.4): unordered vocabulary overlap
//! - character trigram Jaccard (0.4): resilient to small rewordings
//! - longest-common-subsequence ratio (0.2): rewards preserved token order
//!
//! Scores live in `[0.0, 1.0]`. A header scoring at or above
//! [`REPLACE_THRESHOLD`] is considered an outdated variant of the canonical
//! header rather than unrelated text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Minimum composite score at which an existing header is treated as an
/// outdated variant of the canonical one and replaced.
pub const REPLACE_THRESHOLD: f64 = 0.4;

static YEAR_TOKEN_REGEX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b\d{4}(?:\s*-\s*\d{4})?\b").expect("year token regex must compile"));

static COPYRIGHT_MARK_REGEX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\(c\)|©").expect("copyright mark regex must compile"));

/// Boilerplate phrases carried by virtually every header; they say nothing
/// about who owns the file, so they are stripped before comparison. Longer
/// phrases come first so the alternation prefers them.
static BOILERPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\bspdx-license-identifier\b|\bfor licensing see\b|\ball rights reserved\b|\bcopyright\b|\bauthors?\b|\blicen[a-z]*\b")
    .expect("boilerplate regex must compile")
});

/// Normalizes header text into comparison tokens.
///
/// Strips year tokens, `(c)`/`©` marks, and boilerplate phrases, lowercases,
/// maps punctuation to spaces, and splits on whitespace.
pub fn normalize(text: &str) -> Vec<String> {
  let text = YEAR_TOKEN_REGEX.replace_all(text, " ");
  let text = COPYRIGHT_MARK_REGEX.replace_all(&text, " ");
  let text = BOILERPLATE_REGEX.replace_all(&text, " ");
  text
    .to_lowercase()
    .chars()
    .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
    .collect::<String>()
    .split_whitespace()
    .map(str::to_string)
    .collect()
}

/// Jaccard similarity over token sets. Two empty inputs score 0.0.
pub fn token_jaccard(a: &[String], b: &[String]) -> f64 {
  let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
  let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
  if set_a.is_empty() && set_b.is_empty() {
    return 0.0;
  }
  let intersection = set_a.intersection(&set_b).count();
  let union = set_a.union(&set_b).count();
  intersection as f64 / union as f64
}

/// Jaccard similarity over character trigrams of the space-joined token
/// string. Inputs too short to produce a trigram score 0.0.
pub fn trigram_jaccard(a: &[String], b: &[String]) -> f64 {
  let grams_a = trigrams(a);
  let grams_b = trigrams(b);
  if grams_a.is_empty() && grams_b.is_empty() {
    return 0.0;
  }
  let intersection = grams_a.intersection(&grams_b).count();
  let union = grams_a.union(&grams_b).count();
  intersection as f64 / union as f64
}

fn trigrams(tokens: &[String]) -> HashSet<(char, char, char)> {
  let joined: Vec<char> = tokens.join(" ").chars().collect();
  joined.windows(3).map(|w| (w[0], w[1], w[2])).collect()
}

/// Longest-common-subsequence ratio over token sequences:
/// `2 * lcs / (len(a) + len(b))`. Two empty inputs score 0.0.
pub fn lcs_ratio(a: &[String], b: &[String]) -> f64 {
  if a.is_empty() && b.is_empty() {
    return 0.0;
  }
  let lcs = lcs_length(a, b);
  2.0 * lcs as f64 / (a.len() + b.len()) as f64
}

fn lcs_length(a: &[String], b: &[String]) -> usize {
  // Rolling single-row DP keeps this O(min(n,m)) in memory.
  let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
  let mut row = vec![0usize; short.len() + 1];
  for long_token in long {
    let mut diagonal = 0;
    for (index, short_token) in short.iter().enumerate() {
      let above = row[index + 1];
      row[index + 1] = if long_token == short_token {
        diagonal + 1
      } else {
        above.max(row[index])
      };
      diagonal = above;
    }
  }
  row[short.len()]
}

/// Composite similarity of two already-normalized token vectors.
pub fn composite(a: &[String], b: &[String]) -> f64 {
  if a.is_empty() && b.is_empty() {
    return 0.0;
  }
  if a == b {
    return 1.0;
  }
  let score = 0.4 * token_jaccard(a, b) + 0.4 * trigram_jaccard(a, b) + 0.2 * lcs_ratio(a, b);
  score.clamp(0.0, 1.0)
}

/// Normalizes and scores two header blocks.
pub fn score_headers(existing: &str, canonical: &str) -> f64 {
  composite(&normalize(existing), &normalize(canonical))
}
