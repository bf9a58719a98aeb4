//! # Template Module
//!
//! Parses copyright notice template files and compiles them into per-file-type
//! header templates that can both render a canonical header and recognize one
//! in existing file content.
//!
//! A template file is section based:
//!
//! ```text
//! [VARIABLES]
//! COMPANY = Acme Corporation
//!
//! [.py, .yaml]
//! # Copyright {regex:\d{4}(-\d{4})?} {COMPANY}
//! # All rights reserved.
//! ```
//!
//! `{NAME}` placeholders are substituted from the `[VARIABLES]` section at
//! parse time. `{regex:PATTERN}` placeholders mark dynamic regions that are
//! matched (not compared literally) during detection; a region whose pattern
//! can match a four-digit year is treated as the year slot and filled in when
//! the header is rendered.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;

use crate::years::YearRange;

/// Default file name of the template definition file looked up per directory.
pub const DEFAULT_TEMPLATE_FILENAME: &str = "copyright.txt";

/// Recognizes section header lines such as `[VARIABLES]`, `[.py]`,
/// `[.py, .yaml]`, or `[Makefile]`. Anything else stays part of the
/// surrounding body, so header bodies may themselves contain bracketed text.
static SECTION_HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\[\s*(VARIABLES|(?:\.[A-Za-z0-9_]+|[A-Za-z0-9_][A-Za-z0-9_.\-]*)(?:\s*,\s*(?:\.[A-Za-z0-9_]+|[A-Za-z0-9_][A-Za-z0-9_.\-]*))*)\s*\]\s*$")
    .expect("section header regex must compile")
});

/// Errors raised while parsing a template definition file.
///
/// Any of these aborts the entire run: a malformed template would otherwise
/// silently mis-detect headers across every file it governs.
#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("template defines no header sections")]
  NoSections,

  #[error("line {line}: content before the first section header")]
  ContentOutsideSection { line: usize },

  #[error("line {line}: malformed variable definition `{text}`")]
  BadVariable { line: usize, text: String },

  #[error("section `[{section}]` has an empty body")]
  EmptySection { section: String },

  #[error("unknown variable `{{{name}}}` in section `[{section}]`")]
  UnknownVariable { name: String, section: String },

  #[error("unclosed `{{` placeholder in section `[{section}]`")]
  UnclosedPlaceholder { section: String },

  #[error("invalid regex placeholder `{pattern}` in section `[{section}]`: {source}")]
  InvalidRegex {
    pattern: String,
    section: String,
    source: regex::Error,
  },

  #[error("failed to compile detection pattern for section `[{section}]`: {source}")]
  Detection { section: String, source: regex::Error },
}

/// One piece of a compiled header body.
#[derive(Debug, Clone)]
enum Part {
  /// Literal text, variables already substituted.
  Text(String),
  /// The year slot: rendered with the computed year range, matched with the
  /// user-supplied pattern.
  Year { pattern: String },
  /// A non-year dynamic region, matched but rendered empty.
  Wildcard { pattern: String },
}

/// A compiled canonical header for one group of file types.
#[derive(Debug)]
pub struct HeaderTemplate {
  parts: Vec<Part>,
  block_regex: Regex,
  has_year_slot: bool,
}

impl HeaderTemplate {
  /// Renders the canonical header text with the given year range.
  pub fn render(&self, years: YearRange) -> String {
    let mut out = String::new();
    for part in &self.parts {
      match part {
        Part::Text(literal) => out.push_str(literal),
        Part::Year { .. } => out.push_str(&years.to_string()),
        Part::Wildcard { .. } => {}
      }
    }
    out
  }

  /// Whether `block` is this template's canonical header, with dynamic
  /// regions (years included) wildcarded. Trailing whitespace is ignored and
  /// interior runs of blanks are matched flexibly.
  pub fn matches_block(&self, block: &str) -> bool {
    self.block_regex.is_match(block)
  }

  /// Extracts the year range from a block previously accepted by
  /// [`matches_block`](Self::matches_block).
  pub fn extract_years(&self, block: &str) -> Option<YearRange> {
    let caps = self.block_regex.captures(block)?;
    let matched = caps.name("years")?;
    YearRange::find_in(matched.as_str())
  }

  /// Whether this template carries a year slot at all. Templates without one
  /// are rendered verbatim and never year-refreshed.
  pub const fn has_year_slot(&self) -> bool {
    self.has_year_slot
  }

  fn compile(section: &str, body: &str, variables: &HashMap<String, String>) -> Result<Self, TemplateError> {
    let parts = split_placeholders(section, body, variables)?;

    let mut pattern = String::from(r"\A");
    let mut has_year_slot = false;
    for part in &parts {
      match part {
        Part::Text(literal) => push_literal_pattern(&mut pattern, literal),
        Part::Year { pattern: year_pattern } if !has_year_slot => {
          has_year_slot = true;
          pattern.push_str("(?P<years>");
          pattern.push_str(year_pattern);
          pattern.push(')');
        }
        Part::Year { pattern: inner } | Part::Wildcard { pattern: inner } => {
          pattern.push_str("(?:");
          pattern.push_str(inner);
          pattern.push(')');
        }
      }
    }
    pattern.push_str(r"[ \t]*\z");

    let block_regex = Regex::new(&pattern).map_err(|source| TemplateError::Detection {
      section: section.to_string(),
      source,
    })?;

    Ok(Self {
      parts,
      block_regex,
      has_year_slot,
    })
  }
}

/// A parsed template definition file: one [`HeaderTemplate`] per file type.
#[derive(Debug, Default)]
pub struct TemplateSet {
  by_extension: HashMap<String, Arc<HeaderTemplate>>,
  by_filename: HashMap<String, Arc<HeaderTemplate>>,
}

impl TemplateSet {
  /// Parses the text of a template definition file.
  ///
  /// # Errors
  ///
  /// Returns a [`TemplateError`] for structural problems (content outside
  /// sections, empty bodies, no sections at all) and placeholder problems
  /// (unknown variables, unclosed braces, invalid regex patterns).
  pub fn parse(text: &str) -> Result<Self, TemplateError> {
    let mut variables: HashMap<String, String> = HashMap::new();
    let mut sections: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;
    let mut variables_closed = false;

    for (index, line) in text.lines().enumerate() {
      if let Some(caps) = SECTION_HEADER_REGEX.captures(line.trim_end()) {
        if let Some((name, body)) = current.take() {
          if name == "VARIABLES" {
            variables_closed = true;
          }
          sections.push((name, body.join("\n")));
        }
        let name = caps
          .get(1)
          .map(|m| m.as_str().to_string())
          .unwrap_or_default();
        current = Some((name, Vec::new()));
        continue;
      }

      match current {
        Some((ref name, ref mut body)) => {
          if name == "VARIABLES" {
            // Only the first [VARIABLES] section defines variables; any
            // later one is ignored silently.
            if variables_closed {
              continue;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
              continue;
            }
            let (key, value) = trimmed.split_once('=').ok_or_else(|| TemplateError::BadVariable {
              line: index + 1,
              text: trimmed.to_string(),
            })?;
            variables.insert(key.trim().to_string(), value.trim().to_string());
          } else {
            body.push(line);
          }
        }
        None => {
          if !line.trim().is_empty() {
            return Err(TemplateError::ContentOutsideSection { line: index + 1 });
          }
        }
      }
    }
    if let Some((name, body)) = current.take() {
      sections.push((name, body.join("\n")));
    }

    let mut set = Self::default();
    for (name, raw_body) in sections {
      if name == "VARIABLES" {
        continue;
      }
      let body = raw_body.trim_matches('\n');
      if body.trim().is_empty() {
        return Err(TemplateError::EmptySection { section: name });
      }
      let template = Arc::new(HeaderTemplate::compile(&name, body, &variables)?);
      for entry in name.split(',') {
        let entry = entry.trim();
        if let Some(extension) = entry.strip_prefix('.') {
          set.by_extension.insert(extension.to_ascii_lowercase(), Arc::clone(&template));
        } else {
          set.by_filename.insert(entry.to_ascii_lowercase(), Arc::clone(&template));
        }
      }
    }

    if set.by_extension.is_empty() && set.by_filename.is_empty() {
      return Err(TemplateError::NoSections);
    }
    Ok(set)
  }

  /// Looks up the template governing `path`, by exact file name first and by
  /// extension second (both case-insensitive).
  pub fn for_path(&self, path: &Path) -> Option<&Arc<HeaderTemplate>> {
    if let Some(name) = path.file_name().and_then(|n| n.to_str())
      && let Some(template) = self.by_filename.get(&name.to_ascii_lowercase())
    {
      return Some(template);
    }
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    self.by_extension.get(&extension)
  }

  /// The file types this set covers, for diagnostics.
  pub fn covered_types(&self) -> Vec<String> {
    let mut types: Vec<String> = self
      .by_extension
      .keys()
      .map(|ext| format!(".{ext}"))
      .chain(self.by_filename.keys().cloned())
      .collect();
    types.sort();
    types
  }
}

/// Splits a section body into literal and dynamic parts, substituting
/// `{NAME}` variables as it goes.
fn split_placeholders(
  section: &str,
  body: &str,
  variables: &HashMap<String, String>,
) -> Result<Vec<Part>, TemplateError> {
  let mut parts: Vec<Part> = Vec::new();
  let mut literal = String::new();
  let mut rest = body;

  while let Some(open) = rest.find('{') {
    literal.push_str(&rest[..open]);
    let after = &rest[open + 1..];

    if let Some(pattern_text) = after.strip_prefix("regex:") {
      let close = find_balanced_close(pattern_text).ok_or_else(|| TemplateError::UnclosedPlaceholder {
        section: section.to_string(),
      })?;
      let pattern = &pattern_text[..close];
      Regex::new(pattern).map_err(|source| TemplateError::InvalidRegex {
        pattern: pattern.to_string(),
        section: section.to_string(),
        source,
      })?;
      if !literal.is_empty() {
        parts.push(Part::Text(std::mem::take(&mut literal)));
      }
      parts.push(if pattern.contains(r"\d{4}") {
        Part::Year {
          pattern: pattern.to_string(),
        }
      } else {
        Part::Wildcard {
          pattern: pattern.to_string(),
        }
      });
      rest = &pattern_text[close + 1..];
    } else {
      let close = after.find('}').ok_or_else(|| TemplateError::UnclosedPlaceholder {
        section: section.to_string(),
      })?;
      let name = &after[..close];
      let value = variables.get(name).ok_or_else(|| TemplateError::UnknownVariable {
        name: name.to_string(),
        section: section.to_string(),
      })?;
      literal.push_str(value);
      rest = &after[close + 1..];
    }
  }
  literal.push_str(rest);
  if !literal.is_empty() {
    parts.push(Part::Text(literal));
  }
  Ok(parts)
}

/// Finds the index of the `}` closing a `{regex:...}` placeholder, skipping
/// over balanced brace pairs inside the pattern (e.g. `\d{4}`).
fn find_balanced_close(text: &str) -> Option<usize> {
  let mut depth = 0usize;
  for (index, ch) in text.char_indices() {
    match ch {
      '{' => depth += 1,
      '}' => {
        if depth == 0 {
          return Some(index);
        }
        depth -= 1;
      }
      _ => {}
    }
  }
  None
}

/// Appends literal template text to a detection pattern: newlines tolerate
/// surrounding blanks, interior whitespace runs match any run of blanks, and
/// everything else is escaped.
fn push_literal_pattern(pattern: &mut String, literal: &str) {
  let mut chunk = String::new();
  let mut chars = literal.chars().peekable();
  while let Some(ch) = chars.next() {
    if ch == '\n' {
      pattern.push_str(&regex::escape(&std::mem::take(&mut chunk)));
      pattern.push_str(r"[ \t]*\r?\n[ \t]*");
      // leading blanks on the next line are covered by the newline pattern
      while matches!(chars.peek(), Some(' ' | '\t')) {
        chars.next();
      }
    } else if ch == ' ' || ch == '\t' {
      pattern.push_str(&regex::escape(&std::mem::take(&mut chunk)));
      pattern.push_str(r"[ \t]+");
      while matches!(chars.peek(), Some(' ' | '\t')) {
        chars.next();
      }
    } else {
      chunk.push(ch);
    }
  }
  pattern.push_str(&regex::escape(&chunk));
}
