//! # Header Module
//!
//! Locates the existing copyright header in file content and splices
//! replacements or insertions back in. A header is the leading contiguous
//! run of comment-decorated lines after any directive prefix (shebang, XML
//! declaration, DOCTYPE), and only counts as a copyright header when it
//! actually mentions one; leading module docs and banners are left alone.
//!
//! All functions here operate on `\n`-separated content. The processor
//! normalizes CRLF away before calling in and restores it on write.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static COPYRIGHT_MARKER_REGEX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)copyright|\(c\)|©|\bspdx\b").expect("copyright marker regex must compile"));

/// The leading comment block opened a block comment that never closes, so
/// there is no well-defined region to splice. Callers treat the file as
/// having no header.
#[derive(Debug, Error)]
#[error("leading block comment starting at line {start_line} is never closed")]
pub struct AmbiguousHeader {
  pub start_line: usize,
}

/// Comment decoration style, inferred from a template's first rendered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentStyle {
  /// Every header line carries the same prefix (`#`, `//`, `--`, ...).
  Line { prefix: String },
  /// The header sits between an opening and a closing token.
  Block { open: String, close: String },
  /// No comment decoration; the header is a run of non-blank lines.
  Plain,
}

impl CommentStyle {
  /// Infers the comment style from the first line of a rendered header.
  pub fn infer(first_line: &str) -> Self {
    let trimmed = first_line.trim_start();
    if trimmed.starts_with("<!--") {
      return Self::Block {
        open: "<!--".to_string(),
        close: "-->".to_string(),
      };
    }
    if trimmed.starts_with("/*") {
      return Self::Block {
        open: "/*".to_string(),
        close: "*/".to_string(),
      };
    }
    let prefix: String = trimmed
      .chars()
      .take_while(|ch| !ch.is_alphanumeric() && !ch.is_whitespace())
      .collect();
    if prefix.is_empty() {
      Self::Plain
    } else {
      Self::Line { prefix }
    }
  }
}

/// An existing header block located in file content: its text and the
/// inclusive line range it occupies (indices into `content.split('\n')`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
  pub text: String,
  pub start_line: usize,
  pub end_line: usize,
}

/// Locates the existing copyright header in `content`.
///
/// # Returns
///
/// `Ok(None)` when the leading region carries no comment block, or carries
/// one that never mentions a copyright.
///
/// # Errors
///
/// [`AmbiguousHeader`] when a block comment opens in the leading region but
/// never closes.
pub fn locate(content: &str, style: &CommentStyle) -> Result<Option<HeaderBlock>, AmbiguousHeader> {
  let lines: Vec<&str> = content.split('\n').collect();
  let mut index = directive_end(&lines);
  while index < lines.len() && lines[index].trim().is_empty() {
    index += 1;
  }
  if index >= lines.len() {
    return Ok(None);
  }

  let start_line = index;
  let end_line = match style {
    CommentStyle::Line { prefix } => {
      let mut end = index;
      while end < lines.len() && lines[end].trim_start().starts_with(prefix.as_str()) {
        end += 1;
      }
      if end == index {
        return Ok(None);
      }
      end - 1
    }
    CommentStyle::Block { open, close } => {
      if !lines[index].trim_start().starts_with(open.as_str()) {
        return Ok(None);
      }
      let mut end = index;
      loop {
        // the opening line may also close the block
        let search_from = if end == index {
          lines[end].trim_start().len().min(open.len())
        } else {
          0
        };
        if lines[end].trim_start()[search_from..].contains(close.as_str()) {
          break end;
        }
        end += 1;
        if end >= lines.len() {
          return Err(AmbiguousHeader { start_line });
        }
      }
    }
    CommentStyle::Plain => {
      let mut end = index;
      while end < lines.len() && !lines[end].trim().is_empty() {
        end += 1;
      }
      end - 1
    }
  };

  let text = lines[start_line..=end_line].join("\n");
  if !COPYRIGHT_MARKER_REGEX.is_match(&text) {
    return Ok(None);
  }
  Ok(Some(HeaderBlock {
    text,
    start_line,
    end_line,
  }))
}

/// Index of the first line past any directive prefix (shebang, XML
/// declaration, DOCTYPE).
fn directive_end(lines: &[&str]) -> usize {
  let mut index = 0;
  while index < lines.len() {
    let lowered = lines[index].trim_start().to_lowercase();
    if lowered.starts_with("#!") || lowered.starts_with("<?xml") || lowered.starts_with("<!doctype") {
      index += 1;
    } else {
      break;
    }
  }
  index
}

/// Replaces the located header block with `replacement`, leaving every other
/// line untouched.
pub fn replace_block(content: &str, block: &HeaderBlock, replacement: &str) -> String {
  let lines: Vec<&str> = content.split('\n').collect();
  let mut out: Vec<&str> = Vec::with_capacity(lines.len());
  out.extend(&lines[..block.start_line]);
  let replacement_lines: Vec<&str> = replacement.split('\n').collect();
  out.extend(&replacement_lines);
  out.extend(&lines[block.end_line + 1..]);
  out.join("\n")
}

/// Inserts `header` at the top of `content`, after any directive prefix,
/// separated from the rest by one blank line.
pub fn insert_header(content: &str, header: &str) -> String {
  if content.trim().is_empty() {
    return format!("{header}\n");
  }
  let lines: Vec<&str> = content.split('\n').collect();
  let directives = directive_end(&lines);
  let mut out = String::new();
  for line in &lines[..directives] {
    out.push_str(line);
    out.push('\n');
  }
  out.push_str(header);
  out.push('\n');
  let rest = lines[directives..].join("\n");
  if !rest.starts_with('\n') && !rest.is_empty() {
    out.push('\n');
  }
  out.push_str(&rest);
  out
}
