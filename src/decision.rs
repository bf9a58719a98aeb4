//! # Decision Module
//!
//! Decides what happens to a single file: nothing, a fresh header insertion,
//! a replacement of an outdated header, or a hands-off report for a foreign
//! header. This is where the header locator, the similarity engine, the
//! entity guard, and the year merger meet.

use tracing::debug;

use crate::entity::EntityGuard;
use crate::header::{self, CommentStyle};
use crate::similarity::{self, REPLACE_THRESHOLD};
use crate::template::HeaderTemplate;
use crate::years::{self, Provenance, YearRange};

/// Everything the per-file evaluation needs besides the content itself.
pub struct DecisionContext<'a> {
  pub template: &'a HeaderTemplate,
  pub guard: &'a EntityGuard,
  pub provenance: Provenance,
  pub current_year: i32,
}

/// The outcome for one file.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
  /// The file already carries the canonical header with the right years.
  UpToDate,
  /// No header was found; `content` is the file with the canonical header
  /// inserted.
  Insert { content: String, years: YearRange },
  /// An outdated header was found; `content` is the file with the header
  /// replaced. `score` is `None` for pure year refreshes of an otherwise
  /// canonical header.
  Replace {
    content: String,
    years: YearRange,
    score: Option<f64>,
  },
  /// A header belonging to someone else; the file is left byte-identical.
  Foreign { score: f64 },
}

/// Evaluates one file's content against its canonical header template.
pub fn evaluate(ctx: &DecisionContext<'_>, content: &str) -> Decision {
  let canonical_probe = ctx.template.render(YearRange::single(ctx.current_year));
  let style = CommentStyle::infer(canonical_probe.lines().next().unwrap_or_default());

  let block = match header::locate(content, &style) {
    Ok(block) => block,
    Err(ambiguous) => {
      debug!(line = ambiguous.start_line, "ambiguous leading comment block, treating as no header");
      None
    }
  };

  let Some(block) = block else {
    let merged = years::merge_years(None, ctx.provenance, ctx.current_year);
    let rendered = ctx.template.render(merged);
    return Decision::Insert {
      content: header::insert_header(content, &rendered),
      years: merged,
    };
  };

  if ctx.template.matches_block(&block.text) {
    if !ctx.template.has_year_slot() {
      return Decision::UpToDate;
    }
    let existing = ctx.template.extract_years(&block.text);
    let merged = years::merge_years(existing, ctx.provenance, ctx.current_year);
    if existing == Some(merged) {
      return Decision::UpToDate;
    }
    let rendered = ctx.template.render(merged);
    return Decision::Replace {
      content: header::replace_block(content, &block, &rendered),
      years: merged,
      score: None,
    };
  }

  let mut score = similarity::score_headers(&block.text, &canonical_probe);
  if !ctx.guard.entities_match(&block.text, &canonical_probe) {
    debug!(score, "entity mismatch, forcing score to zero");
    score = 0.0;
  }
  if score < REPLACE_THRESHOLD {
    return Decision::Foreign { score };
  }

  let existing = YearRange::find_in(&block.text);
  let merged = years::merge_years(existing, ctx.provenance, ctx.current_year);
  let rendered = ctx.template.render(merged);
  Decision::Replace {
    content: header::replace_block(content, &block, &rendered),
    years: merged,
    score: Some(score),
  }
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use super::*;
  use crate::template::TemplateSet;

  const TEMPLATE: &str = r"[VARIABLES]
COMPANY = Acme Corporation
AUTHOR = Systems Group, Acme Corporation

[.py]
# Copyright {regex:\d{4}(-\d{4})?} {COMPANY}
# Author: {AUTHOR}
# License: For licensing see the License.txt file
";

  fn template_set() -> TemplateSet {
    TemplateSet::parse(TEMPLATE).expect("template parses")
  }

  fn context<'a>(template: &'a crate::template::HeaderTemplate, guard: &'a EntityGuard, modified: bool) -> DecisionContext<'a> {
    DecisionContext {
      template,
      guard,
      provenance: Provenance {
        start_year: Some(2021),
        modified,
      },
      current_year: 2026,
    }
  }

  #[test]
  fn missing_header_is_inserted_with_merged_years() {
    let set = template_set();
    let template = set.for_path(Path::new("a.py")).expect("python template");
    let guard = EntityGuard::default();
    let ctx = context(template, &guard, true);

    let decision = evaluate(&ctx, "x = 1\n");
    match decision {
      Decision::Insert { content, years } => {
        assert_eq!(years.to_string(), "2021-2026");
        assert!(content.starts_with("# Copyright 2021-2026 Acme Corporation\n"));
        assert!(content.ends_with("x = 1\n"));
      }
      other => panic!("expected insert, got {other:?}"),
    }
  }

  #[test]
  fn canonical_header_on_unchanged_file_is_up_to_date() {
    let set = template_set();
    let template = set.for_path(Path::new("a.py")).expect("python template");
    let guard = EntityGuard::default();
    let ctx = context(template, &guard, false);

    let content = format!("{}\n\nx = 1\n", template.render(YearRange::new(2021, 2024)));
    assert_eq!(evaluate(&ctx, &content), Decision::UpToDate);
  }

  #[test]
  fn canonical_header_on_modified_file_gets_year_refresh() {
    let set = template_set();
    let template = set.for_path(Path::new("a.py")).expect("python template");
    let guard = EntityGuard::default();
    let ctx = context(template, &guard, true);

    let content = format!("{}\n\nx = 1\n", template.render(YearRange::new(2021, 2024)));
    match evaluate(&ctx, &content) {
      Decision::Replace { content, years, score } => {
        assert_eq!(score, None);
        assert_eq!(years.to_string(), "2021-2026");
        assert!(content.contains("# Copyright 2021-2026 Acme Corporation"));
        assert!(!content.contains("2021-2024"));
      }
      other => panic!("expected replace, got {other:?}"),
    }
  }

  #[test]
  fn reworded_header_is_replaced_with_merged_years() {
    let set = template_set();
    let template = set.for_path(Path::new("a.py")).expect("python template");
    let guard = EntityGuard::default();
    let ctx = context(template, &guard, true);

    let content = "# Copyright (c) 2021-2022 Acme Corporation\n\
                   # Author: Systems Group, Acme Corporation\n\
                   # License: For licensing see the License.txt file\n\
                   \n\
                   x = 1\n";
    match evaluate(&ctx, content) {
      Decision::Replace { content, years, score } => {
        let score = score.expect("fuzzy replace carries a score");
        assert!(score >= REPLACE_THRESHOLD);
        assert_eq!(years.to_string(), "2021-2026");
        assert!(content.contains("# Copyright 2021-2026 Acme Corporation"));
        assert!(content.ends_with("x = 1\n"));
      }
      other => panic!("expected replace, got {other:?}"),
    }
  }

  #[test]
  fn foreign_company_header_is_left_alone() {
    let set = template_set();
    let template = set.for_path(Path::new("a.py")).expect("python template");
    let guard = EntityGuard::default();
    let ctx = context(template, &guard, true);

    let content = "# Copyright 2024 Different Company Inc.\n# All Rights Reserved\n\nx = 1\n";
    match evaluate(&ctx, content) {
      Decision::Foreign { score } => assert!(score < REPLACE_THRESHOLD),
      other => panic!("expected foreign, got {other:?}"),
    }
  }

  #[test]
  fn entity_mismatch_forces_score_to_zero() {
    let set = template_set();
    let template = set.for_path(Path::new("a.py")).expect("python template");
    let guard = EntityGuard::default();
    let ctx = context(template, &guard, true);

    // same company boilerplate, different unit in the author line
    let content = "# Copyright (c) 2021-2022 Acme Corporation\n\
                   # Author: Imaging Research, Acme Corporation\n\
                   # License: For licensing see the License.txt file\n\
                   \n\
                   x = 1\n";
    match evaluate(&ctx, content) {
      Decision::Foreign { score } => assert_eq!(score, 0.0),
      other => panic!("expected foreign, got {other:?}"),
    }
  }

  #[test]
  fn insert_then_reevaluate_is_a_noop() {
    let set = template_set();
    let template = set.for_path(Path::new("a.py")).expect("python template");
    let guard = EntityGuard::default();
    let ctx = context(template, &guard, true);

    let Decision::Insert { content, .. } = evaluate(&ctx, "x = 1\n") else {
      panic!("expected insert");
    };
    assert_eq!(evaluate(&ctx, &content), Decision::UpToDate);
  }

  #[test]
  fn shebang_stays_on_top_after_insert() {
    let set = template_set();
    let template = set.for_path(Path::new("a.py")).expect("python template");
    let guard = EntityGuard::default();
    let ctx = context(template, &guard, true);

    match evaluate(&ctx, "#!/usr/bin/env python3\nprint('hi')\n") {
      Decision::Insert { content, .. } => {
        assert!(content.starts_with("#!/usr/bin/env python3\n# Copyright"));
      }
      other => panic!("expected insert, got {other:?}"),
    }
  }
}
