//! # renotice
//!
//! A tool that keeps copyright notice headers in source files accurate: it inserts missing
//! headers, refreshes stale year ranges, and replaces reworded copies of the canonical notice
//! while leaving headers that belong to someone else untouched.
//!
//! Header templates live in per-directory definition files; the nearest one up the directory
//! tree governs each source file, so subtrees can carry their own notice. Year ranges are
//! derived from git history when the workspace is a repository.
//!
//! ## Features
//!
//! * Recursively scan directories and insert copyright headers in source files
//! * Per-directory template files with per-file-type header sections
//! * Fuzzy matching so reworded or outdated headers are recognized and replaced
//! * Ownership guard that never rewrites a third party's header
//! * Year ranges merged from git commit history (project inception or per-file first commit)
//! * Check-only mode to verify headers without modifying files
//!
//! ## Usage as a Library
//!
//! This crate can be used as a library in your Rust projects:
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use renotice::diff::DiffManager;
//! use renotice::entity::EntityGuard;
//! use renotice::git::ProvenanceIndex;
//! use renotice::processor::{Processor, ProcessorConfig};
//! use renotice::resolver::TemplateResolver;
//! use renotice::template::DEFAULT_TEMPLATE_FILENAME;
//! use renotice::years::YearPolicy;
//!
//! fn main() -> anyhow::Result<()> {
//!     let root = PathBuf::from(".");
//!     let processor = Processor::new(ProcessorConfig {
//!         workspace_root: root.clone(),
//!         resolver: TemplateResolver::hierarchical(&root, DEFAULT_TEMPLATE_FILENAME),
//!         guard: EntityGuard::new(Vec::new()),
//!         provenance: ProvenanceIndex::collect(&root)?,
//!         year_policy: YearPolicy::default(),
//!         modify: false,
//!         ignore_patterns: Vec::new(),
//!         template_filename: DEFAULT_TEMPLATE_FILENAME.to_string(),
//!         diff: DiffManager::new(false, None),
//!     })?;
//!
//!     let needs_changes = processor.process(&["src".to_string()])?;
//!     if needs_changes {
//!         println!("Some files need header updates");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`processor`] - Core functionality for processing files and directories
//! * [`template`] - Header template parsing and rendering
//! * [`decision`] - Per-file outcome evaluation
//! * [`logging`] - Logging utilities for verbose output
//!
//! [`processor`]: crate::processor
//! [`template`]: crate::template
//! [`decision`]: crate::decision
//! [`logging`]: crate::logging

// Re-export modules for public API
pub mod config;
pub mod decision;
pub mod diff;
pub mod entity;
pub mod file_filter;
pub mod git;
pub mod header;
pub mod logging;
pub mod output;
pub mod processor;
pub mod report;
pub mod resolver;
pub mod similarity;
pub mod template;
pub mod workspace;
pub mod years;

// Re-export macros
// Note: We don't re-export the macros here since they're already defined in the logging module
// and would cause redefinition errors
