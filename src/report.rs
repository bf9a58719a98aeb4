//! # Report Module
//!
//! Captures the outcome of every processed file and renders machine-readable
//! reports (JSON, CSV) alongside the run summary the terminal output is
//! built from.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Outcome of processing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileAction {
  /// A header was inserted (or would be, in check mode).
  Inserted,
  /// An outdated header was replaced (or would be, in check mode).
  Replaced,
  /// The file already carried the canonical header.
  UpToDate,
  /// No template governs this file, or a filter excluded it.
  Skipped,
  /// The header belongs to another organization and was left alone.
  Foreign,
  /// The file could not be read or written.
  Failed,
}

impl FileAction {
  /// Whether the file required (or received) a change.
  pub const fn is_change(self) -> bool {
    matches!(self, FileAction::Inserted | FileAction::Replaced)
  }
}

/// Information about a processed file for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
  /// Path to the file
  #[serde(with = "path_serialization")]
  pub path: PathBuf,
  /// Outcome for the file
  pub action: FileAction,
  /// Similarity score behind a fuzzy replacement or a foreign verdict
  #[serde(skip_serializing_if = "Option::is_none")]
  pub score: Option<f64>,
  /// Year range carried by the header after the run, when one was written
  #[serde(skip_serializing_if = "Option::is_none")]
  pub years: Option<String>,
  /// Why the file was skipped or failed, if applicable
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
}

impl FileReport {
  pub fn new(path: PathBuf, action: FileAction) -> Self {
    Self {
      path,
      action,
      score: None,
      years: None,
      detail: None,
    }
  }

  pub fn with_score(mut self, score: Option<f64>) -> Self {
    self.score = score;
    self
  }

  pub fn with_years(mut self, years: impl Into<String>) -> Self {
    self.years = Some(years.into());
    self
  }

  pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
    self.detail = Some(detail.into());
    self
  }
}

/// Helper module for serializing/deserializing PathBuf
mod path_serialization {
  use std::path::PathBuf;

  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(path: &std::path::Path, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&path.to_string_lossy())
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;
    Ok(PathBuf::from(s))
  }
}

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
  /// JSON format for machine readability
  Json,
  /// CSV format for spreadsheet compatibility
  Csv,
}

impl std::fmt::Display for ReportFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ReportFormat::Json => write!(f, "JSON"),
      ReportFormat::Csv => write!(f, "CSV"),
    }
  }
}

/// Error returned when parsing a string into a ReportFormat fails
#[derive(Debug, thiserror::Error)]
#[error("Invalid report format: {0}")]
pub struct ParseReportFormatError(pub String);

impl std::str::FromStr for ReportFormat {
  type Err = ParseReportFormatError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "json" => Ok(ReportFormat::Json),
      "csv" => Ok(ReportFormat::Csv),
      _ => Err(ParseReportFormatError(s.to_string())),
    }
  }
}

/// Writes file reports plus a summary to disk in the requested format.
pub struct ReportGenerator<'a> {
  format: ReportFormat,
  output_path: &'a std::path::Path,
}

impl<'a> ReportGenerator<'a> {
  /// Create a new report generator
  ///
  /// # Parameters
  ///
  /// * `format` - The format to use for the report
  /// * `output_path` - The path where the report will be saved
  pub const fn new(format: ReportFormat, output_path: &'a std::path::Path) -> Self {
    Self { format, output_path }
  }

  /// Generate a report from a collection of file reports
  ///
  /// # Errors
  ///
  /// Fails when the report cannot be serialized or written to disk.
  pub fn generate(&self, files: &[FileReport], summary: &ProcessingSummary) -> Result<()> {
    let content = match self.format {
      ReportFormat::Json => self.generate_json(files, summary)?,
      ReportFormat::Csv => self.generate_csv(files, summary),
    };

    fs::write(self.output_path, content)
      .with_context(|| format!("Failed to write report to {}", self.output_path.display()))
  }

  fn generate_json(&self, files: &[FileReport], summary: &ProcessingSummary) -> Result<String> {
    let report = serde_json::json!({
      "summary": summary,
      "files": files,
    });
    Ok(serde_json::to_string_pretty(&report)?)
  }

  fn generate_csv(&self, files: &[FileReport], summary: &ProcessingSummary) -> String {
    let mut csv = String::from("file_path,action,score,years,detail\n");
    for file in files {
      let path = file.path.to_string_lossy().replace(',', "%2C");
      let action = match file.action {
        FileAction::Inserted => "inserted",
        FileAction::Replaced => "replaced",
        FileAction::UpToDate => "up-to-date",
        FileAction::Skipped => "skipped",
        FileAction::Foreign => "foreign",
        FileAction::Failed => "failed",
      };
      let score = file.score.map(|s| format!("{s:.3}")).unwrap_or_default();
      let years = file.years.clone().unwrap_or_default();
      let detail = file.detail.as_deref().unwrap_or_default().replace(',', "%2C");
      csv.push_str(&format!("{path},{action},{score},{years},{detail}\n"));
    }

    csv.push_str("\n# Summary\n");
    csv.push_str(&format!("Total files,{}\n", summary.total_files));
    csv.push_str(&format!("Headers inserted,{}\n", summary.inserted));
    csv.push_str(&format!("Headers replaced,{}\n", summary.replaced));
    csv.push_str(&format!("Up to date,{}\n", summary.up_to_date));
    csv.push_str(&format!("Skipped,{}\n", summary.skipped));
    csv.push_str(&format!("Foreign headers,{}\n", summary.foreign));
    csv.push_str(&format!("Failures,{}\n", summary.failed));
    csv.push_str(&format!(
      "Processing time (seconds),{:.2}\n",
      summary.processing_time.as_secs_f64()
    ));
    csv.push_str(&format!("Generated on,{}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));
    csv
  }
}

/// Summary of the processing results
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
  /// Total number of files considered
  pub total_files: usize,
  /// Number of headers inserted (or needing insertion)
  pub inserted: usize,
  /// Number of headers replaced (or needing replacement)
  pub replaced: usize,
  /// Number of files already carrying the canonical header
  pub up_to_date: usize,
  /// Number of files skipped (no template, or filtered out)
  pub skipped: usize,
  /// Number of foreign headers left untouched
  pub foreign: usize,
  /// Number of files that failed to read or write
  pub failed: usize,
  /// Total processing time
  #[serde(skip_serializing)]
  pub processing_time: std::time::Duration,
  /// Processing time in seconds for serialization
  #[serde(rename = "processing_time_seconds")]
  pub processing_time_secs: f64,
  /// Timestamp when the report was generated
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<i64>,
}

impl ProcessingSummary {
  /// Create a ProcessingSummary from a collection of FileReports
  pub fn from_reports(files: &[FileReport], processing_time: std::time::Duration) -> Self {
    let mut summary = Self {
      total_files: files.len(),
      inserted: 0,
      replaced: 0,
      up_to_date: 0,
      skipped: 0,
      foreign: 0,
      failed: 0,
      processing_time,
      processing_time_secs: processing_time.as_secs_f64(),
      timestamp: Some(Local::now().timestamp()),
    };

    for file in files {
      match file.action {
        FileAction::Inserted => summary.inserted += 1,
        FileAction::Replaced => summary.replaced += 1,
        FileAction::UpToDate => summary.up_to_date += 1,
        FileAction::Skipped => summary.skipped += 1,
        FileAction::Foreign => summary.foreign += 1,
        FileAction::Failed => summary.failed += 1,
      }
    }
    summary
  }

  /// Whether any file needed (or received) a change or failed outright.
  pub const fn requires_attention(&self) -> bool {
    self.inserted > 0 || self.replaced > 0 || self.failed > 0
  }
}
