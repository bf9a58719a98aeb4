//! # Check Command
//!
//! This module implements the check/modify command for copyright headers.
//! This is the default command when no subcommand is specified.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use tracing::debug;

use crate::config::{Config, load_config};
use crate::diff::DiffManager;
use crate::entity::EntityGuard;
use crate::git::ProvenanceIndex;
use crate::info_log;
use crate::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use crate::output::{
  CategorizedReports, print_all_files_ok, print_blank_line, print_failed_files, print_foreign_files, print_hint,
  print_inserted_files, print_replaced_files, print_start_message, print_summary,
};
use crate::processor::{Processor, ProcessorConfig};
use crate::report::{ProcessingSummary, ReportFormat, ReportGenerator};
use crate::resolver::TemplateResolver;
use crate::template::DEFAULT_TEMPLATE_FILENAME;
use crate::workspace::resolve_workspace;
use crate::years::YearPolicy;

/// Arguments for the check command
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
  /// File or directory patterns to process. Directories are processed
  /// recursively.
  #[arg(required = false)]
  pub patterns: Vec<String>,

  /// Path to config file (default: .renotice.toml in workspace root)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Ignore config file even if present
  #[arg(long)]
  pub no_config: bool,

  /// Dry run mode: only check headers without modifying files (default)
  #[arg(long, group = "mode", hide = true)]
  pub dry_run: bool,

  /// Modify mode: insert or update copyright headers in files
  #[arg(
    long,
    group = "mode",
    help = "Modify mode: insert or update copyright headers in files

[default: --dry-run]"
  )]
  pub modify: bool,

  /// Show diff of changes in dry run mode
  #[arg(long)]
  pub show_diff: bool,

  /// Save diff of changes to a file in dry run mode
  #[arg(long, short = 'o', value_name = "FILE")]
  pub save_diff: Option<PathBuf>,

  /// Use a single template file for the whole run instead of per-directory
  /// lookup
  #[arg(long, short = 't', value_name = "FILE")]
  pub template: Option<PathBuf>,

  /// Name of the template definition file looked up per directory
  #[arg(long, value_name = "NAME")]
  pub template_filename: Option<String>,

  /// Only use the template file in the workspace root, never in
  /// subdirectories
  #[arg(long, conflicts_with = "template")]
  pub no_hierarchical: bool,

  /// File patterns to ignore (supports glob patterns)
  #[arg(long, short = 'i')]
  pub ignore: Vec<String>,

  /// Known organizational unit name for header ownership checks (repeatable)
  #[arg(long, value_name = "NAME")]
  pub known_unit: Vec<String>,

  /// How the start year of new copyright ranges is chosen
  #[arg(long, value_enum, value_name = "POLICY")]
  pub year_policy: Option<YearPolicy>,

  /// Do not consult git history; every file is treated as modified
  #[arg(long)]
  pub no_git: bool,

  /// Increase verbosity
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,

  /// Generate a JSON report and save to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,

  /// Generate a CSV report and save to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_csv: Option<PathBuf>,

  /// Skip git repository ownership check. Useful when running in Docker or
  /// other containerized environments where the repository may be owned by a
  /// different user.
  #[arg(long)]
  pub skip_git_owner_check: bool,
}

impl CheckArgs {
  fn validate(&self) -> Result<(), String> {
    if self.patterns.is_empty() {
      return Err("Missing required argument: <PATTERNS>...".to_string());
    }
    Ok(())
  }
}

/// Run the check command with the given arguments
pub fn run_check(args: CheckArgs) -> Result<()> {
  if let Err(e) = args.validate() {
    eprintln!("ERROR: {e}");
    process::exit(2);
  }

  // Initialize tracing subscriber for structured logging
  init_tracing(args.quiet, args.verbose > 0);

  // Set verbose mode for output formatting and info_log! macro
  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  // Disable git ownership check if requested (useful in Docker)
  if args.skip_git_owner_check {
    debug!("Disabling git repository ownership check");
    // SAFETY: This is safe to call as long as no git operations are in progress.
    // We call this early, before any Repository operations.
    unsafe {
      let _ = git2::opts::set_verify_owner_validation(false);
    }
  }

  let check_only = args.dry_run || !args.modify;

  let workspace = resolve_workspace(&args.patterns)?;
  let workspace_root = workspace.root().to_path_buf();
  debug!("Using workspace root: {}", workspace_root.display());

  let config = load_config(args.config.as_deref(), &workspace_root, args.no_config)?.unwrap_or_default();

  // CLI arguments win over config file values.
  let settings = EffectiveSettings::merge(&args, config);

  let resolver = match (&settings.template_path, settings.hierarchical) {
    (Some(path), _) => TemplateResolver::fixed(path)?,
    (None, true) => TemplateResolver::hierarchical(&workspace_root, &settings.template_filename),
    // Hierarchy disabled without a fixed template: the root template file is
    // the only one, and its absence is a usage error rather than a silent
    // skip of every file.
    (None, false) => TemplateResolver::fixed(&workspace_root.join(&settings.template_filename))?,
  };

  let provenance = if settings.git_aware {
    let index = ProvenanceIndex::collect(&workspace_root)?;
    if index.is_git_aware() {
      info_log!("Git repository detected, using commit history for year provenance");
    }
    index
  } else {
    ProvenanceIndex::without_git()
  };

  let processor = Processor::new(ProcessorConfig {
    workspace_root: workspace_root.clone(),
    resolver,
    guard: EntityGuard::new(settings.known_units),
    provenance,
    year_policy: settings.year_policy,
    modify: !check_only,
    ignore_patterns: settings.ignore,
    template_filename: settings.template_filename,
    diff: DiffManager::new(args.show_diff, args.save_diff),
  })?;

  let files = processor.collect_files(&args.patterns)?;
  print_start_message(files.len(), !check_only);

  if files.is_empty() {
    print_blank_line();
    print_all_files_ok();
    return Ok(());
  }

  let start_time = Instant::now();
  processor.process_collected(&files)?;
  let elapsed = start_time.elapsed();

  let file_reports = processor.reports();
  let summary = ProcessingSummary::from_reports(&file_reports, elapsed);
  let categorized = CategorizedReports::from_reports(&file_reports);

  print_blank_line();
  if !summary.requires_attention() {
    print_all_files_ok();
  } else {
    let mut printed = false;
    if !categorized.inserted.is_empty() {
      print_inserted_files(&categorized.inserted, Some(&workspace_root), !check_only);
      printed = true;
    }
    if !categorized.replaced.is_empty() {
      if printed {
        print_blank_line();
      }
      print_replaced_files(&categorized.replaced, Some(&workspace_root), !check_only);
      printed = true;
    }
    if !categorized.failed.is_empty() {
      if printed {
        print_blank_line();
      }
      print_failed_files(&categorized.failed, Some(&workspace_root));
    }
  }
  print_foreign_files(&categorized.foreign, Some(&workspace_root));

  print_blank_line();
  print_summary(&summary);

  let has_missing = !categorized.inserted.is_empty();
  let has_outdated = !categorized.replaced.is_empty();
  if check_only && (has_missing || has_outdated) {
    print_blank_line();
    let hint = match (has_missing, has_outdated) {
      (true, true) => "Run with --modify to insert missing headers and update outdated ones.",
      (true, false) => "Run with --modify to insert missing headers.",
      _ => "Run with --modify to update outdated headers.",
    };
    print_hint(hint);
  }

  if let Some(ref output_path) = args.report_json {
    let report_generator = ReportGenerator::new(ReportFormat::Json, output_path);
    if let Err(e) = report_generator.generate(&file_reports, &summary) {
      eprintln!("Error generating JSON report: {}", e);
    } else {
      info_log!("Generated JSON report at {}", output_path.display());
    }
  }

  if let Some(ref output_path) = args.report_csv {
    let report_generator = ReportGenerator::new(ReportFormat::Csv, output_path);
    if let Err(e) = report_generator.generate(&file_reports, &summary) {
      eprintln!("Error generating CSV report: {}", e);
    } else {
      info_log!("Generated CSV report at {}", output_path.display());
    }
  }

  // Exit 1 when a check run found work to do, or when any file failed.
  if (check_only && summary.requires_attention()) || summary.failed > 0 {
    process::exit(1);
  }

  Ok(())
}

/// Settings after merging CLI arguments over the config file.
struct EffectiveSettings {
  template_filename: String,
  template_path: Option<PathBuf>,
  hierarchical: bool,
  year_policy: YearPolicy,
  git_aware: bool,
  ignore: Vec<String>,
  known_units: Vec<String>,
}

impl EffectiveSettings {
  fn merge(args: &CheckArgs, config: Config) -> Self {
    let mut ignore = config.ignore;
    ignore.extend(args.ignore.iter().cloned());

    let known_units = if args.known_unit.is_empty() {
      config.known_units
    } else {
      args.known_unit.clone()
    };

    Self {
      template_filename: args
        .template_filename
        .clone()
        .or(config.template_filename)
        .unwrap_or_else(|| DEFAULT_TEMPLATE_FILENAME.to_string()),
      template_path: args.template.clone().or(config.template_path),
      hierarchical: if args.no_hierarchical {
        false
      } else {
        config.hierarchical.unwrap_or(true)
      },
      year_policy: args.year_policy.or(config.year_policy).unwrap_or_default(),
      git_aware: if args.no_git {
        false
      } else {
        config.git_aware.unwrap_or(true)
      },
      ignore,
      known_units,
    }
  }
}
