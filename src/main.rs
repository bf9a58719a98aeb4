//! # renotice
//!
//! A tool that keeps copyright notice headers in source files accurate.

mod cli;
mod config;
mod decision;
mod diff;
mod entity;
mod file_filter;
mod git;
mod header;
mod logging;
mod output;
mod processor;
mod report;
mod resolver;
mod similarity;
mod template;
mod workspace;
mod years;

use crate::cli::{Cli, run_check};

fn main() {
  let cli = Cli::parse_args();
  // Exit 2 for fatal errors; exit 1 (changes needed) happens inside run_check.
  if let Err(e) = run_check(cli.get_check_args()) {
    eprintln!("ERROR: {e:#}");
    std::process::exit(2);
  }
}
