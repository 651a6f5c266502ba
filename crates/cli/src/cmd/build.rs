//! Implementation of the `kiln build` command.

use anyhow::{Context, Result, bail};
use clap::Args;

use kiln_lib::execute::BuildReport;
use kiln_lib::session::BuildError;

use super::{ExecArgs, ManifestArgs};
use crate::output::{
  format_duration, print_action, print_diagnostics, print_error, print_info, print_json, print_success, print_warning,
  symbols,
};

#[derive(Args, Debug)]
pub struct BuildArgs {
  #[command(flatten)]
  pub manifest: ManifestArgs,

  #[command(flatten)]
  pub exec: ExecArgs,

  /// Print the build report as JSON
  #[arg(long)]
  pub json: bool,
}

/// Build the active backend and print the report.
///
/// A failed build still prints everything that ran, then every failed action
/// with its diagnostics and every action it blocked.
pub fn cmd_build(args: &BuildArgs, verbose: bool) -> Result<()> {
  let session = args.manifest.session(&args.exec)?;

  match session.build_blocking() {
    Ok(report) => {
      if args.json {
        print_json(&report)?;
      } else {
        print_report(&report, verbose);
      }
      Ok(())
    }
    Err(BuildError::Failed(failed)) => {
      let report = &failed.report;
      if args.json {
        print_json(report)?;
      } else {
        print_report(report, verbose);
        print_failures(report, verbose);
      }
      bail!(
        "build failed: {} action(s) failed, {} blocked",
        report.failed.len(),
        report.blocked.len()
      )
    }
    Err(e) => Err(e).context("build failed"),
  }
}

fn print_report(report: &BuildReport, verbose: bool) {
  for action in &report.executed {
    print_action(
      symbols::STALE,
      action.kind,
      &action.label,
      &format_duration(action.duration()),
    );
  }
  if verbose {
    for action in &report.up_to_date {
      print_action(symbols::FRESH, action.kind, &action.label, "up to date");
    }
  }

  if !report.is_success() {
    return;
  }
  if report.executed.is_empty() {
    print_info(&format!("{}: everything up to date", report.backend));
  } else {
    print_success(&format!("{} in {}", report, format_duration(report.elapsed)));
  }
}

fn print_failures(report: &BuildReport, verbose: bool) {
  for failed in &report.failed {
    print_error(&format!("{} {} failed", failed.kind, failed.label));
    if verbose {
      print_diagnostics(&failed.error.to_string());
    } else {
      print_diagnostics(diagnostics_only(&failed.error.to_string()));
    }
  }

  for blocked in &report.blocked {
    let cause = report
      .failed
      .iter()
      .find(|f| f.id == blocked.failed_dependency)
      .map(|f| f.label.as_str())
      .unwrap_or("a dependency");
    print_warning(&format!("{} {} not run: {} failed", blocked.kind, blocked.label, cause));
  }
}

/// Drop the leading "<kind> of <action> failed: <command>" line.
fn diagnostics_only(message: &str) -> &str {
  match message.split_once('\n') {
    Some((_, rest)) if !rest.trim().is_empty() => rest,
    _ => message,
  }
}
