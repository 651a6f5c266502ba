//! Implementation of the `kiln resolve` command.

use anyhow::{Context, Result};
use clap::Args;

use kiln_lib::package::Package;

use super::ManifestArgs;
use crate::output::{print_json, print_stat, print_success, symbols};

#[derive(Args, Debug)]
pub struct ResolveArgs {
  /// Package names to resolve
  #[arg(required = true)]
  pub packages: Vec<String>,

  #[command(flatten)]
  pub manifest: ManifestArgs,

  /// Print the resolved packages as JSON
  #[arg(long)]
  pub json: bool,
}

/// Resolve each package for the active backend. Stops at the first failure.
pub fn cmd_resolve(args: &ResolveArgs) -> Result<()> {
  let (_, mut session) = args.manifest.backend_session()?;

  let mut resolved = Vec::with_capacity(args.packages.len());
  for name in &args.packages {
    let package = session
      .resolve_package(name)
      .with_context(|| format!("failed to resolve {}", name))?;
    resolved.push(package);
  }

  if args.json {
    return print_json(&resolved);
  }
  for package in &resolved {
    print_package(package);
  }
  Ok(())
}

fn print_package(package: &Package) {
  print_success(&format!("{} {} {}", package.name, symbols::ARROW, package.toolchain));
  for dir in &package.include_paths {
    print_stat("include", &dir.display().to_string());
  }
  for dir in &package.lib_paths {
    print_stat("lib dir", &dir.display().to_string());
  }
  if !package.link_libs.is_empty() {
    print_stat("link", &package.link_libs.join(" "));
  }
  for file in &package.runtime_files {
    print_stat("runtime", &file.display().to_string());
  }
}
