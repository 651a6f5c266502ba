//! Implementation of the `kiln backends` command.

use anyhow::Result;
use serde::Serialize;

use kiln_lib::toolchain::ToolchainDescriptor;

use super::ManifestArgs;
use crate::output::{print_info, print_json, print_stat, print_success};

#[derive(Serialize)]
struct BackendItem<'a> {
  active: bool,
  #[serde(flatten)]
  descriptor: &'a ToolchainDescriptor,
}

/// List declared backends. The one a build would use is marked active.
pub fn cmd_backends(args: &ManifestArgs, json: bool) -> Result<()> {
  let (_, session) = args.backend_session()?;
  let active = session.active_backend().map(|d| d.name.as_str());

  let items: Vec<BackendItem<'_>> = session
    .backends()
    .map(|descriptor| BackendItem {
      active: Some(descriptor.name.as_str()) == active,
      descriptor,
    })
    .collect();

  if json {
    return print_json(&items);
  }

  for item in &items {
    let desc = item.descriptor;
    let title = format!("{} ({}, {})", desc.name, desc.flavor.as_str(), desc.arch);
    if item.active {
      print_success(&format!("{title} [active]"));
    } else {
      print_info(&title);
    }
    print_stat("build", &desc.build_path().display().to_string());
    print_stat("bin", &desc.bin_path().display().to_string());
    if let Some(program) = &desc.program {
      print_stat("program", program);
    }
  }
  Ok(())
}
