//! Toolchain process execution.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tokio::process::Command;
use tracing::{debug, info};

use crate::action::ActionKind;
use crate::execute::types::ActionError;
use crate::toolchain::CommandSpec;

/// Run a compile or link command.
///
/// Parent directories of `outputs` and the working directory are created
/// first. On a non-zero exit the captured stderr and stdout are returned in
/// [`ActionError::CompileFailed`] or [`ActionError::LinkFailed`].
///
/// # Returns
///
/// The trimmed stdout of the command on success.
pub async fn run_command(
  cmd: &CommandSpec,
  kind: ActionKind,
  label: &str,
  outputs: &BTreeSet<PathBuf>,
) -> Result<String, ActionError> {
  let dirs = outputs.iter().filter_map(|o| o.parent()).chain(std::iter::once(cmd.cwd.as_path()));
  for dir in dirs {
    tokio::fs::create_dir_all(dir).await.map_err(|e| ActionError::Io {
      path: dir.to_path_buf(),
      message: e.to_string(),
    })?;
  }

  info!(action = %label, kind = %kind, "running {}", cmd.program);
  debug!(command = %cmd, cwd = %cmd.cwd.display(), "spawning process");

  let output = Command::new(&cmd.program)
    .args(&cmd.args)
    .current_dir(&cmd.cwd)
    .output()
    .await
    .map_err(|e| ActionError::Spawn {
      program: cmd.program.clone(),
      message: e.to_string(),
    })?;

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut diagnostics = stderr.trim().to_string();
    if !stdout.is_empty() {
      if !diagnostics.is_empty() {
        diagnostics.push('\n');
      }
      diagnostics.push_str(&stdout);
    }
    if let Some(code) = output.status.code() {
      debug!(action = %label, code, "command exited unsuccessfully");
    }

    let action = label.to_string();
    let command = cmd.to_string();
    return Err(match kind {
      ActionKind::Link => ActionError::LinkFailed {
        action,
        command,
        output: diagnostics,
      },
      _ => ActionError::CompileFailed {
        action,
        command,
        output: diagnostics,
      },
    });
  }

  if !stdout.is_empty() {
    debug!(action = %label, stdout = %stdout, "command output");
  }

  Ok(stdout)
}
