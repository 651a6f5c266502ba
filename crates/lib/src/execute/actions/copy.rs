//! Staging copies.

use std::path::Path;

use tracing::debug;

use crate::execute::types::ActionError;

/// Copy `from` to `to`, creating the destination directory.
pub async fn copy_file(from: &Path, to: &Path) -> Result<(), ActionError> {
  let staging_err = |e: std::io::Error| ActionError::StagingIo {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    message: e.to_string(),
  };

  if let Some(parent) = to.parent() {
    tokio::fs::create_dir_all(parent).await.map_err(staging_err)?;
  }
  let bytes = tokio::fs::copy(from, to).await.map_err(staging_err)?;

  debug!(from = %from.display(), to = %to.display(), bytes, "staged file");
  Ok(())
}
