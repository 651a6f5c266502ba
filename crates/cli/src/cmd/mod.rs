mod backends;
mod build;
mod clean;
mod plan;
mod resolve;

pub use backends::cmd_backends;
pub use build::{BuildArgs, cmd_build};
pub use clean::{CleanArgs, cmd_clean};
pub use plan::{PlanArgs, cmd_plan};
pub use resolve::{ResolveArgs, cmd_resolve};

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use kiln_lib::Session;
use kiln_lib::consts::MANIFEST_FILENAME;
use kiln_lib::execute::ExecuteConfig;
use kiln_lib::manifest::BuildManifest;
use kiln_lib::package::package_roots_from_env;
use kiln_lib::util::hash::SignatureMode;

/// Options shared by every command that reads a build description.
#[derive(Args, Debug)]
pub struct ManifestArgs {
  /// Path to the build description
  #[arg(short = 'f', long = "file", default_value = MANIFEST_FILENAME)]
  pub file: PathBuf,

  /// Backend to activate instead of the description's `active`
  #[arg(short, long)]
  pub backend: Option<String>,
}

/// Options that tune execution.
#[derive(Args, Debug)]
pub struct ExecArgs {
  /// Maximum number of actions run at once (default: KILN_JOBS or CPU count)
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// How inputs are fingerprinted: content or metadata
  #[arg(long)]
  pub signature: Option<SignatureMode>,
}

impl ManifestArgs {
  pub fn load(&self) -> Result<BuildManifest> {
    let path = dunce::canonicalize(&self.file)
      .with_context(|| format!("build description not found: {}", self.file.display()))?;
    debug!(path = %path.display(), "loading build description");
    BuildManifest::load(&path).with_context(|| format!("failed to load {}", path.display()))
  }

  /// A session with every backend registered and one activated.
  pub fn backend_session(&self) -> Result<(BuildManifest, Session)> {
    let manifest = self.load()?;
    let mut session = Session::with_config(ExecuteConfig::from_env(), package_roots_from_env());
    manifest
      .apply_backends(&mut session, self.backend.as_deref())
      .context("failed to activate backend")?;
    Ok((manifest, session))
  }

  /// A session with the whole build description applied.
  pub fn session(&self, exec: &ExecArgs) -> Result<Session> {
    let mut config = ExecuteConfig::from_env();
    if let Some(jobs) = exec.jobs {
      config = config.with_parallelism(jobs);
    }
    if let Some(signature) = exec.signature {
      config = config.with_signature(signature);
    }

    let manifest = self.load()?;
    let mut session = Session::with_config(config, package_roots_from_env());
    manifest
      .apply(&mut session, self.backend.as_deref())
      .context("failed to apply build description")?;
    Ok(session)
  }
}
