use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::toolchain::CommandSpec;
use crate::util::hash::{ContentHash, SignatureBuilder, SignatureMode, file_signature};

/// Index of an action within one planned graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub usize);

impl fmt::Display for ActionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
  Compile,
  Link,
  Copy,
}

impl ActionKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Compile => "compile",
      Self::Link => "link",
      Self::Copy => "copy",
    }
  }
}

impl fmt::Display for ActionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// What executing an action means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandIntent {
  /// Spawn a toolchain process.
  Run(CommandSpec),
  /// Copy a file.
  Copy { source: PathBuf, destination: PathBuf },
}

impl CommandIntent {
  /// Stable text identifying the intent, folded into the action signature so
  /// changed flags or paths make the action stale.
  pub fn fingerprint(&self) -> String {
    match self {
      Self::Run(cmd) => format!("run:{}\0{}", cmd.cwd.display(), cmd),
      Self::Copy { source, destination } => format!("copy:{}\0{}", source.display(), destination.display()),
    }
  }
}

impl fmt::Display for CommandIntent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Run(cmd) => write!(f, "{}", cmd),
      Self::Copy { source, destination } => write!(f, "copy {} -> {}", source.display(), destination.display()),
    }
  }
}

/// A resolved unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
  pub id: ActionId,
  pub kind: ActionKind,
  /// Human-readable name, e.g. `engine::game.obj`.
  pub label: String,
  pub inputs: BTreeSet<PathBuf>,
  pub outputs: BTreeSet<PathBuf>,
  pub intent: CommandIntent,
  /// Actions that must complete successfully before this one starts.
  pub dependencies: BTreeSet<ActionId>,
}

impl Action {
  /// Signature of everything this action consumes: its intent and every input file.
  pub fn signature(&self, mode: SignatureMode) -> ContentHash {
    let mut builder = SignatureBuilder::new();
    builder
      .part("kind", self.kind.as_str())
      .part("intent", &self.intent.fingerprint());
    for input in &self.inputs {
      builder.part(&input.display().to_string(), &file_signature(input, mode));
    }
    builder.finish()
  }

  /// True when any declared output is absent on disk.
  pub fn missing_output(&self) -> bool {
    self.outputs.iter().any(|o| !o.exists())
  }
}
