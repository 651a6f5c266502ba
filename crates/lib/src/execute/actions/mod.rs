//! Action runners.
//!
//! This module dispatches a planned action to the runner for its intent.

pub mod cmd;
pub mod copy;

use crate::action::{Action, CommandIntent};
use crate::execute::types::ActionError;

pub use cmd::run_command;
pub use copy::copy_file;

/// Execute a single action.
pub async fn run_action(action: &Action) -> Result<(), ActionError> {
  match &action.intent {
    CommandIntent::Run(cmd) => {
      run_command(cmd, action.kind, &action.label, &action.outputs).await?;
      Ok(())
    }
    CommandIntent::Copy { source, destination } => copy_file(source, destination).await,
  }
}
