//! Incremental action execution.
//!
//! This module runs a planned [`ActionGraph`] against a [`BuildState`]:
//! - staleness from recorded signatures, missing outputs and rebuilt dependencies
//! - dependency-ordered dispatch with bounded parallelism
//! - failure collection, with dependents of a failed action never dispatched
//!
//! The dispatch loop is the only writer of the build state. A record for an
//! output is written after its action exits successfully and before any
//! dependent is dispatched.

pub mod actions;
pub mod dag;
pub mod types;

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info, warn};

use crate::action::{Action, ActionId};
use crate::state::{ActionRecord, BuildState};
use crate::util::hash::{ContentHash, SignatureMode};

pub use dag::ActionGraph;
pub use types::{
  ActionError, BlockedAction, BuildReport, ExecuteConfig, ExecutedAction, FailedAction, PlannedAction, Staleness,
  UpToDateAction,
};

/// Decide whether `action` must run.
///
/// `forced` is set when a dependency executed in this build.
pub fn staleness(action: &Action, signature: &ContentHash, state: &BuildState, forced: bool) -> Staleness {
  if forced {
    return Staleness::DependencyRebuilt;
  }

  let mut records = action.outputs.iter().map(|o| state.get(o));
  if records.any(|r| r.is_none()) {
    return Staleness::NoRecord;
  }
  let changed = action
    .outputs
    .iter()
    .filter_map(|o| state.get(o))
    .any(|r| &r.signature != signature);
  if changed {
    return Staleness::InputsChanged;
  }
  if action.missing_output() {
    return Staleness::OutputMissing;
  }
  Staleness::UpToDate
}

/// Dry run: the staleness verdict for every action, propagated through
/// dependencies, without executing anything.
pub fn plan_staleness(dag: &ActionGraph, state: &BuildState, mode: SignatureMode) -> Vec<PlannedAction> {
  let mut stale: HashSet<ActionId> = HashSet::new();
  let mut planned = BTreeMap::new();

  for id in dag.topological() {
    let action = dag.action(*id);
    let forced = action.dependencies.iter().any(|d| stale.contains(d));
    let verdict = staleness(action, &action.signature(mode), state, forced);
    if verdict.is_stale() {
      stale.insert(*id);
    }
    planned.insert(
      *id,
      PlannedAction {
        id: *id,
        kind: action.kind,
        label: action.label.clone(),
        staleness: verdict,
        command: action.intent.to_string(),
      },
    );
  }

  planned.into_values().collect()
}

/// What a dispatched task reports back to the loop.
struct TaskOutcome {
  id: ActionId,
  signature: Option<ContentHash>,
  result: Result<Option<(Duration, Duration)>, ActionError>,
}

/// Execute every action in `dag` that is stale with respect to `state`.
///
/// Actions are dispatched once all their dependencies have completed
/// successfully, at most `config.parallelism` at a time. A failure does not
/// stop independent actions; it blocks everything downstream of it. `state`
/// gains a record for every action that succeeded and loses the record of
/// every action that failed.
pub async fn execute(dag: &ActionGraph, state: &mut BuildState, config: &ExecuteConfig) -> BuildReport {
  let start = Instant::now();
  let mut report = BuildReport::new(state.backend.clone());

  info!(
    backend = %state.backend,
    actions = dag.len(),
    parallelism = config.parallelism,
    "starting build execution"
  );

  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
  let mut join_set: JoinSet<TaskOutcome> = JoinSet::new();
  let mut in_flight: HashMap<Id, ActionId> = HashMap::new();

  let mut waiting: Vec<usize> = dag.actions().iter().map(|a| a.dependencies.len()).collect();
  let mut forced: HashSet<ActionId> = HashSet::new();
  let mut blocked: HashSet<ActionId> = HashSet::new();
  let mut ready: VecDeque<ActionId> = dag
    .topological()
    .iter()
    .copied()
    .filter(|id| waiting[id.0] == 0)
    .collect();

  loop {
    while let Some(id) = ready.pop_front() {
      let action = dag.action(id).clone();
      let previous = records_for(state, &action);
      let force = forced.contains(&id);
      let semaphore = semaphore.clone();
      let mode = config.signature;

      let handle = join_set.spawn(async move {
        // Input hashing counts against the parallelism bound too.
        let Ok(_permit) = semaphore.acquire().await else {
          return TaskOutcome {
            id,
            signature: None,
            result: Err(ActionError::Aborted("scheduler closed".to_string())),
          };
        };

        let assessed = tokio::task::spawn_blocking(move || {
          let signature = action.signature(mode);
          let verdict = staleness(&action, &signature, &previous, force);
          (action, signature, verdict)
        })
        .await;
        let (action, signature, verdict) = match assessed {
          Ok(assessed) => assessed,
          Err(e) => {
            return TaskOutcome {
              id,
              signature: None,
              result: Err(ActionError::Aborted(e.to_string())),
            };
          }
        };

        if !verdict.is_stale() {
          debug!(action = %action.label, "up to date");
          return TaskOutcome {
            id,
            signature: Some(signature),
            result: Ok(None),
          };
        }
        debug!(action = %action.label, reason = %verdict, "stale");

        let started = start.elapsed();
        let result = actions::run_action(&action).await;
        let finished = start.elapsed();

        TaskOutcome {
          id,
          signature: Some(signature),
          result: result.map(|()| Some((started, finished))),
        }
      });
      in_flight.insert(handle.id(), id);
    }

    let Some(joined) = join_set.join_next_with_id().await else {
      break;
    };

    let (id, signature, result) = match joined {
      Ok((task, outcome)) => {
        in_flight.remove(&task);
        (outcome.id, outcome.signature, outcome.result)
      }
      Err(e) => {
        let Some(id) = in_flight.remove(&e.id()) else {
          error!(error = %e, "unknown action task failed");
          continue;
        };
        (id, None, Err(ActionError::Aborted(e.to_string())))
      }
    };

    let action = dag.action(id);
    match result {
      Ok(None) => {
        report.up_to_date.push(UpToDateAction {
          id,
          kind: action.kind,
          label: action.label.clone(),
        });
      }
      Ok(Some((started, finished))) => {
        info!(action = %action.label, kind = %action.kind, "action succeeded");
        if let Some(signature) = signature {
          for output in &action.outputs {
            state.insert(
              output.clone(),
              ActionRecord {
                kind: action.kind,
                label: action.label.clone(),
                signature: signature.clone(),
              },
            );
          }
        }
        report.executed.push(ExecutedAction {
          id,
          kind: action.kind,
          label: action.label.clone(),
          started,
          finished,
        });
        forced.extend(dag.dependents(id));
      }
      Err(err) => {
        error!(action = %action.label, kind = %action.kind, error = %err, "action failed");
        for output in &action.outputs {
          state.remove(output);
        }
        report.failed.push(FailedAction {
          id,
          kind: action.kind,
          label: action.label.clone(),
          error: err,
        });

        for dependent in dag.transitive_dependents(id) {
          if blocked.insert(dependent) {
            let blocked_action = dag.action(dependent);
            warn!(
              action = %blocked_action.label,
              failed_dep = %action.label,
              "skipping action due to failed dependency"
            );
            report.blocked.push(BlockedAction {
              id: dependent,
              kind: blocked_action.kind,
              label: blocked_action.label.clone(),
              failed_dependency: id,
            });
          }
        }
        continue;
      }
    }

    for dependent in dag.dependents(id) {
      waiting[dependent.0] -= 1;
      if waiting[dependent.0] == 0 && !blocked.contains(&dependent) {
        ready.push_back(dependent);
      }
    }
  }

  report.elapsed = start.elapsed();
  info!(
    executed = report.executed.len(),
    up_to_date = report.up_to_date.len(),
    failed = report.failed.len(),
    blocked = report.blocked.len(),
    "build execution complete"
  );
  report
}

/// The records for `action`'s outputs, for handing to its task.
fn records_for(state: &BuildState, action: &Action) -> BuildState {
  let mut subset = BuildState::new(state.backend.clone());
  for output in &action.outputs {
    if let Some(record) = state.get(output) {
      subset.insert(output.clone(), record.clone());
    }
  }
  subset
}
