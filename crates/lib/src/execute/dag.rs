//! Action DAG for dependency-ordered execution.
//!
//! This module wraps the planned actions in a petgraph `DiGraph` with an edge
//! from every dependency to its dependent, verifies the graph is acyclic, and
//! answers the dependency queries the scheduler needs.

use std::collections::BTreeSet;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::action::{Action, ActionId, ActionKind};
use crate::graph::GraphError;

/// A DAG of planned actions.
///
/// Action `n` lives at node index `n`, so ids and node indices convert
/// directly.
#[derive(Debug)]
pub struct ActionGraph {
  actions: Vec<Action>,
  graph: DiGraph<ActionId, ()>,
  order: Vec<ActionId>,
}

impl ActionGraph {
  /// Build the DAG, validating ids, dependency references and acyclicity.
  pub fn new(actions: Vec<Action>) -> Result<Self, GraphError> {
    let mut graph = DiGraph::with_capacity(actions.len(), 0);

    for (position, action) in actions.iter().enumerate() {
      debug_assert_eq!(action.id.0, position, "action ids must be dense and ordered");
      graph.add_node(action.id);
    }

    for action in &actions {
      for dep in &action.dependencies {
        if dep.0 >= actions.len() {
          return Err(GraphError::DanglingDependency {
            action: action.id,
            dependency: *dep,
          });
        }
        // Edge from dependency to dependent
        graph.add_edge(NodeIndex::new(dep.0), NodeIndex::new(action.id.0), ());
      }
    }

    let sorted = toposort(&graph, None).map_err(|_| GraphError::CyclicGraph)?;
    let order = sorted.into_iter().map(|idx| graph[idx]).collect();

    Ok(Self { actions, graph, order })
  }

  pub fn action(&self, id: ActionId) -> &Action {
    &self.actions[id.0]
  }

  pub fn actions(&self) -> &[Action] {
    &self.actions
  }

  /// Action ids with every dependency before its dependents.
  pub fn topological(&self) -> &[ActionId] {
    &self.order
  }

  /// Actions that list `id` as a direct dependency.
  pub fn dependents(&self, id: ActionId) -> Vec<ActionId> {
    let mut out: Vec<ActionId> = self
      .graph
      .neighbors_directed(NodeIndex::new(id.0), Direction::Outgoing)
      .map(|idx| self.graph[idx])
      .collect();
    out.sort();
    out
  }

  /// Every action reachable from `id` through dependent edges.
  pub fn transitive_dependents(&self, id: ActionId) -> BTreeSet<ActionId> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
      for next in self.dependents(current) {
        if seen.insert(next) {
          stack.push(next);
        }
      }
    }
    seen
  }

  pub fn count(&self, kind: ActionKind) -> usize {
    self.actions.iter().filter(|a| a.kind == kind).count()
  }

  pub fn len(&self) -> usize {
    self.actions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.actions.is_empty()
  }
}
