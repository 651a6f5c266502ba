//! Planning: declared nodes + active toolchain -> action DAG.
//!
//! Declared objects become compile actions, executables become link actions
//! depending on the compile actions of every object they consume, and each
//! staged file becomes an independent copy action.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::action::{Action, ActionId, ActionKind, CommandIntent};
use crate::execute::ActionGraph;
use crate::package::Package;
use crate::toolchain::{CompileUnit, LinkUnit, Toolchain};

use super::builder::BuildGraph;
use super::types::{BuildNode, GraphError, Namespace};

/// Turn the declared graph into actions for `toolchain`.
///
/// `generation` is the registry's current activation; packages resolved under
/// another backend or an earlier activation are rejected.
pub fn plan(graph: &BuildGraph, toolchain: &dyn Toolchain, generation: u64) -> Result<ActionGraph, GraphError> {
  check_packages(graph, toolchain, generation)?;

  let desc = toolchain.descriptor();
  let build_path = desc.build_path();
  let bin_path = desc.bin_path();

  let mut actions: Vec<Action> = Vec::new();
  let mut outputs = OutputClaims::default();
  outputs.claim(&desc.state_path(), "build state".to_string(), false)?;
  // Node index -> (compile action, object path)
  let mut compiled: HashMap<usize, (ActionId, PathBuf)> = HashMap::new();

  for (index, node) in graph.nodes().iter().enumerate() {
    let BuildNode::Object(object) = node else {
      continue;
    };

    let id = ActionId(actions.len());
    let output = object.namespace.dir_under(&build_path).join(&object.output_name);
    let source = desc.resolve_path(&object.source_path);
    let include_dirs = include_dirs(&object.packages);

    let cmd = toolchain.compile(&CompileUnit {
      source: &source,
      output: &output,
      include_dirs: &include_dirs,
    });

    outputs.claim(&output, node.label(), false)?;
    compiled.insert(index, (id, output.clone()));
    actions.push(Action {
      id,
      kind: ActionKind::Compile,
      label: node.label(),
      inputs: BTreeSet::from([source]),
      outputs: BTreeSet::from([output]),
      intent: CommandIntent::Run(cmd),
      dependencies: BTreeSet::new(),
    });
  }

  for node in graph.nodes() {
    let BuildNode::Executable(exe) = node else {
      continue;
    };

    let id = ActionId(actions.len());
    let output = exe.namespace.dir_under(&bin_path).join(&exe.output_name);
    let sources: Vec<PathBuf> = exe.sources.iter().map(|s| desc.resolve_path(s)).collect();

    let mut dependencies = BTreeSet::new();
    let mut objects = Vec::with_capacity(exe.objects.len());
    for handle in &exe.objects {
      let (dep, path) = compiled.get(&handle.index).ok_or(GraphError::UnknownObject)?;
      dependencies.insert(*dep);
      if !objects.contains(path) {
        objects.push(path.clone());
      }
    }

    let include_dirs = include_dirs(&exe.packages);
    let lib_dirs = ordered_unique(exe.packages.iter().flat_map(|p| p.lib_paths.iter().cloned()));
    let libs = ordered_unique(exe.packages.iter().flat_map(|p| p.link_libs.iter().cloned()));

    let cmd = toolchain.link(&LinkUnit {
      sources: &sources,
      objects: &objects,
      output: &output,
      include_dirs: &include_dirs,
      lib_dirs: &lib_dirs,
      libs: &libs,
    });

    outputs.claim(&output, node.label(), false)?;
    let inputs = sources.iter().chain(objects.iter()).cloned().collect();
    actions.push(Action {
      id,
      kind: ActionKind::Link,
      label: node.label(),
      inputs,
      outputs: BTreeSet::from([output]),
      intent: CommandIntent::Run(cmd),
      dependencies,
    });
  }

  for (name, source) in graph.staged() {
    let id = ActionId(actions.len());
    let source = desc.resolve_path(source);
    let destination = bin_path.join(name);

    outputs.claim(&destination, source.display().to_string(), true)?;
    actions.push(Action {
      id,
      kind: ActionKind::Copy,
      label: name.to_string(),
      inputs: BTreeSet::from([source.clone()]),
      outputs: BTreeSet::from([destination.clone()]),
      intent: CommandIntent::Copy { source, destination },
      dependencies: BTreeSet::new(),
    });
  }

  debug!(
    backend = %desc.name,
    actions = actions.len(),
    "planned build graph"
  );
  ActionGraph::new(actions)
}

fn check_packages(graph: &BuildGraph, toolchain: &dyn Toolchain, generation: u64) -> Result<(), GraphError> {
  for node in graph.nodes() {
    for package in node.packages() {
      if package.toolchain != toolchain.name() || package.generation != generation {
        return Err(GraphError::StalePackage {
          package: package.name.clone(),
          resolved_under: package.toolchain.clone(),
          active: toolchain.name().to_string(),
        });
      }
    }
  }
  Ok(())
}

fn include_dirs(packages: &[Package]) -> Vec<PathBuf> {
  ordered_unique(packages.iter().flat_map(|p| p.include_paths.iter().cloned()))
}

/// First occurrence wins; keeps package declaration order.
fn ordered_unique<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
  let mut out: Vec<T> = Vec::new();
  for item in items {
    if !out.contains(&item) {
      out.push(item);
    }
  }
  out
}

/// Tracks which action writes each output path.
///
/// Namespaces are directories, so a path may not be claimed when it is an
/// ancestor or descendant of one already claimed.
#[derive(Default)]
struct OutputClaims {
  /// Path -> (owner label, is a staged copy)
  owners: BTreeMap<PathBuf, (String, bool)>,
}

impl OutputClaims {
  fn claim(&mut self, path: &Path, owner: String, staged: bool) -> Result<(), GraphError> {
    let clash = self
      .owners
      .iter()
      .find(|(claimed, _)| path.starts_with(claimed) || claimed.starts_with(path));
    if let Some((claimed, (existing, existing_staged))) = clash {
      if claimed == path && (staged || *existing_staged) {
        return Err(GraphError::StagingConflict {
          destination: path.to_path_buf(),
          existing: existing.clone(),
          requested: PathBuf::from(owner),
        });
      }
      debug!(output = %path.display(), claimed = %claimed.display(), owner = %existing, "output path clash");
      return Err(GraphError::DuplicateOutput {
        namespace: Namespace::root(),
        name: path.display().to_string(),
      });
    }
    self.owners.insert(path.to_path_buf(), (owner, staged));
    Ok(())
  }
}
