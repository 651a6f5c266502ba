//! Declarative graph construction.

use std::collections::{BTreeMap, HashSet};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::package::Package;

use super::types::{
  BuildNode, ExecutableHandle, ExecutableNode, GraphError, Namespace, ObjectHandle, ObjectNode, validate_output_name,
  validate_segment,
};

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Declared build nodes plus the files to stage, before planning.
///
/// Declarations are pure data: nothing touches the filesystem until the
/// graph is planned against a toolchain. A failed declaration leaves the
/// graph unchanged.
#[derive(Debug)]
pub struct BuildGraph {
  id: u64,
  nodes: Vec<BuildNode>,
  outputs: HashSet<(Namespace, String)>,
  namespace: Vec<String>,
  /// Destination file name -> source path.
  staged: BTreeMap<String, PathBuf>,
}

impl Default for BuildGraph {
  fn default() -> Self {
    Self::new()
  }
}

impl BuildGraph {
  pub fn new() -> Self {
    Self {
      id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
      nodes: Vec::new(),
      outputs: HashSet::new(),
      namespace: Vec::new(),
      staged: BTreeMap::new(),
    }
  }

  /// The namespace new declarations inherit.
  pub fn current_namespace(&self) -> Namespace {
    Namespace::from_segments(&self.namespace)
  }

  /// Push a namespace segment, returning the depth to restore on exit.
  fn push_namespace(&mut self, segment: &str) -> Result<usize, GraphError> {
    validate_segment(segment)?;
    let depth = self.namespace.len();
    self.namespace.push(segment.to_string());
    Ok(depth)
  }

  fn pop_namespace(&mut self, depth: usize) {
    self.namespace.truncate(depth);
  }

  pub fn enter_namespace(&mut self, name: &str) -> Result<NamespaceScope<'_, Self>, GraphError> {
    NamespaceScope::enter(self, name)
  }

  /// Run `f` with `name` pushed onto the namespace stack.
  pub fn with_namespace<R>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> R) -> Result<R, GraphError> {
    let mut scope = self.enter_namespace(name)?;
    Ok(f(&mut *scope))
  }

  fn claim_output(&mut self, name: &str) -> Result<Namespace, GraphError> {
    validate_output_name(name)?;
    let namespace = self.current_namespace();
    let key = (namespace.clone(), name.to_string());
    if self.outputs.contains(&key) {
      return Err(GraphError::DuplicateOutput {
        namespace,
        name: name.to_string(),
      });
    }
    self.outputs.insert(key);
    Ok(namespace)
  }

  /// Declare one compile target in the current namespace.
  pub fn declare_object(
    &mut self,
    output_name: &str,
    source_path: impl Into<PathBuf>,
    packages: &[Package],
  ) -> Result<ObjectHandle, GraphError> {
    let namespace = self.claim_output(output_name)?;
    let index = self.nodes.len();

    debug!(object = %namespace.qualify(output_name), "declared object");
    self.nodes.push(BuildNode::Object(ObjectNode {
      output_name: output_name.to_string(),
      source_path: source_path.into(),
      namespace,
      packages: packages.to_vec(),
    }));

    Ok(ObjectHandle { graph: self.id, index })
  }

  /// Declare one link target in the current namespace.
  ///
  /// Every object handle must come from this graph.
  pub fn declare_executable(
    &mut self,
    output_name: &str,
    sources: &[PathBuf],
    objects: &[ObjectHandle],
    packages: &[Package],
  ) -> Result<ExecutableHandle, GraphError> {
    for handle in objects {
      if self.object(*handle).is_none() {
        return Err(GraphError::UnknownObject);
      }
    }

    let namespace = self.claim_output(output_name)?;
    let index = self.nodes.len();

    debug!(
      executable = %namespace.qualify(output_name),
      sources = sources.len(),
      objects = objects.len(),
      "declared executable"
    );
    self.nodes.push(BuildNode::Executable(ExecutableNode {
      output_name: output_name.to_string(),
      namespace,
      sources: sources.to_vec(),
      objects: objects.to_vec(),
      packages: packages.to_vec(),
    }));

    Ok(ExecutableHandle { graph: self.id, index })
  }

  /// Schedule files to be copied into the bin directory.
  ///
  /// Files are keyed by destination file name. Registering the same source
  /// again is a no-op; a different source for an already claimed destination
  /// is a [`GraphError::StagingConflict`] and nothing from this call is kept.
  pub fn stage_files<I, P>(&mut self, files: I) -> Result<(), GraphError>
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    let mut pending: BTreeMap<String, PathBuf> = BTreeMap::new();

    for file in files {
      let source: PathBuf = file.into();
      let Some(name) = source.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
        return Err(GraphError::InvalidName(source.display().to_string()));
      };

      let existing = pending.get(&name).or_else(|| self.staged.get(&name));
      if let Some(existing) = existing
        && existing != &source
      {
        return Err(GraphError::StagingConflict {
          destination: PathBuf::from(&name),
          existing: existing.display().to_string(),
          requested: source,
        });
      }
      pending.insert(name, source);
    }

    for (name, source) in pending {
      debug!(file = %source.display(), "staged file");
      self.staged.insert(name, source);
    }
    Ok(())
  }

  pub fn object(&self, handle: ObjectHandle) -> Option<&ObjectNode> {
    if handle.graph != self.id {
      return None;
    }
    match self.nodes.get(handle.index) {
      Some(BuildNode::Object(node)) => Some(node),
      _ => None,
    }
  }

  pub fn executable(&self, handle: ExecutableHandle) -> Option<&ExecutableNode> {
    if handle.graph != self.id {
      return None;
    }
    match self.nodes.get(handle.index) {
      Some(BuildNode::Executable(node)) => Some(node),
      _ => None,
    }
  }

  /// Look up an object by its qualified name (`engine::game.obj`).
  pub fn find_object(&self, qualified: &str) -> Option<ObjectHandle> {
    self.nodes.iter().enumerate().find_map(|(index, node)| match node {
      BuildNode::Object(o) if o.namespace.qualify(&o.output_name) == qualified => Some(ObjectHandle { graph: self.id, index }),
      _ => None,
    })
  }

  /// All declared nodes, in declaration order.
  pub fn nodes(&self) -> &[BuildNode] {
    &self.nodes
  }

  /// Staged files as (destination file name, source).
  pub fn staged(&self) -> impl Iterator<Item = (&str, &PathBuf)> {
    self.staged.iter().map(|(name, source)| (name.as_str(), source))
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty() && self.staged.is_empty()
  }
}

/// Anything that owns a [`BuildGraph`] and can open namespace scopes on it.
pub trait NamespaceOwner {
  fn build_graph_mut(&mut self) -> &mut BuildGraph;
}

impl NamespaceOwner for BuildGraph {
  fn build_graph_mut(&mut self) -> &mut BuildGraph {
    self
  }
}

/// An open namespace. Declarations made through it inherit the namespace;
/// dropping it restores the enclosing one.
///
/// The scope mutably borrows its owner, so inner scopes must close before
/// outer ones and a scope can never outlive the declarations it wraps.
#[must_use = "the namespace closes as soon as the scope is dropped"]
pub struct NamespaceScope<'a, T: NamespaceOwner> {
  owner: &'a mut T,
  depth: usize,
}

impl<'a, T: NamespaceOwner> NamespaceScope<'a, T> {
  pub fn enter(owner: &'a mut T, name: &str) -> Result<Self, GraphError> {
    let depth = owner.build_graph_mut().push_namespace(name)?;
    Ok(Self { owner, depth })
  }
}

impl<T: NamespaceOwner> Deref for NamespaceScope<'_, T> {
  type Target = T;

  fn deref(&self) -> &T {
    self.owner
  }
}

impl<T: NamespaceOwner> DerefMut for NamespaceScope<'_, T> {
  fn deref_mut(&mut self) -> &mut T {
    self.owner
  }
}

impl<T: NamespaceOwner> Drop for NamespaceScope<'_, T> {
  fn drop(&mut self) {
    self.owner.build_graph_mut().pop_namespace(self.depth);
  }
}
