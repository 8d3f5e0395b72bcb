//! Tree edits. Every edit marks the touched nodes, their ancestors and their
//! descendants as stale and bumps the tree generation; structural queries on
//! stale nodes fail until `revalidate` is called.

use tracing::trace;
use grammar::Token;
use crate::{NodeId, NodeKind, Tree, TreeError};

impl<'g> Tree<'g> {
  /// Appends a child to a node created with `new_interior`. Like every other
  /// edit this invalidates structural queries on the node, so a tree built
  /// up by hand needs a `revalidate` before it is queried.
  pub fn add_child(&mut self, parent: NodeId, child: Option<NodeId>) -> Result<(), TreeError> {
    let (prod, children) = self.interior(parent)?;
    if children.len() >= prod.len() {
      return Err(TreeError::ArityMismatch {
        production: prod.id,
        expected: prod.len(),
        found: children.len() + 1,
      });
    }
    if let Some(child) = child {
      self.check_attachable(parent, child)?;
    }

    if let NodeKind::Interior { children, .. } = &mut self.data_mut(parent).kind {
      children.push(child);
    }
    if let Some(child) = child {
      self.data_mut(child).parent = Some(parent);
    }

    self.touch(parent);
    Ok(())
  }

  /// Puts `child` into slot `index` of `parent` and returns the detached
  /// previous occupant.
  pub fn set_child(
    &mut self,
    parent: NodeId,
    index: usize,
    child: Option<NodeId>,
  ) -> Result<Option<NodeId>, TreeError> {
    let old = self.interior(parent)?
      .1
      .get(index)
      .copied()
      .ok_or(TreeError::ChildIndexOutOfRange { node: parent, index })?;
    if old == child {
      return Ok(old);
    }
    if let Some(child) = child {
      self.check_attachable(parent, child)?;
    }

    if let Some(old) = old {
      self.touch(old);
      self.data_mut(old).parent = None;
    }
    if let NodeKind::Interior { children, .. } = &mut self.data_mut(parent).kind {
      children[index] = child;
    }
    if let Some(child) = child {
      self.data_mut(child).parent = Some(parent);
    }

    self.touch(parent);
    Ok(old)
  }

  pub fn replace_child(
    &mut self,
    parent: NodeId,
    old: NodeId,
    new: NodeId,
  ) -> Result<(), TreeError> {
    let index = self.slot_of(parent, old)?;
    self.set_child(parent, index, Some(new))?;
    Ok(())
  }

  /// Empties slot `index` of `parent`. The arity of the node is unchanged.
  pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Result<Option<NodeId>, TreeError> {
    self.set_child(parent, index, None)
  }

  /// Removes `id` from its parent, if it has one.
  pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
    if let Some(parent) = self.parent(id) {
      let index = self.slot_of(parent, id)?;
      self.set_child(parent, index, None)?;
    }
    Ok(())
  }

  pub fn set_token(&mut self, id: NodeId, token: Token) -> Result<Token, TreeError> {
    let old = match &mut self.data_mut(id).kind {
      NodeKind::Token(old) => std::mem::replace(old, token),
      NodeKind::Interior { .. } => return Err(TreeError::NotAToken(id)),
    };
    self.touch(id);
    Ok(old)
  }

  /// Ends an edit session: clears stale marks and cached list items. Views
  /// and handles taken before the edits stay stale.
  pub fn revalidate(&mut self) {
    for node in &mut self.nodes {
      node.stale = false;
      node.list.take();
    }
  }

  /// Slot lookup that ignores stale marks, for use inside edits.
  fn slot_of(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
    self.interior(parent)?
      .1
      .iter()
      .position(|&c| c == Some(child))
      .ok_or(TreeError::NotAChild { parent, child })
  }

  fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
    if self.parent(child).is_some() {
      return Err(TreeError::AlreadyAttached(child));
    }
    let mut node = Some(parent);
    while let Some(n) = node {
      if n == child {
        return Err(TreeError::Cycle(child));
      }
      node = self.parent(n);
    }
    Ok(())
  }

  fn touch(&mut self, id: NodeId) {
    self.generation += 1;
    trace!(node = %id, generation = self.generation, "edit");

    let mut ancestor = self.parent(id);
    while let Some(node) = ancestor {
      self.mark(node);
      ancestor = self.parent(node);
    }

    let mut pending = vec![id];
    while let Some(node) = pending.pop() {
      self.mark(node);
      if let NodeKind::Interior { children, .. } = &self.data(node).kind {
        pending.extend(children.iter().flatten());
      }
    }
  }

  fn mark(&mut self, id: NodeId) {
    let data = self.data_mut(id);
    data.stale = true;
    data.list.take();
  }
}
