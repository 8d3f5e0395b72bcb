//! Flat views over recursive list chains such as `list = list item | item`.

use crate::{NodeId, Tree, TreeError};

/// Sequence of list items in source order, valid while the tree is not
/// edited.
#[derive(Debug, Clone, Copy)]
pub struct ListView<'t, 'g> {
  tree: &'t Tree<'g>,
  node: NodeId,
  generation: u64,
}

/// A detached reference to a list, re-checked against the tree generation
/// when turned back into a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHandle {
  node: NodeId,
  generation: u64,
}

impl ListHandle {
  pub fn node(&self) -> NodeId {
    self.node
  }

  pub fn view<'t, 'g>(&self, tree: &'t Tree<'g>) -> Result<ListView<'t, 'g>, TreeError> {
    let view = ListView {
      tree,
      node: self.node,
      generation: self.generation,
    };
    view.items()?;
    Ok(view)
  }
}

impl<'g> Tree<'g> {
  /// Returns the flattened view of the list chain rooted at `id`. The items
  /// are computed on first use and cached until the next edit.
  pub fn list(&self, id: NodeId) -> Result<ListView<'_, 'g>, TreeError> {
    let view = ListView {
      tree: self,
      node: id,
      generation: self.generation,
    };
    view.items()?;
    Ok(view)
  }

  fn collect_list(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
    let lhs = self.interior(id)?.0.lhs;
    let mut items = vec![];
    let mut left_recursive = None;
    let mut link = Some(id);

    while let Some(node) = link {
      self.check(node)?;
      let (prod, children) = self.interior(node)
        .map_err(|_| TreeError::NotAList(node))?;
      let shape = match prod.list {
        Some(shape) if prod.lhs == lhs => shape,
        _ => return Err(TreeError::NotAList(node)),
      };

      if let Some(item) = shape.payload.and_then(|i| children.get(i).copied().flatten()) {
        items.push(item);
      }

      link = shape.recursive.and_then(|i| children.get(i).copied().flatten());
      if shape.recursive.is_some() {
        left_recursive.get_or_insert(shape.is_left_recursive());
      }
    }

    // the outermost link of a left-recursive chain holds the last item
    if left_recursive.unwrap_or(false) {
      items.reverse();
    }
    Ok(items)
  }
}

impl<'t, 'g> ListView<'t, 'g> {
  fn items(&self) -> Result<&'t [NodeId], TreeError> {
    if self.generation != self.tree.generation {
      return Err(TreeError::StaleStructuralQuery(self.node));
    }
    self.tree.check(self.node)?;

    let tree = self.tree;
    let items = tree.data(self.node)
      .list
      .get_or_try_init(|| tree.collect_list(self.node))?;
    Ok(items.as_slice())
  }

  pub fn node(&self) -> NodeId {
    self.node
  }

  pub fn handle(&self) -> ListHandle {
    ListHandle {
      node: self.node,
      generation: self.generation,
    }
  }

  pub fn size(&self) -> Result<usize, TreeError> {
    Ok(self.items()?.len())
  }

  pub fn is_empty(&self) -> Result<bool, TreeError> {
    Ok(self.items()?.is_empty())
  }

  pub fn get(&self, index: usize) -> Result<NodeId, TreeError> {
    self.items()?
      .get(index)
      .copied()
      .ok_or(TreeError::ChildIndexOutOfRange { node: self.node, index })
  }

  pub fn iter(&self) -> Result<impl Iterator<Item = NodeId> + 't, TreeError> {
    Ok(self.items()?.iter().copied())
  }

  pub fn to_vec(&self) -> Result<Vec<NodeId>, TreeError> {
    Ok(self.items()?.to_vec())
  }
}
