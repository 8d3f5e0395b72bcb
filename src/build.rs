use grammar::{Grammar, Production, Token};
use lr::{BuildError, Recovered, TreeBuilder};
use crate::{NodeId, Tree};

/// Builds the concrete syntax tree during a parse. Omitted symbols leave an
/// empty slot; everything else becomes a child of the reduced node.
#[derive(Debug)]
pub struct CstBuilder<'g> {
  tree: Tree<'g>,
}

impl<'g> CstBuilder<'g> {
  pub fn new(grammar: &'g Grammar) -> Self {
    Self {
      tree: Tree::new(grammar),
    }
  }

  pub fn into_tree(self) -> Tree<'g> {
    self.tree
  }

  fn build(
    &mut self,
    prod: &Production,
    children: Vec<Option<NodeId>>,
  ) -> Result<NodeId, BuildError> {
    let children = children.into_iter()
      .enumerate()
      .map(|(i, child)| child.filter(|_| !prod.child_is_omitted(i)))
      .collect();
    Ok(self.tree.new_node(prod.id, children)?)
  }
}

impl<'g> TreeBuilder for CstBuilder<'g> {
  type Node = NodeId;

  fn shift(&mut self, token: Token) -> Result<NodeId, BuildError> {
    Ok(self.tree.new_token(token))
  }

  fn reduce(
    &mut self,
    prod: &Production,
    children: Vec<NodeId>,
  ) -> Result<NodeId, BuildError> {
    self.build(prod, children.into_iter().map(Some).collect())
  }

  fn recover(
    &mut self,
    prod: &Production,
    children: Vec<Option<NodeId>>,
    recovered: Recovered<NodeId>,
  ) -> Result<NodeId, BuildError> {
    let node = self.build(prod, children)?;
    self.tree.set_error(node, recovered);
    Ok(node)
  }
}
