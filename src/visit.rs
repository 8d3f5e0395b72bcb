use fnv::FnvHashMap;
use grammar::{NonterminalId, Production, ProductionId, Token};
use crate::{NodeId, NodeKind, Tree, TreeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
  Children,
  Skip,
}

pub trait Visitor {
  fn enter(&mut self, _tree: &Tree, _node: NodeId, _production: &Production) -> Walk {
    Walk::Children
  }

  fn leave(&mut self, _tree: &Tree, _node: NodeId, _production: &Production) {}

  fn token(&mut self, _tree: &Tree, _node: NodeId, _token: &Token) {}
}

impl<'g> Tree<'g> {
  /// Walks the subtree at `id` in source order, descending only into the
  /// children the production marks as visited.
  pub fn visit_this_node_using<V: Visitor + ?Sized>(
    &self,
    id: NodeId,
    visitor: &mut V,
  ) -> Result<(), TreeError> {
    self.check(id)?;
    match self.kind(id) {
      NodeKind::Token(token) => {
        visitor.token(self, id, token);
      }
      NodeKind::Interior { children, .. } => {
        let prod = self.interior(id)?.0;
        if visitor.enter(self, id, prod) == Walk::Children {
          for (i, child) in children.iter().enumerate() {
            if let Some(child) = child {
              if prod.should_visit_child(i) {
                self.visit_this_node_using(*child, visitor)?;
              }
            }
          }
        }
        visitor.leave(self, id, prod);
      }
    }
    Ok(())
  }
}

type NodeHandler<'h> = Box<dyn FnMut(&Tree, NodeId) -> Walk + 'h>;
type TokenHandler<'h> = Box<dyn FnMut(&Tree, NodeId, &Token) + 'h>;

/// A visitor dispatching on the production of each node, falling back to
/// its nonterminal.
#[derive(Default)]
pub struct Handlers<'h> {
  productions: FnvHashMap<ProductionId, NodeHandler<'h>>,
  nonterminals: FnvHashMap<NonterminalId, NodeHandler<'h>>,
  tokens: Option<TokenHandler<'h>>,
}

impl<'h> Handlers<'h> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn on_production(
    mut self,
    production: ProductionId,
    handler: impl FnMut(&Tree, NodeId) -> Walk + 'h,
  ) -> Self {
    self.productions.insert(production, Box::new(handler));
    self
  }

  pub fn on_nonterminal(
    mut self,
    nt: NonterminalId,
    handler: impl FnMut(&Tree, NodeId) -> Walk + 'h,
  ) -> Self {
    self.nonterminals.insert(nt, Box::new(handler));
    self
  }

  pub fn on_token(
    mut self,
    handler: impl FnMut(&Tree, NodeId, &Token) + 'h,
  ) -> Self {
    self.tokens = Some(Box::new(handler));
    self
  }
}

impl<'h> Visitor for Handlers<'h> {
  fn enter(&mut self, tree: &Tree, node: NodeId, production: &Production) -> Walk {
    if let Some(handler) = self.productions.get_mut(&production.id) {
      handler(tree, node)
    } else if let Some(handler) = self.nonterminals.get_mut(&production.lhs) {
      handler(tree, node)
    } else {
      Walk::Children
    }
  }

  fn token(&mut self, tree: &Tree, node: NodeId, token: &Token) {
    if let Some(handler) = &mut self.tokens {
      handler(tree, node, token);
    }
  }
}
