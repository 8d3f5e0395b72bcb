use std::fmt;
use std::fmt::Write;
use once_cell::unsync::OnceCell;
use thiserror::Error;
use grammar::{Grammar, NonterminalId, Production, ProductionId, Token};
use lr::{Discarded, Recovered};

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct NodeId(u32);

impl NodeId {
  pub fn index(&self) -> usize {
    self.0 as usize
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// What a recovery production replaced: the offending lookahead, the
/// expected terminals and everything discarded to resynchronize.
pub type ErrorInfo = Recovered<NodeId>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
  #[error("node {0} was edited, structural queries are unavailable until revalidated")]
  StaleStructuralQuery(NodeId),
  #[error("node {0} is a token")]
  NotInterior(NodeId),
  #[error("node {0} is not a token")]
  NotAToken(NodeId),
  #[error("node {0} is not a list")]
  NotAList(NodeId),
  #[error("node {node} has no child {index}")]
  ChildIndexOutOfRange {
    node: NodeId,
    index: usize,
  },
  #[error("node {child} is not a child of {parent}")]
  NotAChild {
    parent: NodeId,
    child: NodeId,
  },
  #[error("node {0} already has a parent")]
  AlreadyAttached(NodeId),
  #[error("node {0} cannot become a descendant of itself")]
  Cycle(NodeId),
  #[error("production {production} takes {expected} children, found {found}")]
  ArityMismatch {
    production: ProductionId,
    expected: usize,
    found: usize,
  },
  #[error("unknown production {0}")]
  UnknownProduction(ProductionId),
}

#[derive(Debug)]
pub enum NodeKind {
  Token(Token),
  Interior {
    production: ProductionId,
    /// one slot per RHS symbol, `None` for omitted symbols.
    children: Vec<Option<NodeId>>,
    error: Option<Box<ErrorInfo>>,
  },
}

#[derive(Debug)]
pub(crate) struct NodeData {
  pub(crate) kind: NodeKind,
  pub(crate) parent: Option<NodeId>,
  /// set by edits, cleared by `Tree::revalidate`.
  pub(crate) stale: bool,
  /// flattened items, for list nodes.
  pub(crate) list: OnceCell<Vec<NodeId>>,
}

/// Concrete syntax tree stored in an arena. The abstract view is computed
/// from the child rules of each production.
#[derive(Debug)]
pub struct Tree<'g> {
  grammar: &'g Grammar,
  pub(crate) nodes: Vec<NodeData>,
  pub(crate) generation: u64,
}

impl<'g> Tree<'g> {
  pub fn new(grammar: &'g Grammar) -> Self {
    Self {
      grammar,
      nodes: vec![],
      generation: 0,
    }
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Incremented by every edit.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  fn push(&mut self, kind: NodeKind) -> NodeId {
    let id = NodeId(self.nodes.len() as u32);
    self.nodes.push(NodeData {
      kind,
      parent: None,
      stale: false,
      list: OnceCell::new(),
    });
    id
  }

  pub fn new_token(&mut self, token: Token) -> NodeId {
    self.push(NodeKind::Token(token))
  }

  /// Creates a node without children; fill it with `add_child`.
  pub fn new_interior(&mut self, production: ProductionId) -> Result<NodeId, TreeError> {
    if self.grammar.production(production).is_none() {
      return Err(TreeError::UnknownProduction(production));
    }
    Ok(self.push(NodeKind::Interior {
      production,
      children: vec![],
      error: None,
    }))
  }

  /// Creates a node with all of its children. The children must be detached.
  pub fn new_node(
    &mut self,
    production: ProductionId,
    children: Vec<Option<NodeId>>,
  ) -> Result<NodeId, TreeError> {
    let prod = self.grammar.production(production)
      .ok_or(TreeError::UnknownProduction(production))?;
    if children.len() != prod.len() {
      return Err(TreeError::ArityMismatch {
        production,
        expected: prod.len(),
        found: children.len(),
      });
    }
    if let Some(&child) = children.iter().flatten().find(|&&c| self.data(c).parent.is_some()) {
      return Err(TreeError::AlreadyAttached(child));
    }

    let id = self.push(NodeKind::Interior {
      production,
      children: children.clone(),
      error: None,
    });
    for child in children.into_iter().flatten() {
      self.data_mut(child).parent = Some(id);
    }
    Ok(id)
  }

  pub(crate) fn set_error(&mut self, id: NodeId, info: ErrorInfo) {
    if let NodeKind::Interior { error, .. } = &mut self.data_mut(id).kind {
      *error = Some(Box::new(info));
    }
  }

  pub(crate) fn data(&self, id: NodeId) -> &NodeData {
    &self.nodes[id.index()]
  }

  pub(crate) fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
    &mut self.nodes[id.index()]
  }

  pub fn kind(&self, id: NodeId) -> &NodeKind {
    &self.data(id).kind
  }

  pub fn token(&self, id: NodeId) -> Option<&Token> {
    match self.kind(id) {
      NodeKind::Token(token) => Some(token),
      NodeKind::Interior { .. } => None,
    }
  }

  pub fn is_token(&self, id: NodeId) -> bool {
    self.token(id).is_some()
  }

  pub fn error_info(&self, id: NodeId) -> Option<&ErrorInfo> {
    match self.kind(id) {
      NodeKind::Interior { error: Some(info), .. } => Some(&**info),
      _ => None,
    }
  }

  pub fn is_error(&self, id: NodeId) -> bool {
    self.error_info(id).is_some()
  }

  pub fn is_stale(&self, id: NodeId) -> bool {
    self.data(id).stale
  }

  /// Physical parent. Kept up to date by edits, so it is always available.
  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.data(id).parent
  }

  pub(crate) fn check(&self, id: NodeId) -> Result<(), TreeError> {
    if self.data(id).stale {
      Err(TreeError::StaleStructuralQuery(id))
    } else {
      Ok(())
    }
  }

  /// Production and children of an interior node, without the stale check.
  pub(crate) fn interior(
    &self,
    id: NodeId,
  ) -> Result<(&'g Production, &[Option<NodeId>]), TreeError> {
    match self.kind(id) {
      NodeKind::Interior { production, children, .. } => {
        let prod = self.grammar.production(*production)
          .ok_or(TreeError::UnknownProduction(*production))?;
        Ok((prod, children.as_slice()))
      }
      NodeKind::Token(_) => Err(TreeError::NotInterior(id)),
    }
  }

  pub fn production(&self, id: NodeId) -> Result<&'g Production, TreeError> {
    self.check(id)?;
    Ok(self.interior(id)?.0)
  }

  pub fn is_production(&self, id: NodeId, production: ProductionId) -> Result<bool, TreeError> {
    self.check(id)?;
    match self.kind(id) {
      NodeKind::Interior { production: p, .. } => Ok(*p == production),
      NodeKind::Token(_) => Ok(false),
    }
  }

  pub fn is_nonterminal(&self, id: NodeId, nt: NonterminalId) -> Result<bool, TreeError> {
    self.check(id)?;
    match self.kind(id) {
      NodeKind::Interior { .. } => Ok(self.interior(id)?.0.lhs == nt),
      NodeKind::Token(_) => Ok(false),
    }
  }

  pub fn children(&self, id: NodeId) -> Result<&[Option<NodeId>], TreeError> {
    self.check(id)?;
    Ok(self.interior(id)?.1)
  }

  pub fn child(&self, id: NodeId, index: usize) -> Result<Option<NodeId>, TreeError> {
    self.children(id)?
      .get(index)
      .copied()
      .ok_or(TreeError::ChildIndexOutOfRange { node: id, index })
  }

  pub fn find_child(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
    self.children(parent)?
      .iter()
      .position(|&c| c == Some(child))
      .ok_or(TreeError::NotAChild { parent, child })
  }

  /// Logical parent: the physical parent, unless that parent pulls the node
  /// up, in which case the logical parent of the parent.
  pub fn ast_parent(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
    self.check(id)?;
    let mut node = id;
    loop {
      let parent = match self.parent(node) {
        Some(parent) => parent,
        None => return Ok(None),
      };
      let index = self.find_child(parent, node)?;
      if !self.interior(parent)?.0.child_is_pulled_up(index) {
        return Ok(Some(parent));
      }
      node = parent;
    }
  }

  /// Child named `name` in the abstract view of `id`. Named children pulled
  /// up out of a child count as children of `id`; named children `id` itself
  /// pulls up belong to its logical parent.
  pub fn field(&self, id: NodeId, name: &str) -> Result<Option<NodeId>, TreeError> {
    self.check(id)?;
    let (prod, children) = self.interior(id)?;

    for (rule, child) in prod.children.iter().zip(children) {
      if !rule.pulled_up && rule.name.as_deref() == Some(name) {
        return Ok(*child);
      }
    }

    for &child in children.iter().flatten() {
      if let Some(found) = self.pulled_up_field(child, name)? {
        return Ok(Some(found));
      }
    }

    Ok(None)
  }

  fn pulled_up_field(&self, id: NodeId, name: &str) -> Result<Option<NodeId>, TreeError> {
    self.check(id)?;
    let (prod, children) = match self.interior(id) {
      Ok(interior) => interior,
      Err(TreeError::NotInterior(_)) => return Ok(None),
      Err(err) => return Err(err),
    };

    for (rule, &child) in prod.children.iter().zip(children) {
      if !rule.pulled_up {
        continue;
      }
      if rule.name.as_deref() == Some(name) && child.is_some() {
        return Ok(child);
      }
      if let Some(child) = child {
        if let Some(found) = self.pulled_up_field(child, name)? {
          return Ok(Some(found));
        }
      }
    }

    Ok(None)
  }

  pub fn first_token(&self, id: NodeId) -> Option<NodeId> {
    match self.kind(id) {
      NodeKind::Token(_) => Some(id),
      NodeKind::Interior { children, .. } => {
        children.iter().flatten().find_map(|&c| self.first_token(c))
      }
    }
  }

  pub fn last_token(&self, id: NodeId) -> Option<NodeId> {
    match self.kind(id) {
      NodeKind::Token(_) => Some(id),
      NodeKind::Interior { children, .. } => {
        children.iter().rev().flatten().find_map(|&c| self.last_token(c))
      }
    }
  }

  /// Source text of the subtree, leading trivia included. Material discarded
  /// by error recovery is rendered in place of the error placeholder.
  pub fn text(&self, id: NodeId) -> String {
    let mut buf = String::new();
    self.write_text(id, &mut buf);
    buf
  }

  fn write_text(&self, id: NodeId, buf: &mut String) {
    match self.kind(id) {
      NodeKind::Token(token) => {
        buf.push_str(&token.leading);
        buf.push_str(&token.text);
      }
      NodeKind::Interior { production, children, error } => {
        let error_slot = error.as_ref()
          .and_then(|_| self.grammar.production(*production))
          .and_then(|prod| prod.error_index());

        for (i, child) in children.iter().enumerate() {
          if Some(i) == error_slot {
            for discarded in error.iter().flat_map(|info| &info.discarded) {
              match discarded {
                Discarded::Node(node) => self.write_text(*node, buf),
                Discarded::Token(token) => {
                  buf.push_str(&token.leading);
                  buf.push_str(&token.text);
                }
              }
            }
          }
          if let Some(child) = child {
            self.write_text(*child, buf);
          }
        }
      }
    }
  }

  /// Indented rendering of the subtree, one node per line.
  pub fn dump(&self, id: NodeId) -> String {
    let mut buf = String::new();
    self.write_dump(id, 0, &mut buf);
    buf
  }

  fn write_dump(&self, id: NodeId, depth: usize, buf: &mut String) {
    let indent = "  ".repeat(depth);
    match self.kind(id) {
      NodeKind::Token(token) => {
        let _ = writeln!(buf,
          "{}{} {:?}",
          indent,
          self.grammar.terminal_name(token.terminal),
          token.text,
        );
      }
      NodeKind::Interior { production, children, error } => {
        let name = match self.grammar.production(*production) {
          Some(prod) => self.grammar.node_type_name(prod.lhs),
          None => format!("<production {}>", production),
        };
        let _ = writeln!(buf,
          "{}{}{} ({})",
          indent,
          name,
          if error.is_some() { " error" } else { "" },
          self.grammar.production_to_string(*production),
        );
        for child in children {
          match child {
            Some(child) => self.write_dump(*child, depth + 1, buf),
            None => {
              let _ = writeln!(buf, "{}  -", indent);
            }
          }
        }
      }
    }
  }
}
