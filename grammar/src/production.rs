use crate::{NonterminalId, ProductionId, Symbol};

/// How the symbol at one RHS position becomes a child of the node built for
/// the production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRule {
  /// the symbol is dropped, its child slot stays `None`.
  pub omitted: bool,
  /// the child logically belongs to the parent of the node.
  pub pulled_up: bool,
  /// visitors descend into the child.
  pub visited: bool,
  pub name: Option<String>,
}

impl ChildRule {
  pub fn keep() -> Self {
    Self {
      omitted: false,
      pulled_up: false,
      visited: true,
      name: None,
    }
  }

  pub fn omit() -> Self {
    Self {
      omitted: true,
      pulled_up: false,
      visited: false,
      name: None,
    }
  }

  pub fn pull_up() -> Self {
    Self {
      pulled_up: true,
      ..Self::keep()
    }
  }

  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn hidden(mut self) -> Self {
    self.visited = false;
    self
  }
}

impl Default for ChildRule {
  fn default() -> Self {
    Self::keep()
  }
}

/// Marks a production as one link of a recursive list chain, e.g.
/// `List = List Item` (recursive: 0, payload: 1) or `List = Item`
/// (recursive: none, payload: 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListShape {
  pub recursive: Option<usize>,
  pub payload: Option<usize>,
}

impl ListShape {
  /// `List = List Item`
  pub fn left() -> Self {
    Self { recursive: Some(0), payload: Some(1) }
  }

  /// `List = Item List`
  pub fn right() -> Self {
    Self { recursive: Some(1), payload: Some(0) }
  }

  /// `List = Item`
  pub fn single() -> Self {
    Self { recursive: None, payload: Some(0) }
  }

  /// `List = ()`
  pub fn empty() -> Self {
    Self { recursive: None, payload: None }
  }

  /// Whether the deepest link holds the first item in source order.
  pub fn is_left_recursive(&self) -> bool {
    match (self.recursive, self.payload) {
      (Some(r), Some(p)) => r < p,
      _ => true,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Production {
  pub id: ProductionId,
  pub lhs: NonterminalId,
  pub rhs: Vec<Symbol>,
  /// one rule per RHS symbol.
  pub children: Vec<ChildRule>,
  pub list: Option<ListShape>,
  /// error-recovery production of the form `prefix... (error) sync`.
  pub recovery: bool,
}

impl Production {
  pub fn len(&self) -> usize {
    self.rhs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rhs.is_empty()
  }

  pub fn should_visit_child(&self, index: usize) -> bool {
    self.children.get(index)
      .map(|rule| rule.visited && !rule.omitted)
      .unwrap_or(false)
  }

  pub fn child_is_pulled_up(&self, index: usize) -> bool {
    self.children.get(index)
      .map(|rule| rule.pulled_up)
      .unwrap_or(false)
  }

  pub fn child_is_omitted(&self, index: usize) -> bool {
    self.children.get(index)
      .map(|rule| rule.omitted)
      .unwrap_or(false)
  }

  pub fn field_index(&self, name: &str) -> Option<usize> {
    self.children.iter()
      .position(|rule| rule.name.as_deref() == Some(name))
  }

  /// Position of the error placeholder, for recovery productions.
  pub fn error_index(&self) -> Option<usize> {
    self.rhs.iter().position(|sym| *sym == Symbol::Error)
  }

  /// Number of symbols a recovery reduction takes off the stack: everything
  /// in front of the error placeholder.
  pub fn recovery_prefix_len(&self) -> usize {
    self.error_index().unwrap_or(self.rhs.len())
  }
}
