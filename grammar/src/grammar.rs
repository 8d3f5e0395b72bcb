use heck::ToUpperCamelCase;
use indexmap::IndexSet;
use crate::{
  ChildRule,
  GrammarError,
  ListShape,
  NonterminalId,
  Production,
  ProductionId,
  Symbol,
  TerminalId,
};

/// Codes in the parse tables carry a 14-bit value.
pub const MAX_TABLE_VALUE: usize = 0x3fff;

pub const EOF_NAME: &str = "<eof>";

#[derive(Debug)]
pub struct Grammar {
  terminals: IndexSet<String>,
  nonterminals: IndexSet<String>,
  prods: Vec<Production>,
  eof: TerminalId,
  start: NonterminalId,
}

impl Grammar {
  pub fn eof(&self) -> TerminalId {
    self.eof
  }

  pub fn start(&self) -> NonterminalId {
    self.start
  }

  /// Includes the end-of-stream terminal.
  pub fn num_terminals(&self) -> usize {
    self.terminals.len()
  }

  pub fn num_nonterminals(&self) -> usize {
    self.nonterminals.len()
  }

  pub fn terminal(&self, name: &str) -> Option<TerminalId> {
    self.terminals.get_index_of(name).map(|i| TerminalId::new(i as u32))
  }

  pub fn nonterminal(&self, name: &str) -> Option<NonterminalId> {
    self.nonterminals.get_index_of(name).map(|i| NonterminalId::new(i as u32))
  }

  pub fn terminal_name(&self, t: TerminalId) -> &str {
    self.terminals.get_index(t.index()).map(|s| s.as_str()).unwrap_or("?")
  }

  pub fn nonterminal_name(&self, nt: NonterminalId) -> &str {
    self.nonterminals.get_index(nt.index()).map(|s| s.as_str()).unwrap_or("?")
  }

  pub fn symbol_name(&self, sym: Symbol) -> &str {
    match sym {
      Symbol::Terminal(t) => self.terminal_name(t),
      Symbol::Nonterminal(nt) => self.nonterminal_name(nt),
      Symbol::Error => "(error)",
    }
  }

  pub fn production(&self, id: ProductionId) -> Option<&Production> {
    self.prods.get(id.index())
  }

  pub fn productions(&self) -> &[Production] {
    &self.prods
  }

  /// Name of the node type built for a nonterminal, e.g. `ASTStmtListNode`
  /// for `stmt-list`.
  pub fn node_type_name(&self, nt: NonterminalId) -> String {
    format!("AST{}Node", self.nonterminal_name(nt).to_upper_camel_case())
  }

  pub fn production_to_string(&self, id: ProductionId) -> String {
    match self.production(id) {
      Some(prod) => {
        let mut s = format!("{} =", self.nonterminal_name(prod.lhs));
        if prod.rhs.is_empty() {
          s.push_str(" ()");
        }
        for &sym in &prod.rhs {
          s.push(' ');
          s.push_str(self.symbol_name(sym));
        }
        s
      }
      None => format!("<production {}>", id),
    }
  }
}

#[derive(Debug, Default)]
pub struct GrammarBuilder {
  terminals: IndexSet<String>,
  nonterminals: IndexSet<String>,
  prods: Vec<Production>,
}

impl GrammarBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn terminal(&mut self, name: impl Into<String>) -> TerminalId {
    let (i, _) = self.terminals.insert_full(name.into());
    TerminalId::new(i as u32)
  }

  pub fn nonterminal(&mut self, name: impl Into<String>) -> NonterminalId {
    let (i, _) = self.nonterminals.insert_full(name.into());
    NonterminalId::new(i as u32)
  }

  /// Adds a production whose symbols all become visited children.
  pub fn production(
    &mut self,
    lhs: NonterminalId,
    rhs: Vec<Symbol>,
  ) -> ProductionId {
    let children = vec![ChildRule::keep(); rhs.len()];
    self.push(lhs, rhs, children, None, false)
  }

  pub fn production_with(
    &mut self,
    lhs: NonterminalId,
    rhs: Vec<Symbol>,
    children: Vec<ChildRule>,
  ) -> ProductionId {
    self.push(lhs, rhs, children, None, false)
  }

  pub fn list_production(
    &mut self,
    lhs: NonterminalId,
    rhs: Vec<Symbol>,
    shape: ListShape,
  ) -> ProductionId {
    let children = vec![ChildRule::keep(); rhs.len()];
    self.push(lhs, rhs, children, Some(shape), false)
  }

  /// `rhs` must contain `Symbol::Error` followed by exactly one terminal.
  pub fn recovery_production(
    &mut self,
    lhs: NonterminalId,
    rhs: Vec<Symbol>,
  ) -> ProductionId {
    let children = rhs.iter()
      .map(|sym| if *sym == Symbol::Error {
        ChildRule::omit()
      } else {
        ChildRule::keep()
      })
      .collect();
    self.push(lhs, rhs, children, None, true)
  }

  pub fn set_child_rule(&mut self, prod: ProductionId, index: usize, rule: ChildRule) {
    if let Some(rules) = self.prods.get_mut(prod.index()) {
      if let Some(slot) = rules.children.get_mut(index) {
        *slot = rule;
      }
    }
  }

  fn push(
    &mut self,
    lhs: NonterminalId,
    rhs: Vec<Symbol>,
    children: Vec<ChildRule>,
    list: Option<ListShape>,
    recovery: bool,
  ) -> ProductionId {
    let id = ProductionId::new(self.prods.len() as u32);
    self.prods.push(Production {
      id,
      lhs,
      rhs,
      children,
      list,
      recovery,
    });
    id
  }

  /// Appends the end-of-stream terminal and checks the productions.
  pub fn build(mut self, start: NonterminalId) -> Result<Grammar, GrammarError> {
    if let Some(name) = self.terminals.iter()
      .find(|name| self.nonterminals.contains(name.as_str()))
    {
      return Err(GrammarError::NameConflict(name.clone()));
    }

    if self.terminals.contains(EOF_NAME) {
      return Err(GrammarError::NameConflict(EOF_NAME.to_owned()));
    }
    let (eof, _) = self.terminals.insert_full(EOF_NAME.to_owned());
    let eof = TerminalId::new(eof as u32);

    if start.index() >= self.nonterminals.len() {
      return Err(GrammarError::UnknownSymbol(format!("nonterminal {}", start)));
    }

    if self.prods.len() > MAX_TABLE_VALUE + 1 {
      return Err(GrammarError::TooManyProductions(self.prods.len()));
    }

    for prod in &self.prods {
      self.check_production(prod, eof)?;
    }

    for (i, name) in self.nonterminals.iter().enumerate() {
      if !self.prods.iter().any(|prod| prod.lhs.index() == i) {
        return Err(GrammarError::MissingProduction(name.clone()));
      }
    }

    Ok(Grammar {
      terminals: self.terminals,
      nonterminals: self.nonterminals,
      prods: self.prods,
      eof,
      start,
    })
  }

  fn check_production(
    &self,
    prod: &Production,
    eof: TerminalId,
  ) -> Result<(), GrammarError> {
    let invalid = |reason: &str| GrammarError::InvalidProduction {
      production: prod.id.id(),
      reason: reason.to_owned(),
    };

    if prod.lhs.index() >= self.nonterminals.len() {
      return Err(GrammarError::UnknownSymbol(format!("nonterminal {}", prod.lhs)));
    }

    for sym in &prod.rhs {
      match sym {
        Symbol::Terminal(t) if t.index() >= self.terminals.len() || *t == eof => {
          return Err(GrammarError::UnknownSymbol(format!("terminal {}", t)));
        }
        Symbol::Nonterminal(nt) if nt.index() >= self.nonterminals.len() => {
          return Err(GrammarError::UnknownSymbol(format!("nonterminal {}", nt)));
        }
        _ => {}
      }
    }

    if prod.children.len() != prod.rhs.len() {
      return Err(invalid("one child rule is required per symbol"));
    }

    let num_errors = prod.rhs.iter().filter(|sym| **sym == Symbol::Error).count();
    if prod.recovery {
      let error_ix = prod.error_index()
        .ok_or_else(|| invalid("recovery production without (error)"))?;
      if num_errors != 1 || error_ix + 2 != prod.rhs.len() ||
        !prod.rhs[error_ix + 1].is_terminal()
      {
        return Err(invalid("(error) must be followed by exactly one terminal"));
      }
    } else if num_errors != 0 {
      return Err(invalid("(error) outside of a recovery production"));
    }

    if let Some(shape) = prod.list {
      if let Some(r) = shape.recursive {
        if prod.rhs.get(r) != Some(&Symbol::Nonterminal(prod.lhs)) {
          return Err(invalid("recursive list child must be the list itself"));
        }
      }
      if let Some(p) = shape.payload {
        if p >= prod.rhs.len() || Some(p) == shape.recursive {
          return Err(invalid("invalid list payload"));
        }
      }
    }

    Ok(())
  }
}
