use std::fmt;

macro_rules! id_type {
  ($name:ident) => {
    #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
    pub struct $name(u32);

    impl $name {
      pub fn new(id: u32) -> Self {
        Self(id)
      }

      pub fn id(&self) -> u32 {
        self.0
      }

      pub fn index(&self) -> usize {
        self.0 as usize
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }
  };
}

id_type!(TerminalId);
id_type!(NonterminalId);
id_type!(ProductionId);

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub enum Symbol {
  Terminal(TerminalId),
  Nonterminal(NonterminalId),
  /// Placeholder matched by the material discarded during error recovery.
  /// Only valid in recovery productions.
  Error,
}

impl Symbol {
  /// Column index of the symbol in its table (ACTION/RECOVERY for
  /// terminals, GOTO for nonterminals).
  pub fn index(&self) -> Option<usize> {
    match self {
      Symbol::Terminal(t) => Some(t.index()),
      Symbol::Nonterminal(nt) => Some(nt.index()),
      Symbol::Error => None,
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Symbol::Terminal(_))
  }

  pub fn is_nonterminal(&self) -> bool {
    matches!(self, Symbol::Nonterminal(_))
  }
}

impl From<TerminalId> for Symbol {
  fn from(t: TerminalId) -> Self {
    Symbol::Terminal(t)
  }
}

impl From<NonterminalId> for Symbol {
  fn from(nt: NonterminalId) -> Self {
    Symbol::Nonterminal(nt)
  }
}
