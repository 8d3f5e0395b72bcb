use grammar::{Grammar, GrammarBuilder, ListShape, ProductionId, Symbol};
use crate::{Action, DenseTables, Recovery};

/// `list = list x | x | (error) semi`, terminals: x, semi, <eof>
pub(crate) fn grammar() -> Grammar {
  let mut b = GrammarBuilder::new();
  let x = b.terminal("x");
  let semi = b.terminal("semi");
  let list = b.nonterminal("list");
  b.list_production(list, vec![list.into(), x.into()], ListShape::left());
  b.list_production(list, vec![x.into()], ListShape::single());
  b.recovery_production(list, vec![Symbol::Error, semi.into()]);
  b.build(list).unwrap()
}

pub(crate) fn dense() -> DenseTables {
  use Action::*;
  let p = ProductionId::new;
  DenseTables {
    action: vec![
      vec![Shift(2), Error, Error],
      vec![Shift(3), Error, Accept],
      vec![Reduce(p(1)), Error, Reduce(p(1))],
      vec![Reduce(p(0)), Error, Reduce(p(0))],
    ],
    goto: vec![
      vec![Some(1)],
      vec![None],
      vec![None],
      vec![None],
    ],
    recovery: vec![
      vec![Recovery::DiscardTerminal, Recovery::Recover(p(2)), Recovery::DiscardTerminal],
      vec![Recovery::DiscardState; 3],
      vec![Recovery::DiscardState; 3],
      vec![Recovery::DiscardState; 3],
    ],
  }
}
