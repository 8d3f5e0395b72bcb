#![allow(dead_code)]

use grammar::{
  ChildRule,
  Grammar,
  GrammarBuilder,
  LexError,
  ListShape,
  Position,
  ProductionId,
  Symbol,
  Token,
};
use lr::{Action, DenseTables, ParseTables, Recovery, TableAssets};
use parsefront::Language;

/// ```text
/// list = list stmt        (0)
///      | stmt             (1)
/// stmt = id eq num semi   (2)
///      | (error) semi     (3)
/// ```
pub fn grammar() -> Grammar {
  let mut b = GrammarBuilder::new();
  let id = b.terminal("id");
  let eq = b.terminal("eq");
  let num = b.terminal("num");
  let semi = b.terminal("semi");
  let list = b.nonterminal("list");
  let stmt = b.nonterminal("stmt");

  b.list_production(list, vec![list.into(), stmt.into()], ListShape::left());
  b.list_production(list, vec![stmt.into()], ListShape::single());
  b.production_with(stmt, vec![id.into(), eq.into(), num.into(), semi.into()], vec![
    ChildRule::keep().named("name"),
    ChildRule::keep().hidden(),
    ChildRule::keep().named("value"),
    ChildRule::keep().hidden(),
  ]);
  b.recovery_production(stmt, vec![Symbol::Error, semi.into()]);

  b.build(list).unwrap()
}

/// LALR(1) tables of `grammar()`.
///
/// ```text
/// 0: . list            id -> 3
/// 1: list .            id -> 3, <eof> accept
/// 2: list = stmt .     reduce 1
/// 3: stmt = id . ...   eq -> 5
/// 4: list = list stmt. reduce 0
/// 5: stmt = id eq .    num -> 6
/// 6: ... num .         semi -> 7
/// 7: ... semi .        reduce 2
/// ```
pub fn dense() -> DenseTables {
  use Action::*;
  let p = ProductionId::new;
  let e = Error;
  // columns: id eq num semi <eof>
  DenseTables {
    action: vec![
      vec![Shift(3), e, e, e, e],
      vec![Shift(3), e, e, e, Accept],
      vec![Reduce(p(1)), e, e, e, Reduce(p(1))],
      vec![e, Shift(5), e, e, e],
      vec![Reduce(p(0)), e, e, e, Reduce(p(0))],
      vec![e, e, Shift(6), e, e],
      vec![e, e, e, Shift(7), e],
      vec![Reduce(p(2)), e, e, e, Reduce(p(2))],
    ],
    // columns: list stmt
    goto: vec![
      vec![Some(1), Some(2)],
      vec![None, Some(4)],
      vec![None, None],
      vec![None, None],
      vec![None, None],
      vec![None, None],
      vec![None, None],
      vec![None, None],
    ],
    recovery: (0..8)
      .map(|state| {
        if state <= 1 {
          let skip = Recovery::DiscardTerminal;
          vec![skip, skip, skip, Recovery::Recover(p(3)), skip]
        } else {
          vec![Recovery::DiscardState; 5]
        }
      })
      .collect(),
  }
}

pub fn assets() -> TableAssets {
  TableAssets::encode(&dense()).unwrap()
}

pub fn tables(grammar: &Grammar) -> ParseTables {
  ParseTables::decode(&assets(), grammar).unwrap()
}

pub fn language() -> Language {
  Language::new(grammar(), assets())
}

/// Splits on whitespace. Words of letters are `id`, words of digits `num`.
/// Trailing whitespace goes to an explicit end-of-stream token.
pub fn tokenize(grammar: &Grammar, input: &str) -> Vec<Result<Token, LexError>> {
  let mut tokens = vec![];
  let mut pos = Position::default();
  let mut rest = input;

  loop {
    let word_start = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
    let (leading, tail) = rest.split_at(word_start);
    let start = pos.advance(leading);

    if tail.is_empty() {
      tokens.push(Ok(Token::new(grammar.eof(), "", start).with_leading(leading)));
      return tokens;
    }

    let word_end = tail.find(char::is_whitespace).unwrap_or(tail.len());
    let (word, tail) = tail.split_at(word_end);

    let name = match word {
      "=" => Some("eq"),
      ";" => Some("semi"),
      w if w.chars().all(|c| c.is_ascii_alphabetic()) => Some("id"),
      w if w.chars().all(|c| c.is_ascii_digit()) => Some("num"),
      _ => None,
    };

    match name.and_then(|name| grammar.terminal(name)) {
      Some(terminal) => {
        tokens.push(Ok(Token::new(terminal, word, start).with_leading(leading)));
      }
      None => {
        tokens.push(Err(LexError {
          message: format!("unknown word {:?}", word),
          position: start,
        }));
        return tokens;
      }
    }

    pos = start.advance(word);
    rest = tail;
  }
}
