use thiserror::Error;

mod symbol;
mod token;
mod production;
pub mod grammar;

pub use self::grammar::*;
pub use symbol::*;
pub use token::*;
pub use production::*;

#[derive(Debug, Error)]
pub enum GrammarError {
  #[error("name conflict: {0}")]
  NameConflict(String),
  #[error("unknown symbol: {0}")]
  UnknownSymbol(String),
  #[error("no production for nonterminal {0}")]
  MissingProduction(String),
  #[error("invalid production {production}: {reason}")]
  InvalidProduction {
    production: u32,
    reason: String,
  },
  #[error("too many productions: {0}")]
  TooManyProductions(usize),
}
