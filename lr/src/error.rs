use std::fmt;
use std::io;
use itertools::Itertools;
use thiserror::Error;
use grammar::{LexError, Position};

/// Load-time failures of the embedded tables. None of these is retried: they
/// signal corrupt or mismatched table assets.
#[derive(Debug, Error)]
pub enum TableError {
  #[error("{blob}: malformed base64 payload: {source}")]
  Base64 {
    blob: String,
    #[source]
    source: base64::DecodeError,
  },
  #[error("{blob}: declared {declared} compressed bytes, found {actual}")]
  CompressedSize {
    blob: String,
    declared: usize,
    actual: usize,
  },
  #[error("{blob}: declared {declared} uncompressed bytes, found {actual}")]
  UncompressedSize {
    blob: String,
    declared: usize,
    actual: usize,
  },
  #[error("{blob}: inflate failed: {source}")]
  Inflate {
    blob: String,
    #[source]
    source: io::Error,
  },
  #[error("{blob}: {rows}x{cols} words do not match {bytes} bytes")]
  Shape {
    blob: String,
    rows: usize,
    cols: usize,
    bytes: usize,
  },
  #[error("{table}: value {value} at ({row}, {col}) does not fit in its cell")]
  ValueOutOfRange {
    table: String,
    row: usize,
    col: usize,
    value: i64,
  },
  #[error("{table}: {reason}")]
  Inconsistent {
    table: String,
    reason: String,
  },
  #[error("manifest line {line}: {reason}")]
  Manifest {
    line: usize,
    reason: String,
  },
  #[error("failed to compress table: {0}")]
  Encode(#[from] io::Error),
}

impl TableError {
  pub(crate) fn inconsistent(table: &str, reason: impl Into<String>) -> Self {
    TableError::Inconsistent {
      table: table.to_owned(),
      reason: reason.into(),
    }
  }
}

pub type BuildError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ParseError {
  #[error(transparent)]
  Lex(#[from] LexError),
  #[error(transparent)]
  Unrecoverable(#[from] UnrecoverableSyntaxError),
  #[error("too many syntax errors (limit {0})")]
  TooManyErrors(usize),
  #[error("terminal {0} is not part of the grammar")]
  UnknownTerminal(u32),
  /// GOTO has no entry for a pair reached by a reduction; the tables were
  /// generated for a different grammar.
  #[error("no goto from state {state} on {nonterminal}")]
  MissingGoto {
    state: u32,
    nonterminal: String,
  },
  #[error("inconsistent parse tables: {0}")]
  Inconsistent(String),
  #[error("node construction failed: {0}")]
  Build(#[source] BuildError),
  #[error(transparent)]
  Table(#[from] TableError),
}

/// Error recovery ran out of stack or input before a recovery production
/// matched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct UnrecoverableSyntaxError {
  /// furthest position the parser reached.
  pub position: Position,
  /// position of the token that caused the error.
  pub error_position: Position,
  pub found: String,
  pub expected: Vec<String>,
  pub state: u32,
}

impl fmt::Display for UnrecoverableSyntaxError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "unrecoverable syntax error at {}: unexpected {}", self.error_position, self.found)?;
    write!(f, "{}", fmt_expected(&self.expected))?;
    if self.position != self.error_position {
      write!(f, " (input read up to {})", self.position)?;
    }
    Ok(())
  }
}

pub(crate) fn fmt_expected(expected: &[String]) -> String {
  match expected.len() {
    0 => String::new(),
    1 => format!(", expected {}", expected[0]),
    _ => format!(", expected one of {}", expected.iter().join(", ")),
  }
}
