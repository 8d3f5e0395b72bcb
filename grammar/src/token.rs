use std::fmt;
use thiserror::Error;
use crate::TerminalId;

/// Location of a token in the source, lines and columns are 1-based.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct Position {
  pub offset: usize,
  pub line: usize,
  pub column: usize,
}

impl Position {
  pub fn new(offset: usize, line: usize, column: usize) -> Self {
    Self { offset, line, column }
  }

  /// Returns the position right after `text`, assuming `text` starts here.
  pub fn advance(&self, text: &str) -> Self {
    let mut pos = *self;
    for c in text.chars() {
      pos.offset += c.len_utf8();
      if c == '\n' {
        pos.line += 1;
        pos.column = 1;
      } else {
        pos.column += 1;
      }
    }
    pos
  }
}

impl Default for Position {
  fn default() -> Self {
    Self::new(0, 1, 1)
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

/// A terminal symbol instance produced by a lexer.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct Token {
  pub terminal: TerminalId,
  pub text: String,
  /// whitespace and comments preceding the token.
  pub leading: String,
  /// position of `text`, not of `leading`.
  pub position: Position,
}

impl Token {
  pub fn new(
    terminal: TerminalId,
    text: impl Into<String>,
    position: Position,
  ) -> Self {
    Self {
      terminal,
      text: text.into(),
      leading: String::new(),
      position,
    }
  }

  pub fn with_leading(mut self, leading: impl Into<String>) -> Self {
    self.leading = leading.into();
    self
  }

  pub fn end(&self) -> Position {
    self.position.advance(&self.text)
  }

  pub fn span(&self) -> std::ops::Range<usize> {
    self.position.offset..self.position.offset + self.text.len()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid input at {position}: {message}")]
pub struct LexError {
  pub message: String,
  pub position: Position,
}
