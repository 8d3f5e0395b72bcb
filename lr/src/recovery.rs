//! Panic-mode error recovery driven by the RECOVERY table.

use std::iter;
use tracing::{debug, trace, warn};
use grammar::{LexError, TerminalId, Token};
use crate::{
  Discarded,
  Event,
  ParseError,
  Recovered,
  Recovery,
  SyntaxError,
  TreeBuilder,
  UnrecoverableSyntaxError,
};
use crate::driver::Session;

impl<'a, B, I> Session<'a, B, I>
  where
    B: TreeBuilder,
    I: Iterator<Item = Result<Token, LexError>>,
{
  /// Called when ACTION has no entry for the top state and the lookahead.
  /// Pops states and skips terminals until a recovery production matches,
  /// then reduces by it and returns to normal parsing.
  pub(crate) fn recover(&mut self) -> Result<(), ParseError> {
    let grammar = self.grammar;
    let error_state = self.top()?;
    let error_token = self.lookahead.clone();
    let expected = self.tables.expected_terminals(error_state);

    if let Some(max) = self.options.max_errors {
      if self.errors.len() >= max {
        warn!(limit = max, position = %error_token.position, "too many syntax errors");
        return Err(ParseError::TooManyErrors(max));
      }
    }

    debug!(
      state = error_state,
      found = grammar.terminal_name(error_token.terminal),
      position = %error_token.position,
      "syntax error"
    );

    let mut popped = vec![];
    let mut skipped = vec![];

    loop {
      let state = match self.states.last() {
        Some(&state) => state,
        None => return Err(self.unrecoverable(error_state, &error_token, &expected)),
      };

      match self.tables.recovery(state, self.lookahead.terminal) {
        Recovery::DiscardState => {
          if self.states.len() > 1 {
            popped.extend(self.values.pop());
          }
          self.states.pop();

          trace!(state, "discard state");
          self.record(Event::DiscardState {
            state,
            depth: self.states.len(),
          });
        }

        Recovery::DiscardTerminal => {
          if self.at_eof {
            return Err(self.unrecoverable(error_state, &error_token, &expected));
          }

          let token = self.advance()?;
          trace!(terminal = grammar.terminal_name(token.terminal), "discard terminal");
          self.record(Event::DiscardTerminal {
            terminal: token.terminal,
          });
          skipped.push(token);
        }

        Recovery::Recover(id) => {
          let prod = grammar.production(id)
            .ok_or_else(|| ParseError::Inconsistent(format!("unknown production {}", id)))?;

          let prefix = self.pop(prod.recovery_prefix_len())?;
          let sync = self.advance()?;
          let sync = self.builder.shift(sync).map_err(ParseError::Build)?;

          let children = prefix.into_iter()
            .map(Some)
            .chain(iter::once(None))
            .chain(iter::once(Some(sync)))
            .collect();

          // values on the stack precede every skipped terminal
          popped.reverse();
          let discarded_tokens = skipped.clone();
          let discarded = popped.into_iter()
            .map(Discarded::Node)
            .chain(skipped.into_iter().map(Discarded::Token))
            .collect();

          let recovered = Recovered {
            state: error_state,
            token: error_token.clone(),
            expected: expected.clone(),
            discarded,
          };
          let node = self.builder.recover(prod, children, recovered)
            .map_err(ParseError::Build)?;
          let next = self.push_goto(prod.lhs, node.clone())?;

          debug!(
            production = %grammar.production_to_string(id),
            state = next,
            discarded = discarded_tokens.len(),
            "recovered"
          );
          self.record(Event::Recover {
            production: id,
            state: next,
            depth: self.states.len(),
          });

          self.errors.push(SyntaxError {
            node,
            production: id,
            state: error_state,
            found: grammar.terminal_name(error_token.terminal).to_owned(),
            token: error_token,
            expected: self.names(&expected),
            discarded_tokens,
          });
          return Ok(());
        }
      }
    }
  }

  fn names(&self, terminals: &[TerminalId]) -> Vec<String> {
    terminals.iter()
      .map(|&t| self.grammar.terminal_name(t).to_owned())
      .collect()
  }

  fn unrecoverable(
    &self,
    state: u32,
    token: &Token,
    expected: &[TerminalId],
  ) -> ParseError {
    warn!(
      state,
      position = %token.position,
      furthest = %self.furthest,
      "unrecoverable syntax error"
    );

    UnrecoverableSyntaxError {
      position: self.furthest,
      error_position: token.position,
      found: self.grammar.terminal_name(token.terminal).to_owned(),
      expected: self.names(expected),
      state,
    }.into()
  }
}
