use std::fmt;
use std::mem;
use tracing::{debug, trace};
use grammar::{
  Grammar,
  LexError,
  NonterminalId,
  Position,
  Production,
  ProductionId,
  TerminalId,
  Token,
};
use crate::{Action, BuildError, ParseError, ParseTables};
use crate::error::fmt_expected;

/// Builds semantic values while the parser shifts and reduces.
pub trait TreeBuilder {
  type Node: Clone;

  fn shift(&mut self, token: Token) -> Result<Self::Node, BuildError>;

  /// `children` holds one value per RHS symbol, in source order.
  fn reduce(
    &mut self,
    prod: &Production,
    children: Vec<Self::Node>,
  ) -> Result<Self::Node, BuildError>;

  /// Reduction by a recovery production. The slot of the error placeholder is
  /// `None`, the material it stands for is in `recovered.discarded`.
  fn recover(
    &mut self,
    prod: &Production,
    children: Vec<Option<Self::Node>>,
    recovered: Recovered<Self::Node>,
  ) -> Result<Self::Node, BuildError>;
}

#[derive(Debug, Clone, Default)]
pub struct Options {
  /// keep a log of every parser action in `Outcome::events`.
  pub record_events: bool,
  /// give up after this many recovered syntax errors.
  pub max_errors: Option<usize>,
}

/// One parser action. Depths are state stack sizes after the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
  Shift {
    terminal: TerminalId,
    state: u32,
    depth: usize,
  },
  Reduce {
    production: ProductionId,
    state: u32,
    depth: usize,
  },
  Accept {
    depth: usize,
    values: usize,
  },
  DiscardState {
    state: u32,
    depth: usize,
  },
  DiscardTerminal {
    terminal: TerminalId,
  },
  Recover {
    production: ProductionId,
    state: u32,
    depth: usize,
  },
}

impl Event {
  pub fn describe(&self, grammar: &Grammar) -> String {
    match *self {
      Event::Shift { terminal, state, depth } => {
        format!("shift {} -> {} [{}]", grammar.terminal_name(terminal), state, depth)
      }
      Event::Reduce { production, state, depth } => {
        format!("reduce {} -> {} [{}]", grammar.production_to_string(production), state, depth)
      }
      Event::Accept { depth, values } => format!("accept [{}/{}]", depth, values),
      Event::DiscardState { state, depth } => format!("discard state {} [{}]", state, depth),
      Event::DiscardTerminal { terminal } => {
        format!("discard {}", grammar.terminal_name(terminal))
      }
      Event::Recover { production, state, depth } => {
        format!("recover {} -> {} [{}]", grammar.production_to_string(production), state, depth)
      }
    }
  }
}

/// Material thrown away while looking for a recovery production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discarded<N> {
  /// value popped off the stack together with its state.
  Node(N),
  /// input terminal that was skipped.
  Token(Token),
}

#[derive(Debug, Clone)]
pub struct Recovered<N> {
  /// state in which the error was detected.
  pub state: u32,
  /// lookahead that caused the error.
  pub token: Token,
  pub expected: Vec<TerminalId>,
  /// in source order.
  pub discarded: Vec<Discarded<N>>,
}

/// A syntax error the parser recovered from.
#[derive(Debug, Clone)]
pub struct SyntaxError<N> {
  /// error-marked node built by the recovery production.
  pub node: N,
  pub production: ProductionId,
  pub state: u32,
  pub token: Token,
  pub found: String,
  pub expected: Vec<String>,
  pub discarded_tokens: Vec<Token>,
}

impl<N> fmt::Display for SyntaxError<N> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f,
      "syntax error at {}: unexpected {}{}",
      self.token.position,
      self.found,
      fmt_expected(&self.expected),
    )
  }
}

pub struct Outcome<B: TreeBuilder> {
  pub builder: B,
  pub root: B::Node,
  pub errors: Vec<SyntaxError<B::Node>>,
  pub events: Vec<Event>,
}

pub struct Parser<'a, B> {
  grammar: &'a Grammar,
  tables: &'a ParseTables,
  builder: B,
  options: Options,
}

impl<'a, B: TreeBuilder> Parser<'a, B> {
  pub fn new(
    grammar: &'a Grammar,
    tables: &'a ParseTables,
    builder: B,
  ) -> Self {
    Self {
      grammar,
      tables,
      builder,
      options: Options::default(),
    }
  }

  pub fn options(mut self, options: Options) -> Self {
    self.options = options;
    self
  }

  /// Parses a token stream. The stream ends at its first end-of-stream token
  /// or when the iterator is exhausted.
  pub fn parse<I>(self, tokens: I) -> Result<Outcome<B>, ParseError>
    where I: IntoIterator<Item = Result<Token, LexError>>
  {
    let mut session = Session::new(self, tokens.into_iter())?;
    let root = session.run()?;

    debug!(
      errors = session.errors.len(),
      furthest = %session.furthest,
      "parse finished"
    );

    Ok(Outcome {
      builder: session.builder,
      root,
      errors: session.errors,
      events: session.events,
    })
  }
}

/// State of one parse. The state stack always holds one more entry than the
/// value stack: the initial state has no value.
pub(crate) struct Session<'a, B: TreeBuilder, I> {
  pub(crate) grammar: &'a Grammar,
  pub(crate) tables: &'a ParseTables,
  pub(crate) options: Options,
  pub(crate) builder: B,
  tokens: I,
  pub(crate) states: Vec<u32>,
  pub(crate) values: Vec<B::Node>,
  pub(crate) lookahead: Token,
  pub(crate) at_eof: bool,
  pub(crate) furthest: Position,
  pub(crate) errors: Vec<SyntaxError<B::Node>>,
  pub(crate) events: Vec<Event>,
}

impl<'a, B, I> Session<'a, B, I>
  where
    B: TreeBuilder,
    I: Iterator<Item = Result<Token, LexError>>,
{
  fn new(parser: Parser<'a, B>, tokens: I) -> Result<Self, ParseError> {
    let eof = parser.grammar.eof();
    let mut session = Self {
      grammar: parser.grammar,
      tables: parser.tables,
      options: parser.options,
      builder: parser.builder,
      tokens,
      states: vec![0],
      values: vec![],
      lookahead: Token::new(eof, "", Position::default()),
      at_eof: false,
      furthest: Position::default(),
      errors: vec![],
      events: vec![],
    };
    session.advance()?;
    Ok(session)
  }

  fn run(&mut self) -> Result<B::Node, ParseError> {
    loop {
      let state = self.top()?;
      match self.tables.action(state, self.lookahead.terminal) {
        Action::Shift(next) => self.shift(next)?,
        Action::Reduce(prod) => self.reduce(prod)?,
        Action::Accept => return self.accept(),
        Action::Error => self.recover()?,
      }
    }
  }

  pub(crate) fn top(&self) -> Result<u32, ParseError> {
    self.states.last()
      .copied()
      .ok_or_else(|| ParseError::Inconsistent("empty state stack".to_owned()))
  }

  pub(crate) fn record(&mut self, event: Event) {
    if self.options.record_events {
      self.events.push(event);
    }
  }

  /// Moves to the next token and returns the previous lookahead.
  pub(crate) fn advance(&mut self) -> Result<Token, ParseError> {
    let next = if self.at_eof {
      self.lookahead.clone()
    } else {
      self.next_token()?
    };

    if next.position > self.furthest {
      self.furthest = next.position;
    }

    Ok(mem::replace(&mut self.lookahead, next))
  }

  fn next_token(&mut self) -> Result<Token, ParseError> {
    let eof = self.grammar.eof();

    match self.tokens.next().transpose()? {
      Some(token) if token.terminal.index() >= self.grammar.num_terminals() => {
        Err(ParseError::UnknownTerminal(token.terminal.id()))
      }
      Some(token) => {
        self.at_eof = token.terminal == eof;
        Ok(token)
      }
      None => {
        self.at_eof = true;
        Ok(Token::new(eof, "", self.lookahead.end()))
      }
    }
  }

  fn shift(&mut self, next: u32) -> Result<(), ParseError> {
    let token = self.advance()?;
    trace!(
      terminal = self.grammar.terminal_name(token.terminal),
      state = next,
      "shift"
    );

    let terminal = token.terminal;
    let value = self.builder.shift(token).map_err(ParseError::Build)?;
    self.values.push(value);
    self.states.push(next);

    self.record(Event::Shift {
      terminal,
      state: next,
      depth: self.states.len(),
    });
    Ok(())
  }

  fn reduce(&mut self, id: ProductionId) -> Result<(), ParseError> {
    let grammar = self.grammar;
    let prod = grammar.production(id)
      .ok_or_else(|| ParseError::Inconsistent(format!("unknown production {}", id)))?;

    let children = self.pop(prod.len())?;
    let node = self.builder.reduce(prod, children).map_err(ParseError::Build)?;
    let next = self.push_goto(prod.lhs, node)?;

    trace!(production = %grammar.production_to_string(id), state = next, "reduce");
    self.record(Event::Reduce {
      production: id,
      state: next,
      depth: self.states.len(),
    });
    Ok(())
  }

  fn accept(&mut self) -> Result<B::Node, ParseError> {
    self.states.pop();
    if self.states.len() != 1 || self.values.len() != 1 {
      return Err(ParseError::Inconsistent(format!(
        "accept with {} states and {} values",
        self.states.len(),
        self.values.len(),
      )));
    }

    trace!("accept");
    self.record(Event::Accept {
      depth: self.states.len(),
      values: self.values.len(),
    });

    self.values.pop()
      .ok_or_else(|| ParseError::Inconsistent("no value to accept".to_owned()))
  }

  /// Pops `n` values and their states, returning the values in source order.
  pub(crate) fn pop(&mut self, n: usize) -> Result<Vec<B::Node>, ParseError> {
    if n > self.values.len() {
      return Err(ParseError::Inconsistent(format!(
        "cannot pop {} values off a stack of {}", n, self.values.len())));
    }
    self.states.truncate(self.states.len() - n);
    Ok(self.values.split_off(self.values.len() - n))
  }

  pub(crate) fn push_goto(
    &mut self,
    lhs: NonterminalId,
    node: B::Node,
  ) -> Result<u32, ParseError> {
    let state = self.top()?;
    let next = self.tables.goto(state, lhs)
      .ok_or_else(|| ParseError::MissingGoto {
        state,
        nonterminal: self.grammar.nonterminal_name(lhs).to_owned(),
      })?;
    self.values.push(node);
    self.states.push(next);
    Ok(next)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use crate::fixture::{dense, grammar};
  use crate::UnrecoverableSyntaxError;

  /// Renders each node as an s-expression.
  #[derive(Debug, Default)]
  struct Sexp {
    reductions: usize,
  }

  impl TreeBuilder for Sexp {
    type Node = String;

    fn shift(&mut self, token: Token) -> Result<String, BuildError> {
      Ok(token.text)
    }

    fn reduce(&mut self, prod: &Production, children: Vec<String>) -> Result<String, BuildError> {
      self.reductions += 1;
      Ok(format!("({} {})", prod.id, children.join(" ")))
    }

    fn recover(
      &mut self,
      prod: &Production,
      children: Vec<Option<String>>,
      recovered: Recovered<String>,
    ) -> Result<String, BuildError> {
      let children = children.into_iter()
        .map(|c| c.unwrap_or_else(|| "_".to_owned()))
        .collect::<Vec<_>>();
      let discarded = recovered.discarded.into_iter()
        .map(|d| match d {
          Discarded::Node(n) => n,
          Discarded::Token(t) => format!("'{}", t.text),
        })
        .collect::<Vec<_>>();
      Ok(format!("(!{} {} [{}])", prod.id, children.join(" "), discarded.join(" ")))
    }
  }

  fn tokens(g: &Grammar, input: &str) -> Vec<Result<Token, LexError>> {
    let mut pos = Position::default();
    input.split_whitespace()
      .map(|word| {
        let token = Token::new(g.terminal(word).unwrap(), word, pos);
        pos = token.end().advance(" ");
        Ok(token)
      })
      .collect()
  }

  fn parse(input: &str, options: Options) -> Result<Outcome<Sexp>, ParseError> {
    let g = grammar();
    let tables = ParseTables::from_dense(&dense(), &g).unwrap();
    Parser::new(&g, &tables, Sexp::default())
      .options(options)
      .parse(tokens(&g, input))
  }

  #[test]
  fn left_recursive_list() {
    let outcome = parse("x x x", Options::default()).unwrap();
    assert_eq!(outcome.root, "(0 (0 (1 x) x) x)");
    assert_eq!(outcome.builder.reductions, 3);
    assert!(outcome.errors.is_empty());
    assert!(outcome.events.is_empty());
  }

  #[test]
  fn events() {
    let g = grammar();
    let outcome = parse("x x", Options { record_events: true, ..Options::default() }).unwrap();
    let log = outcome.events.iter()
      .map(|e| e.describe(&g))
      .collect::<Vec<_>>();
    assert_eq!(log, vec![
      "shift x -> 2 [2]",
      "reduce list = x -> 1 [2]",
      "shift x -> 3 [3]",
      "reduce list = list x -> 1 [2]",
      "accept [1/1]",
    ]);
  }

  #[test]
  fn deterministic() {
    let a = parse("x semi x x", Options { record_events: true, ..Options::default() }).unwrap();
    let b = parse("x semi x x", Options { record_events: true, ..Options::default() }).unwrap();
    assert_eq!(a.root, b.root);
    assert_eq!(a.events, b.events);
  }

  #[test]
  fn recovers_at_sync_terminal() {
    let outcome = parse("x semi x", Options::default()).unwrap();
    assert_eq!(outcome.root, "(0 (!2 _ semi [x]) x)");
    assert_eq!(outcome.errors.len(), 1);

    let error = &outcome.errors[0];
    assert_eq!(error.node, "(!2 _ semi [x])");
    assert_eq!(error.state, 2);
    assert_eq!(error.found, "semi");
    assert_eq!(error.expected, vec!["x", "<eof>"]);
    assert_eq!(error.to_string(), "syntax error at 1:3: unexpected semi, expected one of x, <eof>");
  }

  #[test]
  fn popped_values_stay_in_source_order() {
    let g = grammar();
    let outcome = parse(
      "semi x x semi",
      Options { record_events: true, ..Options::default() },
    );
    // the leading semi recovers at once, the trailing one discards the list
    // built so far and recovers from the initial state
    let outcome = outcome.unwrap();
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome.events.iter().any(|e| e.describe(&g).starts_with("discard state")));
    assert_eq!(outcome.root, "(!2 _ semi [(0 (!2 _ semi []) x) x])");
  }

  #[test]
  fn unrecoverable_at_eof() {
    match parse("", Options::default()) {
      Err(ParseError::Unrecoverable(UnrecoverableSyntaxError { found, expected, .. })) => {
        assert_eq!(found, "<eof>");
        assert_eq!(expected, vec!["x"]);
      }
      other => panic!("unexpected {:?}", other.map(|o| o.root)),
    }
  }

  #[test]
  fn error_limit() {
    let result = parse("semi semi x", Options { max_errors: Some(1), ..Options::default() });
    assert!(matches!(result, Err(ParseError::TooManyErrors(1))));
  }

  #[test]
  fn lexer_errors_stop_the_parse() {
    let g = grammar();
    let tables = ParseTables::from_dense(&dense(), &g).unwrap();
    let mut input = tokens(&g, "x x");
    input.push(Err(LexError {
      message: "stray".to_owned(),
      position: Position::new(4, 1, 5),
    }));
    let result = Parser::new(&g, &tables, Sexp::default()).parse(input);
    assert!(matches!(result, Err(ParseError::Lex(_))));
  }

  #[test]
  fn unknown_terminal() {
    let g = grammar();
    let tables = ParseTables::from_dense(&dense(), &g).unwrap();
    let input = vec![Ok(Token::new(TerminalId::new(7), "?", Position::default()))];
    let result = Parser::new(&g, &tables, Sexp::default()).parse(input);
    assert!(matches!(result, Err(ParseError::UnknownTerminal(7))));
  }
}
