mod common;

use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use lr::{Action, Event, Options, ParseError, UnrecoverableSyntaxError};
use parsefront::{parse, report, Parse};

fn events(input: &str) -> Parse<'static> {
  let grammar: &'static grammar::Grammar = Box::leak(Box::new(common::grammar()));
  let tables = common::tables(grammar);
  let options = Options {
    record_events: true,
    ..Options::default()
  };
  parse(grammar, &tables, common::tokenize(grammar, input), options).unwrap()
}

fn log(parse: &Parse) -> String {
  let grammar = parse.tree.grammar();
  parse.events.iter()
    .map(|e| e.describe(grammar))
    .collect::<Vec<_>>()
    .join("\n")
}

#[test]
fn single_statement() {
  let parse = events("a = 1 ;");
  assert!(parse.errors.is_empty());
  assert_snapshot!(log(&parse), @r###"
  shift id -> 3 [2]
  shift eq -> 5 [3]
  shift num -> 6 [4]
  shift semi -> 7 [5]
  reduce stmt = id eq num semi -> 2 [2]
  reduce list = stmt -> 1 [2]
  accept [1/1]
  "###);
}

#[test]
fn tree_shape() {
  let parse = events("a = 1 ; b = 2 ;");
  assert_snapshot!(parse.tree.dump(parse.root), @r###"
  ASTListNode (list = list stmt)
    ASTListNode (list = stmt)
      ASTStmtNode (stmt = id eq num semi)
        id "a"
        eq "="
        num "1"
        semi ";"
    ASTStmtNode (stmt = id eq num semi)
      id "b"
      eq "="
      num "2"
      semi ";"
  "###);
}

#[test]
fn deterministic() {
  let input = "a = 1 ; b c ; d = 2 ; e = 3 ;";
  let first = events(input);
  let second = events(input);
  assert_eq!(first.events, second.events);
  assert_eq!(first.tree.dump(first.root), second.tree.dump(second.root));
}

#[test]
fn stack_balance() {
  let parse = events("a = 1 ; b = 2 ; c = 3 ;");
  let grammar = parse.tree.grammar();
  let mut depth = 1;

  for event in &parse.events {
    match *event {
      Event::Shift { depth: after, .. } => {
        assert_eq!(after, depth + 1);
        depth = after;
      }
      Event::Reduce { production, depth: after, .. } => {
        let n = grammar.production(production).unwrap().len();
        assert_eq!(after, depth + 1 - n);
        depth = after;
      }
      Event::Accept { depth, values } => {
        assert_eq!((depth, values), (1, 1));
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  assert!(matches!(parse.events.last(), Some(Event::Accept { .. })));
}

#[test]
fn accept_only_at_eof() {
  let grammar = common::grammar();
  let tables = common::tables(&grammar);

  for state in 0..tables.num_states() as u32 {
    for t in 0..grammar.num_terminals() as u32 {
      let t = grammar::TerminalId::new(t);
      if tables.action(state, t) == Action::Accept {
        assert_eq!(t, grammar.eof());
      }
    }
  }
}

#[test]
fn recovery_marks_one_statement() {
  let input = "a = 1 ; b c ; d = 2 ;";
  let parse = events(input);
  let tree = &parse.tree;

  assert_snapshot!(log(&parse), @r###"
  shift id -> 3 [2]
  shift eq -> 5 [3]
  shift num -> 6 [4]
  shift semi -> 7 [5]
  reduce stmt = id eq num semi -> 2 [2]
  reduce list = stmt -> 1 [2]
  shift id -> 3 [3]
  discard state 3 [2]
  discard id
  recover stmt = (error) semi -> 4 [3]
  reduce list = list stmt -> 1 [2]
  shift id -> 3 [3]
  shift eq -> 5 [4]
  shift num -> 6 [5]
  shift semi -> 7 [6]
  reduce stmt = id eq num semi -> 4 [3]
  reduce list = list stmt -> 1 [2]
  accept [1/1]
  "###);

  let items = tree.list(parse.root).unwrap().to_vec().unwrap();
  assert_eq!(items.len(), 3);
  let marked = items.iter().filter(|&&item| tree.is_error(item)).count();
  assert_eq!(marked, 1);
  assert!(tree.is_error(items[1]));
  assert_eq!(tree.text(items[0]), "a = 1 ;");
  assert_eq!(tree.text(items[2]), " d = 2 ;");

  assert_eq!(parse.errors.len(), 1);
  let error = &parse.errors[0];
  assert_eq!(error.node, items[1]);
  assert_eq!(error.found, "id");
  assert_eq!(error.token.text, "c");
  assert_eq!(error.expected, vec!["eq"]);
  assert_eq!(
    error.discarded_tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
    vec!["c"],
  );
  assert_eq!(error.to_string(), "syntax error at 1:11: unexpected id, expected eq");

  let info = tree.error_info(items[1]).unwrap();
  assert_eq!(info.discarded.len(), 2);
  // the popped `b` comes before the skipped `c`
  assert_eq!(tree.text(items[1]), " b c ;");
  assert_eq!(tree.text(parse.root), input);
}

#[test]
fn recovery_pops_partial_statement() {
  let parse = events("a = ; b = 2 ;");
  let tree = &parse.tree;
  let items = tree.list(parse.root).unwrap().to_vec().unwrap();

  assert_eq!(items.len(), 2);
  assert!(tree.is_error(items[0]));
  assert!(!tree.is_error(items[1]));
  assert_eq!(parse.errors[0].expected, vec!["num"]);
  assert!(parse.errors[0].discarded_tokens.is_empty());
  assert_eq!(tree.text(items[0]), "a = ;");
  assert_snapshot!(tree.dump(items[0]), @r###"
  ASTStmtNode error (stmt = (error) semi)
    -
    semi ";"
  "###);
}

#[test]
fn unrecoverable_at_end_of_input() {
  let grammar = common::grammar();
  let tables = common::tables(&grammar);
  let result = parse(
    &grammar,
    &tables,
    common::tokenize(&grammar, "a = 1"),
    Options::default(),
  );

  match result {
    Err(ParseError::Unrecoverable(err)) => {
      assert_eq!(err, UnrecoverableSyntaxError {
        position: grammar::Position::new(5, 1, 6),
        error_position: grammar::Position::new(5, 1, 6),
        found: "<eof>".to_owned(),
        expected: vec!["semi".to_owned()],
        state: 6,
      });
      assert_eq!(
        err.to_string(),
        "unrecoverable syntax error at 1:6: unexpected <eof>, expected semi",
      );
    }
    Err(other) => panic!("unexpected error {}", other),
    Ok(_) => panic!("parse should fail"),
  }
}

#[test]
fn error_limit() {
  let grammar = common::grammar();
  let tables = common::tables(&grammar);
  let options = Options {
    max_errors: Some(1),
    ..Options::default()
  };
  let result = parse(
    &grammar,
    &tables,
    common::tokenize(&grammar, "a ; b ; c = 1 ;"),
    options,
  );
  assert!(matches!(result, Err(ParseError::TooManyErrors(1))));
}

#[test]
fn lexer_error() {
  let grammar = common::grammar();
  let tables = common::tables(&grammar);
  let result = parse(
    &grammar,
    &tables,
    common::tokenize(&grammar, "a = 1 ; b = ?"),
    Options::default(),
  );
  match result {
    Err(ParseError::Lex(err)) => assert_eq!(err.position, grammar::Position::new(12, 1, 13)),
    Err(other) => panic!("unexpected error {}", other),
    Ok(_) => panic!("parse should fail"),
  }
}

#[test]
fn diagnostics() {
  let input = "a = 1 ; b c ; d = 2 ;";
  let parse = events(input);
  let text = report::render("input.txt", input, &parse.errors).unwrap();

  assert!(text.contains("unexpected id"), "{}", text);
  assert!(text.contains("expected eq"), "{}", text);
  assert!(text.contains("skipped"), "{}", text);
  assert!(text.contains("input.txt:1:11"), "{}", text);
}

#[test]
fn unrecoverable_diagnostic() {
  let grammar = common::grammar();
  let tables = common::tables(&grammar);
  let input = "a = 1";
  let err = match parse(&grammar, &tables, common::tokenize(&grammar, input), Options::default()) {
    Err(ParseError::Unrecoverable(err)) => err,
    _ => panic!("parse should fail"),
  };
  let text = report::render_unrecoverable("input.txt", input, &err).unwrap();
  assert!(text.contains("unexpected <eof>, cannot recover"), "{}", text);
  assert!(text.contains("expected semi"), "{}", text);
}
