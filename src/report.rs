//! Renders syntax errors as source diagnostics.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::{self, SimpleFile};
use codespan_reporting::term::{self, termcolor::NoColor, Config};
use lr::{SyntaxError, UnrecoverableSyntaxError};
use crate::NodeId;

fn expected_message(expected: &[String]) -> String {
  match expected.len() {
    0 => "unexpected here".to_owned(),
    1 => format!("expected {}", expected[0]),
    _ => format!("expected one of {}", expected.join(", ")),
  }
}

fn emit(
  name: &str,
  source: &str,
  diagnostics: &[Diagnostic<()>],
) -> Result<String, files::Error> {
  let file = SimpleFile::new(name, source);
  let config = Config::default();
  let mut writer = NoColor::new(Vec::new());

  for diagnostic in diagnostics {
    term::emit(&mut writer, &config, &file, diagnostic)?;
  }

  Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

pub fn render(
  name: &str,
  source: &str,
  errors: &[SyntaxError<NodeId>],
) -> Result<String, files::Error> {
  let diagnostics = errors.iter()
    .map(|error| {
      let mut labels = vec![
        Label::primary((), error.token.span())
          .with_message(expected_message(&error.expected)),
      ];
      labels.extend(error.discarded_tokens.iter().map(|token| {
        Label::secondary((), token.span()).with_message("skipped")
      }));

      Diagnostic::error()
        .with_message(format!("unexpected {}", error.found))
        .with_labels(labels)
    })
    .collect::<Vec<_>>();

  emit(name, source, &diagnostics)
}

pub fn render_unrecoverable(
  name: &str,
  source: &str,
  error: &UnrecoverableSyntaxError,
) -> Result<String, files::Error> {
  let at = error.error_position.offset;
  let diagnostic = Diagnostic::error()
    .with_message(format!("unexpected {}, cannot recover", error.found))
    .with_labels(vec![
      Label::primary((), at..at).with_message(expected_message(&error.expected)),
    ]);

  emit(name, source, &[diagnostic])
}
