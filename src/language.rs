use once_cell::sync::OnceCell;
use grammar::{Grammar, LexError, Token};
use lr::{Event, Options, ParseError, ParseTables, Parser, SyntaxError, TableAssets, TableError};
use crate::{CstBuilder, NodeId, Tree};

/// Result of a successful parse. `errors` lists the syntax errors the parser
/// recovered from; each one also marks a node of `tree`.
#[derive(Debug)]
pub struct Parse<'g> {
  pub tree: Tree<'g>,
  pub root: NodeId,
  pub errors: Vec<SyntaxError<NodeId>>,
  pub events: Vec<Event>,
}

pub fn parse<'g, I>(
  grammar: &'g Grammar,
  tables: &ParseTables,
  tokens: I,
  options: Options,
) -> Result<Parse<'g>, ParseError>
  where I: IntoIterator<Item = Result<Token, LexError>>
{
  let outcome = Parser::new(grammar, tables, CstBuilder::new(grammar))
    .options(options)
    .parse(tokens)?;

  Ok(Parse {
    tree: outcome.builder.into_tree(),
    root: outcome.root,
    errors: outcome.errors,
    events: outcome.events,
  })
}

/// A grammar together with its encoded tables. The tables are decoded on
/// first use; a failed decode is reported again on the next use.
#[derive(Debug)]
pub struct Language {
  grammar: Grammar,
  assets: TableAssets,
  tables: OnceCell<ParseTables>,
}

impl Language {
  pub fn new(grammar: Grammar, assets: TableAssets) -> Self {
    Self {
      grammar,
      assets,
      tables: OnceCell::new(),
    }
  }

  pub fn from_manifest(grammar: Grammar, manifest: &str) -> Result<Self, TableError> {
    Ok(Self::new(grammar, TableAssets::from_manifest(manifest)?))
  }

  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  pub fn assets(&self) -> &TableAssets {
    &self.assets
  }

  pub fn tables(&self) -> Result<&ParseTables, TableError> {
    self.tables.get_or_try_init(|| ParseTables::decode(&self.assets, &self.grammar))
  }

  pub fn parse<I>(&self, tokens: I) -> Result<Parse<'_>, ParseError>
    where I: IntoIterator<Item = Result<Token, LexError>>
  {
    self.parse_with(tokens, Options::default())
  }

  pub fn parse_with<I>(&self, tokens: I, options: Options) -> Result<Parse<'_>, ParseError>
    where I: IntoIterator<Item = Result<Token, LexError>>
  {
    parse(&self.grammar, self.tables()?, tokens, options)
  }
}
