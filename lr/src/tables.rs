use tracing::debug;
use grammar::{Grammar, NonterminalId, ProductionId, TerminalId, MAX_TABLE_VALUE};
use crate::{CompactBlobs, CompactTable, TableError};

const TAG_MASK: u16 = 0b11 << 14;
const VALUE_MASK: u16 = 0x3fff;

const SHIFT_TAG: u16 = 0b10 << 14;
const REDUCE_TAG: u16 = 0b01 << 14;
const ACCEPT_TAG: u16 = 0b11 << 14;

const DISCARD_TERMINAL_TAG: u16 = 0b01 << 14;
const RECOVER_TAG: u16 = 0b10 << 14;

/// Error cells of ACTION and RECOVERY read as 0.
pub const ACTION_ERROR: i32 = 0;
/// Error cells of GOTO read as -1, since 0 is a valid state.
pub const GOTO_ERROR: i32 = -1;

/// entry in `ACTION[state][terminal]`, packed as a 2-bit tag and a 14-bit
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
  Shift(u32),
  Reduce(ProductionId),
  Accept,
  Error,
}

impl Action {
  pub fn decode(code: u16) -> Self {
    let value = (code & VALUE_MASK) as u32;
    match code & TAG_MASK {
      SHIFT_TAG => Action::Shift(value),
      REDUCE_TAG => Action::Reduce(ProductionId::new(value)),
      ACCEPT_TAG => Action::Accept,
      _ => Action::Error,
    }
  }

  /// The packed cell. Values above `MAX_TABLE_VALUE` lose their high bits;
  /// `TableAssets::encode` rejects them first.
  pub fn code(self) -> u16 {
    match self {
      Action::Shift(state) => SHIFT_TAG | (state as u16 & VALUE_MASK),
      Action::Reduce(prod) => REDUCE_TAG | (prod.id() as u16 & VALUE_MASK),
      Action::Accept => ACCEPT_TAG,
      Action::Error => 0,
    }
  }

  fn value(self) -> Option<u32> {
    match self {
      Action::Shift(state) => Some(state),
      Action::Reduce(prod) => Some(prod.id()),
      Action::Accept | Action::Error => None,
    }
  }
}

/// entry in `RECOVERY[state][terminal]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recovery {
  /// the state cannot start a recovery production, pop it.
  DiscardState,
  /// inside a recovery production, skip the lookahead.
  DiscardTerminal,
  /// the lookahead synchronizes the recovery production.
  Recover(ProductionId),
}

impl Recovery {
  /// Returns `None` for the unused tag `11`.
  pub fn decode(code: u16) -> Option<Self> {
    match code & TAG_MASK {
      0 => Some(Recovery::DiscardState),
      DISCARD_TERMINAL_TAG => Some(Recovery::DiscardTerminal),
      RECOVER_TAG => Some(Recovery::Recover(ProductionId::new((code & VALUE_MASK) as u32))),
      _ => None,
    }
  }

  pub fn code(self) -> u16 {
    match self {
      Recovery::DiscardState => 0,
      Recovery::DiscardTerminal => DISCARD_TERMINAL_TAG,
      Recovery::Recover(prod) => RECOVER_TAG | (prod.id() as u16 & VALUE_MASK),
    }
  }

  fn value(self) -> Option<u32> {
    match self {
      Recovery::Recover(prod) => Some(prod.id()),
      Recovery::DiscardState | Recovery::DiscardTerminal => None,
    }
  }
}

/// Uncompressed tables, as produced by a table generator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DenseTables {
  /// state -> terminal -> action
  pub action: Vec<Vec<Action>>,
  /// state -> nonterminal -> state
  pub goto: Vec<Vec<Option<u32>>>,
  /// state -> terminal -> recovery action
  pub recovery: Vec<Vec<Recovery>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAssets {
  pub action: CompactBlobs,
  pub goto: CompactBlobs,
  pub recovery: CompactBlobs,
}

impl TableAssets {
  /// Packs dense tables into blobs. Shift targets and production ids must
  /// fit in 14 bits, goto targets in 16.
  pub fn encode(dense: &DenseTables) -> Result<Self, TableError> {
    let action = pack("action", &dense.action, Action::value, Action::code)?;
    let recovery = pack("recovery", &dense.recovery, Recovery::value, Recovery::code)?;
    // widened so that no target can alias the -1 sentinel
    let goto = dense.goto.iter()
      .map(|row| row.iter()
        .map(|s| s.map(i64::from).unwrap_or(GOTO_ERROR as i64))
        .collect::<Vec<_>>())
      .collect::<Vec<_>>();

    Ok(Self {
      action: CompactTable::encode("action", &action, 0)?,
      goto: CompactTable::encode("goto", &goto, GOTO_ERROR as i64)?,
      recovery: CompactTable::encode("recovery", &recovery, 0)?,
    })
  }
}

fn pack<C: Copy>(
  table: &str,
  dense: &[Vec<C>],
  value: impl Fn(C) -> Option<u32>,
  code: impl Fn(C) -> u16,
) -> Result<Vec<Vec<u16>>, TableError> {
  dense.iter()
    .enumerate()
    .map(|(row, cells)| cells.iter()
      .enumerate()
      .map(|(col, &cell)| match value(cell) {
        Some(v) if v as usize > MAX_TABLE_VALUE => Err(TableError::ValueOutOfRange {
          table: table.to_owned(),
          row,
          col,
          value: v as i64,
        }),
        _ => Ok(code(cell)),
      })
      .collect())
    .collect()
}

#[derive(Debug)]
pub struct ParseTables {
  action: CompactTable,
  goto: CompactTable,
  recovery: CompactTable,
  eof: TerminalId,
}

impl ParseTables {
  /// Decodes the three tables and checks them against the grammar.
  pub fn decode(assets: &TableAssets, grammar: &Grammar) -> Result<Self, TableError> {
    let tables = Self {
      action: CompactTable::decode("action", &assets.action, ACTION_ERROR)?,
      goto: CompactTable::decode("goto", &assets.goto, GOTO_ERROR)?,
      recovery: CompactTable::decode("recovery", &assets.recovery, ACTION_ERROR)?,
      eof: grammar.eof(),
    };
    tables.validate(grammar)?;

    debug!(
      states = tables.num_states(),
      action_cells = tables.action.significant_cells(),
      goto_cells = tables.goto.significant_cells(),
      recovery_cells = tables.recovery.significant_cells(),
      "decoded parse tables"
    );

    Ok(tables)
  }

  pub fn from_dense(dense: &DenseTables, grammar: &Grammar) -> Result<Self, TableError> {
    Self::decode(&TableAssets::encode(dense)?, grammar)
  }

  pub fn num_states(&self) -> usize {
    self.action.rows()
  }

  pub fn eof(&self) -> TerminalId {
    self.eof
  }

  pub fn action_table(&self) -> &CompactTable {
    &self.action
  }

  pub fn goto_table(&self) -> &CompactTable {
    &self.goto
  }

  pub fn recovery_table(&self) -> &CompactTable {
    &self.recovery
  }

  pub fn action_code(&self, state: u32, terminal: TerminalId) -> u16 {
    self.action.get(state as usize, terminal.index()) as u16
  }

  pub fn action(&self, state: u32, terminal: TerminalId) -> Action {
    Action::decode(self.action_code(state, terminal))
  }

  /// Returns -1 when there is no transition.
  pub fn goto_state(&self, state: u32, nt: NonterminalId) -> i32 {
    self.goto.get(state as usize, nt.index())
  }

  pub fn goto(&self, state: u32, nt: NonterminalId) -> Option<u32> {
    match self.goto_state(state, nt) {
      GOTO_ERROR => None,
      s => Some(s as u32),
    }
  }

  pub fn recovery_code(&self, state: u32, terminal: TerminalId) -> u16 {
    self.recovery.get(state as usize, terminal.index()) as u16
  }

  pub fn recovery(&self, state: u32, terminal: TerminalId) -> Recovery {
    // tag 11 is rejected when the tables are decoded
    Recovery::decode(self.recovery_code(state, terminal))
      .unwrap_or(Recovery::DiscardState)
  }

  /// Terminals with a non-error action in `state`.
  pub fn expected_terminals(&self, state: u32) -> Vec<TerminalId> {
    (0..self.action.cols())
      .filter(|&t| !self.action.is_error_entry(state as usize, t))
      .map(|t| TerminalId::new(t as u32))
      .collect()
  }

  fn validate(&self, grammar: &Grammar) -> Result<(), TableError> {
    let num_states = self.num_states();
    let num_terminals = grammar.num_terminals();
    let num_prods = grammar.productions().len();
    let eof = self.eof.index();

    if num_states == 0 || num_states > MAX_TABLE_VALUE + 1 {
      return Err(TableError::inconsistent("action", format!("{} states", num_states)));
    }
    if self.action.cols() != num_terminals {
      return Err(TableError::inconsistent("action", format!(
        "{} columns for {} terminals", self.action.cols(), num_terminals)));
    }
    if self.recovery.rows() != num_states || self.recovery.cols() != num_terminals {
      return Err(TableError::inconsistent("recovery", format!(
        "shape {}x{} differs from action", self.recovery.rows(), self.recovery.cols())));
    }
    if self.goto.rows() != num_states || self.goto.cols() != grammar.num_nonterminals() {
      return Err(TableError::inconsistent("goto", format!(
        "shape {}x{}, expected {}x{}",
        self.goto.rows(), self.goto.cols(), num_states, grammar.num_nonterminals())));
    }

    for state in 0..num_states {
      for t in 0..num_terminals {
        let at = |what: &str| format!("{} at ({}, {})", what, state, t);

        match Action::decode(self.action.get(state, t) as u16) {
          Action::Shift(s) if s as usize >= num_states || t == eof => {
            return Err(TableError::inconsistent("action", at("invalid shift")));
          }
          Action::Reduce(p) if p.index() >= num_prods => {
            return Err(TableError::inconsistent("action", at("unknown production")));
          }
          Action::Accept if t != eof => {
            return Err(TableError::inconsistent("action", at("accept before end of input")));
          }
          _ => {}
        }

        match Recovery::decode(self.recovery.get(state, t) as u16) {
          None => {
            return Err(TableError::inconsistent("recovery", at("invalid tag")));
          }
          Some(Recovery::Recover(p)) => {
            let is_recovery = grammar.production(p).map(|p| p.recovery).unwrap_or(false);
            if !is_recovery || t == eof {
              return Err(TableError::inconsistent("recovery", at("invalid recovery production")));
            }
          }
          _ => {}
        }
      }

      for nt in 0..self.goto.cols() {
        let s = self.goto.get(state, nt);
        if s != GOTO_ERROR && s as usize >= num_states {
          return Err(TableError::inconsistent("goto", format!(
            "target {} at ({}, {})", s, state, nt)));
        }
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use crate::fixture::{dense, grammar};

  #[test]
  fn codes() {
    assert_eq!(Action::Shift(5).code(), 0x8005);
    assert_eq!(Action::Reduce(ProductionId::new(3)).code(), 0x4003);
    assert_eq!(Action::Accept.code(), 0xc000);
    assert_eq!(Action::Error.code(), 0);
    assert_eq!(Action::decode(0x8005), Action::Shift(5));
    assert_eq!(Action::decode(0x0005), Action::Error);
    assert_eq!(Recovery::decode(0), Some(Recovery::DiscardState));
    assert_eq!(Recovery::decode(0x4000), Some(Recovery::DiscardTerminal));
    assert_eq!(Recovery::decode(0x8002), Some(Recovery::Recover(ProductionId::new(2))));
    assert_eq!(Recovery::decode(0xc000), None);
  }

  #[test]
  fn lookups() {
    let g = grammar();
    let tables = ParseTables::from_dense(&dense(), &g).unwrap();
    let x = g.terminal("x").unwrap();
    let semi = g.terminal("semi").unwrap();
    let list = g.nonterminal("list").unwrap();

    assert_eq!(tables.num_states(), 4);
    assert_eq!(tables.action(0, x), Action::Shift(2));
    assert_eq!(tables.action(1, g.eof()), Action::Accept);
    assert_eq!(tables.action(0, semi), Action::Error);
    assert_eq!(tables.action_code(0, semi), 0);
    assert_eq!(tables.goto(0, list), Some(1));
    assert_eq!(tables.goto_state(2, list), -1);
    assert_eq!(tables.recovery(0, semi), Recovery::Recover(ProductionId::new(2)));
    assert_eq!(tables.recovery(3, x), Recovery::DiscardState);
    assert_eq!(tables.expected_terminals(1), vec![x, g.eof()]);
  }

  #[test]
  fn accept_only_at_eof() {
    let g = grammar();
    let mut dense = dense();
    dense.action[1][1] = Action::Accept;
    assert!(matches!(
      ParseTables::from_dense(&dense, &g),
      Err(TableError::Inconsistent { .. })
    ));
  }

  #[test]
  fn shift_out_of_range() {
    let g = grammar();
    let mut dense = dense();
    dense.action[0][0] = Action::Shift(9);
    assert!(ParseTables::from_dense(&dense, &g).is_err());
  }

  #[test]
  fn wide_values_are_rejected() {
    let g = grammar();
    let mut d = dense();
    d.action[0][0] = Action::Shift(0x4002);
    assert!(matches!(
      TableAssets::encode(&d),
      Err(TableError::ValueOutOfRange { table, row: 0, col: 0, value: 0x4002 }) if table == "action"
    ));

    let mut d = dense();
    d.recovery[0][1] = Recovery::Recover(ProductionId::new(0x4000));
    assert!(matches!(
      TableAssets::encode(&d),
      Err(TableError::ValueOutOfRange { table, .. }) if table == "recovery"
    ));

    let mut d = dense();
    d.goto[0][0] = Some(u32::MAX);
    assert!(matches!(
      ParseTables::from_dense(&d, &g),
      Err(TableError::ValueOutOfRange { table, value, .. }) if table == "goto" && value == u32::MAX as i64
    ));

    let mut d = dense();
    d.goto[0][0] = Some(0x1_0000);
    assert!(matches!(TableAssets::encode(&d), Err(TableError::ValueOutOfRange { .. })));
  }

  #[test]
  fn goto_out_of_range() {
    let g = grammar();
    let mut dense = dense();
    dense.goto[2][0] = Some(4);
    assert!(ParseTables::from_dense(&dense, &g).is_err());
  }

  #[test]
  fn recover_needs_recovery_production() {
    let g = grammar();
    let mut dense = dense();
    dense.recovery[0][1] = Recovery::Recover(ProductionId::new(0));
    assert!(ParseTables::from_dense(&dense, &g).is_err());
  }

  #[test]
  fn invalid_recovery_tag() {
    let g = grammar();
    let d = dense();
    let recovery = d.recovery.iter()
      .map(|row| row.iter().map(|r| r.code()).collect::<Vec<_>>())
      .collect::<Vec<_>>();
    let mut recovery = recovery;
    recovery[2][0] = 0xc000;
    let mut assets = TableAssets::encode(&d).unwrap();
    assets.recovery = CompactTable::encode("recovery", &recovery, 0).unwrap();
    assert!(matches!(
      ParseTables::decode(&assets, &g),
      Err(TableError::Inconsistent { table, .. }) if table == "recovery"
    ));
  }

  #[test]
  fn shape_must_match_grammar() {
    let g = grammar();
    let mut dense = dense();
    for row in &mut dense.action {
      row.pop();
    }
    assert!(ParseTables::from_dense(&dense, &g).is_err());
  }
}
