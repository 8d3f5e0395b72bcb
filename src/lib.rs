//! Table-driven LALR(1) front end: decodes compact parse tables, parses token
//! streams with panic-mode recovery and builds a concrete syntax tree that is
//! queried through its abstract view.

mod tree;
mod list;
mod visit;
mod edit;
mod build;
mod language;
pub mod report;

pub use tree::*;
pub use list::*;
pub use visit::*;
pub use build::*;
pub use language::*;

pub use grammar;
pub use lr;
