mod error;
pub mod codec;
mod compact;
mod tables;
mod manifest;
mod driver;
mod recovery;
#[cfg(test)]
mod fixture;

pub use error::*;
pub use codec::{Blob, IntMatrix};
pub use compact::*;
pub use tables::*;
pub use driver::*;
