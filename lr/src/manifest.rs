//! Text form of a complete table set, one blob per line:
//!
//! ```text
//! # name rows cols compressed uncompressed payload
//! action.sigmap 8 1 <compressed bytes> 32 <base64 of the zlib stream>
//! ```

use itertools::Itertools;
use fnv::FnvHashMap;
use crate::codec::Blob;
use crate::{CompactBlobs, TableAssets, TableError};

const TABLES: [&str; 3] = ["action", "goto", "recovery"];

impl TableAssets {
  pub fn from_manifest(text: &str) -> Result<Self, TableError> {
    let mut blobs = FnvHashMap::<String, Blob>::default();

    for (i, line) in text.lines().enumerate() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }

      let err = |reason: String| TableError::Manifest {
        line: i + 1,
        reason,
      };

      let (name, rows, cols, compressed, uncompressed, payload) = line
        .split_whitespace()
        .collect_tuple()
        .ok_or_else(|| err("expected 6 fields".to_owned()))?;

      let number = |field: &str| field.parse::<usize>()
        .map_err(|e| err(format!("invalid number {:?}: {}", field, e)));

      let blob = Blob {
        name: name.to_owned().into(),
        rows: number(rows)?,
        cols: number(cols)?,
        compressed_len: number(compressed)?,
        uncompressed_len: number(uncompressed)?,
        payload: payload.to_owned().into(),
      };

      if blobs.insert(name.to_owned(), blob).is_some() {
        return Err(err(format!("duplicate blob {}", name)));
      }
    }

    let action = take_table(&mut blobs, "action")?;
    let goto = take_table(&mut blobs, "goto")?;
    let recovery = take_table(&mut blobs, "recovery")?;

    if let Some(name) = blobs.keys().sorted().next() {
      return Err(TableError::Manifest {
        line: 0,
        reason: format!("unknown blob {}", name),
      });
    }

    Ok(Self { action, goto, recovery })
  }

  pub fn to_manifest(&self) -> String {
    let mut buf = String::new();
    buf.push_str("# name rows cols compressed uncompressed payload\n");

    for (table, blobs) in TABLES.iter().zip(&[&self.action, &self.goto, &self.recovery]) {
      for (part, blob) in [
        ("sigmap", &blobs.sigmap),
        ("rowmap", &blobs.rowmap),
        ("columnmap", &blobs.columnmap),
        ("value", &blobs.value),
      ].iter() {
        buf.push_str(&format!(
          "{}.{} {} {} {} {} {}\n",
          table,
          part,
          blob.rows,
          blob.cols,
          blob.compressed_len,
          blob.uncompressed_len,
          blob.payload,
        ));
      }
    }

    buf
  }
}

fn take_table(
  blobs: &mut FnvHashMap<String, Blob>,
  table: &str,
) -> Result<CompactBlobs, TableError> {
  let mut take = |part: &str| {
    let name = format!("{}.{}", table, part);
    blobs.remove(&name).ok_or_else(|| TableError::Manifest {
      line: 0,
      reason: format!("missing blob {}", name),
    })
  };

  Ok(CompactBlobs {
    sigmap: take("sigmap")?,
    rowmap: take("rowmap")?,
    columnmap: take("columnmap")?,
    value: take("value")?,
  })
}
