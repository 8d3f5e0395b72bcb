use bitvec::prelude::*;
use fnv::FnvHashMap;
use num_traits::PrimInt;
use crate::codec::{self, Blob, IntMatrix};
use crate::TableError;

/// The four blobs making up one sparse table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactBlobs {
  /// `rows x ceil(cols / 32)` words, one bit per cell, most significant bit
  /// first. A zero bit marks an error cell.
  pub sigmap: Blob,
  /// `1 x rows`: logical row -> physical row of `value`.
  pub rowmap: Blob,
  /// `1 x cols`: logical column -> physical column of `value`.
  pub columnmap: Blob,
  /// two 16-bit codes per word, even physical columns in the high half.
  pub value: Blob,
}

/// A sparse 2D table indexed by `(state, symbol index)` with deduplicated
/// rows and columns.
#[derive(Debug, Clone)]
pub struct CompactTable {
  name: String,
  rows: usize,
  cols: usize,
  /// bits per sigmap row.
  stride: usize,
  sigmap: BitVec<u32, Msb0>,
  rowmap: Vec<u32>,
  columnmap: Vec<u32>,
  value: IntMatrix,
  sentinel: i32,
}

fn sigmap_words(cols: usize) -> usize {
  (cols + 31) / 32
}

impl CompactTable {
  pub fn decode(
    name: &str,
    blobs: &CompactBlobs,
    sentinel: i32,
  ) -> Result<Self, TableError> {
    let sigmap = codec::decode(&blobs.sigmap)?;
    let rowmap = codec::decode(&blobs.rowmap)?;
    let columnmap = codec::decode(&blobs.columnmap)?;
    let value = codec::decode(&blobs.value)?;

    if rowmap.rows() != 1 || columnmap.rows() != 1 {
      return Err(TableError::inconsistent(name, "row and column maps must be single rows"));
    }

    let rows = rowmap.cols();
    let cols = columnmap.cols();

    if sigmap.rows() != rows || sigmap.cols() != sigmap_words(cols) {
      return Err(TableError::inconsistent(name, format!(
        "sigmap is {}x{}, expected {}x{}",
        sigmap.rows(), sigmap.cols(), rows, sigmap_words(cols))));
    }

    let physical_cols = value.cols() * 2;
    if let Some(r) = rowmap.words().iter().find(|&&r| r as usize >= value.rows()) {
      return Err(TableError::inconsistent(name, format!(
        "row map points at row {} of {}", r, value.rows())));
    }
    if let Some(c) = columnmap.words().iter().find(|&&c| c as usize >= physical_cols) {
      return Err(TableError::inconsistent(name, format!(
        "column map points at column {} of {}", c, physical_cols)));
    }

    let stride = sigmap.cols() * 32;

    Ok(Self {
      name: name.to_owned(),
      rows,
      cols,
      stride,
      sigmap: BitVec::from_vec(sigmap.into_words()),
      rowmap: rowmap.into_words(),
      columnmap: columnmap.into_words(),
      value,
      sentinel,
    })
  }

  /// Builds the compact blobs for a dense table. Cells equal to `sentinel`
  /// are error cells.
  pub fn encode<T: PrimInt>(
    name: &str,
    dense: &[Vec<T>],
    sentinel: T,
  ) -> Result<CompactBlobs, TableError> {
    let rows = dense.len();
    let cols = dense.first().map(|row| row.len()).unwrap_or(0);

    if dense.iter().any(|row| row.len() != cols) {
      return Err(TableError::inconsistent(name, "rows have different lengths"));
    }

    let words = sigmap_words(cols);
    let stride = words * 32;
    let mut sigmap = bitvec![u32, Msb0; 0; rows * stride];
    let mut masked = vec![vec![0u16; cols]; rows];

    for (r, row) in dense.iter().enumerate() {
      for (c, &v) in row.iter().enumerate() {
        if v == sentinel {
          continue;
        }
        sigmap.set(r * stride + c, true);
        masked[r][c] = v.to_u16()
          .ok_or_else(|| TableError::ValueOutOfRange {
            table: name.to_owned(),
            row: r,
            col: c,
            value: v.to_i64().unwrap_or(i64::MAX),
          })?;
      }
    }

    let (columnmap, physical_cols) = dedup((0..cols).map(|c| {
      masked.iter().map(|row| row[c]).collect::<Vec<_>>()
    }));

    let (rowmap, physical_rows) = dedup((0..rows).map(|r| {
      physical_cols.iter().map(|col| col[r]).collect::<Vec<_>>()
    }));

    let mut value = IntMatrix::new(physical_rows.len(), (physical_cols.len() + 1) / 2);
    for (r, row) in physical_rows.iter().enumerate() {
      for (c, &code) in row.iter().enumerate() {
        let word = value.get(r, c / 2);
        let word = if c % 2 == 0 {
          word | (code as u32) << 16
        } else {
          word | code as u32
        };
        value.set(r, c / 2, word);
      }
    }

    let sigmap = IntMatrix::from_words(rows, words, sigmap.into_vec())
      .ok_or_else(|| TableError::inconsistent(name, "sigmap size"))?;
    let rowmap = IntMatrix::from_words(1, rows, rowmap)
      .ok_or_else(|| TableError::inconsistent(name, "row map size"))?;
    let columnmap = IntMatrix::from_words(1, cols, columnmap)
      .ok_or_else(|| TableError::inconsistent(name, "column map size"))?;

    Ok(CompactBlobs {
      sigmap: codec::encode(format!("{}.sigmap", name), &sigmap)?,
      rowmap: codec::encode(format!("{}.rowmap", name), &rowmap)?,
      columnmap: codec::encode(format!("{}.columnmap", name), &columnmap)?,
      value: codec::encode(format!("{}.value", name), &value)?,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn sentinel(&self) -> i32 {
    self.sentinel
  }

  pub fn physical_rows(&self) -> usize {
    self.value.rows()
  }

  pub fn physical_cols(&self) -> usize {
    self.columnmap.iter().max().map(|&c| c as usize + 1).unwrap_or(0)
  }

  pub fn significant_cells(&self) -> usize {
    self.sigmap.count_ones()
  }

  /// Out-of-range cells are error cells.
  pub fn is_error_entry(&self, row: usize, col: usize) -> bool {
    row >= self.rows || col >= self.cols || !self.sigmap[row * self.stride + col]
  }

  pub fn get(&self, row: usize, col: usize) -> i32 {
    if self.is_error_entry(row, col) {
      return self.sentinel;
    }

    let physical_row = self.rowmap[row] as usize;
    let physical_col = self.columnmap[col] as usize;
    let word = self.value.get(physical_row, physical_col / 2);
    let code = if physical_col % 2 == 0 {
      word >> 16
    } else {
      word & 0xffff
    };
    code as i32
  }

  pub fn to_dense(&self) -> Vec<Vec<i32>> {
    (0..self.rows)
      .map(|r| (0..self.cols).map(|c| self.get(r, c)).collect())
      .collect()
  }
}

/// Assigns each distinct vector an index in order of first appearance.
/// Returns the index of every input vector and the distinct vectors.
fn dedup(
  vectors: impl Iterator<Item = Vec<u16>>,
) -> (Vec<u32>, Vec<Vec<u16>>) {
  let mut ids = FnvHashMap::<Vec<u16>, u32>::default();
  let mut map = vec![];
  let mut distinct = vec![];

  for v in vectors {
    let next = distinct.len() as u32;
    let id = *ids.entry(v.clone()).or_insert_with(|| {
      distinct.push(v);
      next
    });
    map.push(id);
  }

  (map, distinct)
}
