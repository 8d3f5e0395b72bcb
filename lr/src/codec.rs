//! Embedded table blobs: base64 text wrapping a zlib stream of big-endian
//! 32-bit words laid out row-major.

use std::borrow::Cow;
use std::io::{Read, Write};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use crate::TableError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
  pub name: Cow<'static, str>,
  pub rows: usize,
  pub cols: usize,
  pub compressed_len: usize,
  pub uncompressed_len: usize,
  pub payload: Cow<'static, str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntMatrix {
  rows: usize,
  cols: usize,
  data: Vec<u32>,
}

impl IntMatrix {
  pub fn new(rows: usize, cols: usize) -> Self {
    Self {
      rows,
      cols,
      data: vec![0; rows * cols],
    }
  }

  pub fn from_words(rows: usize, cols: usize, data: Vec<u32>) -> Option<Self> {
    if data.len() == rows * cols {
      Some(Self { rows, cols, data })
    } else {
      None
    }
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn get(&self, row: usize, col: usize) -> u32 {
    self.data[row * self.cols + col]
  }

  pub fn set(&mut self, row: usize, col: usize, value: u32) {
    self.data[row * self.cols + col] = value;
  }

  pub fn row(&self, row: usize) -> &[u32] {
    &self.data[row * self.cols..(row + 1) * self.cols]
  }

  pub fn words(&self) -> &[u32] {
    &self.data
  }

  pub fn into_words(self) -> Vec<u32> {
    self.data
  }
}

pub fn decode(blob: &Blob) -> Result<IntMatrix, TableError> {
  let text = blob.payload.chars()
    .filter(|c| !c.is_ascii_whitespace())
    .collect::<String>();
  let compressed = STANDARD.decode(text.as_bytes())
    .map_err(|source| TableError::Base64 {
      blob: blob.name.to_string(),
      source,
    })?;

  if compressed.len() != blob.compressed_len {
    return Err(TableError::CompressedSize {
      blob: blob.name.to_string(),
      declared: blob.compressed_len,
      actual: compressed.len(),
    });
  }

  let expected = blob.rows.checked_mul(blob.cols).and_then(|words| words.checked_mul(4));
  if expected != Some(blob.uncompressed_len) {
    return Err(TableError::Shape {
      blob: blob.name.to_string(),
      rows: blob.rows,
      cols: blob.cols,
      bytes: blob.uncompressed_len,
    });
  }

  // read one byte past the declared length so an oversized stream is caught;
  // the buffer grows with the stream, not with the declared size
  let mut bytes = Vec::new();
  ZlibDecoder::new(&compressed[..])
    .take(blob.uncompressed_len as u64 + 1)
    .read_to_end(&mut bytes)
    .map_err(|source| TableError::Inflate {
      blob: blob.name.to_string(),
      source,
    })?;

  if bytes.len() != blob.uncompressed_len {
    return Err(TableError::UncompressedSize {
      blob: blob.name.to_string(),
      declared: blob.uncompressed_len,
      actual: bytes.len(),
    });
  }

  let data = bytes.chunks_exact(4)
    .map(|w| u32::from_be_bytes([w[0], w[1], w[2], w[3]]))
    .collect();

  Ok(IntMatrix {
    rows: blob.rows,
    cols: blob.cols,
    data,
  })
}

pub fn encode(
  name: impl Into<Cow<'static, str>>,
  matrix: &IntMatrix,
) -> Result<Blob, TableError> {
  let mut bytes = Vec::with_capacity(matrix.data.len() * 4);
  for word in &matrix.data {
    bytes.extend_from_slice(&word.to_be_bytes());
  }

  let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
  encoder.write_all(&bytes)?;
  let compressed = encoder.finish()?;

  Ok(Blob {
    name: name.into(),
    rows: matrix.rows,
    cols: matrix.cols,
    compressed_len: compressed.len(),
    uncompressed_len: bytes.len(),
    payload: STANDARD.encode(&compressed).into(),
  })
}
