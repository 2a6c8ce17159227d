//! Header-less little-endian f32 matrices.
//!
//! Format: `rows * dim` IEEE 754 floats, little-endian, row-major, nothing else.
//! The row count is implied by the file size, which must be a whole multiple of
//! `dim * 4` bytes.

use crate::{IvfError, Result};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Read a raw f32 matrix with rows of `dim` floats. Returns the flat buffer.
pub fn read_f32_file(path: &Path, dim: usize) -> Result<Vec<f32>> {
    if dim == 0 {
        return Err(IvfError::InvalidArgument(
            "dimension must be positive".to_string(),
        ));
    }

    let mut file = File::open(path).map_err(|e| IvfError::io(path, e))?;
    let len = file.metadata().map_err(|e| IvfError::io(path, e))?.len();
    let row_bytes = (dim * F32_BYTES) as u64;
    if len % row_bytes != 0 {
        return Err(IvfError::Format(format!(
            "{}: {len} bytes is not a multiple of the {row_bytes}-byte row size for dimension {dim}",
            path.display()
        )));
    }

    let mut bytes = Vec::with_capacity(len as usize);
    file.read_to_end(&mut bytes)
        .map_err(|e| IvfError::io(path, e))?;
    // The file may change between stat and read.
    if bytes.len() as u64 != len {
        return Err(IvfError::Format(format!(
            "{}: expected {len} bytes, read {}",
            path.display(),
            bytes.len()
        )));
    }

    Ok(decode_f32_le(&bytes))
}

/// Read a single query vector of exactly `dim` floats.
pub fn read_query(path: &Path, dim: usize) -> Result<Vec<f32>> {
    let query = read_f32_file(path, dim)?;
    if query.len() != dim {
        return Err(IvfError::DimensionMismatch {
            expected: dim,
            actual: query.len(),
        });
    }
    Ok(query)
}

/// Write a flat f32 buffer as a raw little-endian matrix.
pub fn write_f32_file(path: &Path, data: &[f32]) -> Result<()> {
    let file = File::create(path).map_err(|e| IvfError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for value in data {
        writer
            .write_all(&value.to_le_bytes())
            .map_err(|e| IvfError::io(path, e))?;
    }
    writer.flush().map_err(|e| IvfError::io(path, e))?;
    Ok(())
}

fn decode_f32_le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(F32_BYTES)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
