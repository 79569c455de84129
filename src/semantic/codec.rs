//! Byte layout for stored embeddings.
//!
//! An encoded vector is the little-endian concatenation of its `f32`
//! components: exactly `4 * D` bytes, no header, no length prefix. The
//! dimension is known out of band (it is a property of the model).

use crate::semantic::similarity::Matrix;

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

/// Errors that can occur while decoding stored embeddings.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CodecError {
    #[error("Embedding blob has {0} bytes, which is not a multiple of 4")]
    Misaligned(usize),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Encode a vector as raw little-endian floats.
pub fn encode(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * FLOAT_SIZE);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a stored blob. An absent blob decodes to `None`.
pub fn decode(bytes: Option<&[u8]>) -> Result<Option<Vec<f32>>, CodecError> {
    match bytes {
        None => Ok(None),
        Some(bytes) => decode_flat(bytes).map(Some),
    }
}

/// Decode many blobs of equal length into one row-major matrix.
pub fn decode_batch<'a, I>(blobs: I) -> Result<Matrix, CodecError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut data = Vec::new();
    let mut cols = None;
    let mut rows = 0;

    for blob in blobs {
        let row = decode_flat(blob)?;
        match cols {
            None => cols = Some(row.len()),
            Some(expected) if expected != row.len() => {
                return Err(CodecError::DimensionMismatch {
                    expected,
                    got: row.len(),
                });
            }
            Some(_) => {}
        }
        data.extend(row);
        rows += 1;
    }

    Ok(Matrix::from_flat(data, rows, cols.unwrap_or(0)))
}

fn decode_flat(bytes: &[u8]) -> Result<Vec<f32>, CodecError> {
    if bytes.len() % FLOAT_SIZE != 0 {
        return Err(CodecError::Misaligned(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(FLOAT_SIZE)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
