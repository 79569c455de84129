//! Cosine similarity between a query vector and stored vectors.
//!
//! The single-pair and batched forms share the same per-row arithmetic
//! (unit query dotted with the row divided by its norm), so a batched score
//! is bit-identical to the single-pair score for the same row.

use rayon::prelude::*;

use crate::semantic::embeddings::l2_norm;

/// Row-major dense matrix of `f32`, one candidate vector per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Build a matrix from flat row-major data.
    ///
    /// `data.len()` must equal `rows * cols`; extra or missing values are
    /// truncated or zero-filled so the shape always holds.
    pub fn from_flat(mut data: Vec<f32>, rows: usize, cols: usize) -> Self {
        data.resize(rows * cols, 0.0);
        Self { data, rows, cols }
    }

    /// Build a matrix from rows. Returns `None` if the rows differ in length.
    pub fn from_rows(rows: &[Vec<f32>]) -> Option<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Some(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, idx: usize) -> &[f32] {
        &self.data[idx * self.cols..(idx + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Cosine similarity between two optional vectors, in [-1, 1].
///
/// Returns 0.0 when either side is absent, when lengths differ, or when
/// either vector has zero norm.
pub fn cosine_similarity(a: Option<&[f32]>, b: Option<&[f32]>) -> f32 {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };

    if a.len() != b.len() {
        return 0.0;
    }

    let unit_a = match unit(a) {
        Some(unit_a) => unit_a,
        None => return 0.0,
    };

    let b_norm = l2_norm(b);
    if b_norm == 0.0 {
        return 0.0;
    }

    row_score(&unit_a, b, b_norm)
}

/// Cosine similarity of `query` against every row of `candidates`.
///
/// Equivalent to calling [`cosine_similarity`] once per row, but the query
/// is normalized once and rows are scored in parallel.
pub fn cosine_similarity_batch(query: &[f32], candidates: &Matrix) -> Vec<f32> {
    if candidates.is_empty() {
        return vec![];
    }

    if query.len() != candidates.cols() || candidates.cols() == 0 {
        return vec![0.0; candidates.rows()];
    }

    let unit_query = match unit(query) {
        Some(unit_query) => unit_query,
        None => return vec![0.0; candidates.rows()],
    };

    candidates
        .as_slice()
        .par_chunks(candidates.cols())
        .map(|row| {
            let norm = l2_norm(row);
            // zero rows stay zero vectors instead of dividing by zero
            let norm = if norm == 0.0 { 1.0 } else { norm };
            row_score(&unit_query, row, norm)
        })
        .collect()
}

fn unit(v: &[f32]) -> Option<Vec<f32>> {
    let norm = l2_norm(v);
    if norm == 0.0 {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

fn row_score(unit_query: &[f32], row: &[f32], row_norm: f32) -> f32 {
    let dot: f32 = unit_query
        .iter()
        .zip(row.iter())
        .map(|(q, r)| q * (r / row_norm))
        .sum();
    dot.clamp(-1.0, 1.0)
}
