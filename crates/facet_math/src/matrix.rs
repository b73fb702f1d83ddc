//! Dynamically sized row-major matrix.
//!
//! `glam::Mat4` covers every fixed 4x4 transform the renderer needs. This type
//! exists for the general case, where multiplying matrices whose shapes do not
//! line up has to be reported to the caller instead of producing garbage.

use std::ops::{Index, IndexMut};

use glam::Mat4;
use thiserror::Error;

/// Errors from matrix arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("cannot multiply a matrix with {left_cols} columns by one with {right_rows} rows")]
    DimensionMismatch { left_cols: usize, right_rows: usize },

    #[error("matrix row {row} has {found} entries, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("expected a 4x4 matrix, got {rows}x{cols}")]
    NotMat4 { rows: usize, cols: usize },
}

/// Result type for matrix operations.
pub type MathResult<T> = Result<T, MathError>;

/// A `rows x cols` matrix of f32, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create an `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Create a matrix from row slices. All rows must share a length.
    pub fn from_rows(rows: &[&[f32]]) -> MathResult<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut m = Self::zeros(rows.len(), cols);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(MathError::RaggedRows {
                    row: r,
                    expected: cols,
                    found: row.len(),
                });
            }
            m.data[r * cols..(r + 1) * cols].copy_from_slice(row);
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Multiply `self * rhs`.
    ///
    /// Fails with [`MathError::DimensionMismatch`] unless
    /// `self.cols() == rhs.rows()`.
    pub fn checked_mul(&self, rhs: &Matrix) -> MathResult<Matrix> {
        if self.cols != rhs.rows {
            return Err(MathError::DimensionMismatch {
                left_cols: self.cols,
                right_rows: rhs.rows,
            });
        }

        let mut out = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for j in 0..rhs.cols {
                out[(i, j)] = (0..self.cols).map(|k| self[(i, k)] * rhs[(k, j)]).sum();
            }
        }
        Ok(out)
    }

    /// Convert a 4x4 matrix into a glam `Mat4`.
    pub fn to_mat4(&self) -> MathResult<Mat4> {
        if self.rows != 4 || self.cols != 4 {
            return Err(MathError::NotMat4 {
                rows: self.rows,
                cols: self.cols,
            });
        }
        // glam is column-major, so the transpose of our row-major storage.
        let mut cols = [0.0f32; 16];
        cols.copy_from_slice(&self.data);
        Ok(Mat4::from_cols_array(&cols).transpose())
    }
}

impl From<Mat4> for Matrix {
    fn from(m: Mat4) -> Self {
        Self {
            rows: 4,
            cols: 4,
            data: m.transpose().to_cols_array().to_vec(),
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f32;

    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        &mut self.data[row * self.cols + col]
    }
}
