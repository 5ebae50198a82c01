use crate::backend::MatmulBackend;
use crate::error::{MatrixError, Result};
use crate::view::MatView;

/// A dense, row-major f64 matrix.
///
/// The row stride always equals `cols`. Multiplication is dispatched to a
/// `MatmulBackend`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Create a matrix from row-major data.
    ///
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "data length {} does not match {}x{} matrix",
            data.len(),
            rows,
            cols
        );
        Matrix { data, rows, cols }
    }

    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// The n×n identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Build a matrix from a list of equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.is_empty() || cols == 0 {
            return Err(MatrixError::InvalidDimension {
                n: rows.len(),
                k: cols,
                m: cols,
            });
        }
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != cols {
                return Err(MatrixError::RaggedRows {
                    row,
                    expected: cols,
                    got: values.len(),
                });
            }
            data.extend_from_slice(values);
        }
        Ok(Matrix::new(data, rows.len(), cols))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at row `i`, column `j`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.rows && j < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            i,
            j,
            self.rows,
            self.cols
        );
        self.data[i * self.cols + j]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        t
    }

    /// Strided view of the whole matrix.
    ///
    /// # Panics
    /// Panics if the matrix is not square.
    pub fn view(&self) -> MatView<'_> {
        assert_eq!(
            self.rows, self.cols,
            "view requires a square matrix, got {}x{}",
            self.rows, self.cols
        );
        MatView::compact(&self.data, self.rows)
    }

    /// Matrix product `self @ other` using the given backend.
    ///
    /// self is [n, k], other is [k, m], result is [n, m].
    pub fn matmul(&self, other: &Matrix, backend: &dyn MatmulBackend) -> Result<Matrix> {
        let (n, k, kb, m) = (self.rows, self.cols, other.rows, other.cols);
        if n == 0 || k == 0 || m == 0 {
            return Err(MatrixError::InvalidDimension { n, k, m });
        }
        if k != kb {
            return Err(MatrixError::InnerDimensionMismatch { k, kb });
        }

        let data = backend.matmul(&self.data, &other.data, n, k, m)?;
        Ok(Matrix::new(data, n, m))
    }
}
