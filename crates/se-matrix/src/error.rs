use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("invalid dimensions: n={n}, k={k}, m={m} (all must be at least 1)")]
    InvalidDimension { n: usize, k: usize, m: usize },
    /// Operands whose inner dimensions disagree. Same class of failure as
    /// [`MatrixError::InvalidDimension`]; see [`MatrixError::is_invalid_dimension`].
    #[error("inner dimension mismatch: A has {k} columns but B has {kb} rows")]
    InnerDimensionMismatch { k: usize, kb: usize },
    #[error("{name}: buffer has {got} elements, expected {expected}")]
    BufferLength {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("row {row} has {got} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("dimension {0} is too large to pad to an addressable power-of-two square")]
    DimensionTooLarge(usize),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl MatrixError {
    /// True for shape errors: a zero dimension or disagreeing inner
    /// dimensions.
    pub fn is_invalid_dimension(&self) -> bool {
        matches!(
            self,
            MatrixError::InvalidDimension { .. } | MatrixError::InnerDimensionMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MatrixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_class() {
        assert!(MatrixError::InvalidDimension { n: 0, k: 1, m: 1 }.is_invalid_dimension());
        assert!(MatrixError::InnerDimensionMismatch { k: 2, kb: 3 }.is_invalid_dimension());
        assert!(!MatrixError::DimensionTooLarge(7).is_invalid_dimension());
        assert!(!MatrixError::InvalidConfig("x".to_string()).is_invalid_dimension());
    }
}
