use se_matrix::MatrixError;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SEStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorInvalidDimension = 2,
    ErrorInternal = 3,
}

impl From<&MatrixError> for SEStatus {
    fn from(err: &MatrixError) -> Self {
        match err {
            MatrixError::InvalidDimension { .. }
            | MatrixError::InnerDimensionMismatch { .. }
            | MatrixError::BufferLength { .. }
            | MatrixError::RaggedRows { .. }
            | MatrixError::DimensionTooLarge(_) => SEStatus::ErrorInvalidDimension,
            MatrixError::InvalidConfig(_) => SEStatus::ErrorInvalidArgument,
            MatrixError::ThreadPool(_) => SEStatus::ErrorInternal,
        }
    }
}
