use std::fmt::Debug;

use crate::error::{MatrixError, Result};

/// Trait for pluggable matrix multiplication backends.
///
/// Operands are dense, row-major f64 slices. `a` is n×k, `b` is k×m and the
/// product is n×m.
pub trait MatmulBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "strassen", "naive").
    fn name(&self) -> &str;

    /// Matrix multiplication into caller storage: out = A @ B.
    ///
    /// `out` is overwritten, not accumulated into. Dimensions and buffer
    /// lengths are checked before any work or allocation happens.
    fn matmul_into(
        &self,
        a: &[f64],
        b: &[f64],
        n: usize,
        k: usize,
        m: usize,
        out: &mut [f64],
    ) -> Result<()>;

    /// Matrix multiplication returning a freshly allocated n×m result.
    fn matmul(&self, a: &[f64], b: &[f64], n: usize, k: usize, m: usize) -> Result<Vec<f64>> {
        check_dims(n, k, m)?;
        let len = n
            .checked_mul(m)
            .ok_or(MatrixError::DimensionTooLarge(n.max(m)))?;
        let mut out = vec![0.0; len];
        self.matmul_into(a, b, n, k, m, &mut out)?;
        Ok(out)
    }
}

/// Rejects empty dimensions.
pub fn check_dims(n: usize, k: usize, m: usize) -> Result<()> {
    if n == 0 || k == 0 || m == 0 {
        return Err(MatrixError::InvalidDimension { n, k, m });
    }
    Ok(())
}

/// Validates dimensions and that each buffer holds exactly its matrix.
pub fn check_operands(
    a: &[f64],
    b: &[f64],
    n: usize,
    k: usize,
    m: usize,
    out: &[f64],
) -> Result<()> {
    check_dims(n, k, m)?;
    check_len("a", a.len(), n, k)?;
    check_len("b", b.len(), k, m)?;
    check_len("out", out.len(), n, m)?;
    Ok(())
}

fn check_len(name: &'static str, got: usize, rows: usize, cols: usize) -> Result<()> {
    let expected = rows
        .checked_mul(cols)
        .ok_or(MatrixError::DimensionTooLarge(rows.max(cols)))?;
    if got != expected {
        return Err(MatrixError::BufferLength {
            name,
            expected,
            got,
        });
    }
    Ok(())
}
