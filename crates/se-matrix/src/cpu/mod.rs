pub mod classical;
pub mod combine;
pub mod strassen;

use crate::backend::{check_operands, MatmulBackend};
use crate::error::Result;

/// Serial i-k-j triple loop over the unpadded operands.
///
/// No recursion, no threads. Intended as a correctness reference for the
/// Strassen engine.
#[derive(Debug, Clone)]
pub struct NaiveBackend;

impl NaiveBackend {
    pub fn new() -> Self {
        NaiveBackend
    }
}

impl Default for NaiveBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MatmulBackend for NaiveBackend {
    fn name(&self) -> &str {
        "naive"
    }

    fn matmul_into(
        &self,
        a: &[f64],
        b: &[f64],
        n: usize,
        k: usize,
        m: usize,
        out: &mut [f64],
    ) -> Result<()> {
        check_operands(a, b, n, k, m, out)?;

        out.fill(0.0);
        for i in 0..n {
            for p in 0..k {
                let aip = a[i * k + p];
                for j in 0..m {
                    out[i * m + j] += aip * b[p * m + j];
                }
            }
        }
        Ok(())
    }
}
