use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::alloc::{allocate, clear_thread_arena, trim_thread_arena};
use crate::backend::{check_operands, MatmulBackend};
use crate::config::EngineConfig;
use crate::cpu::strassen::strassen;
use crate::error::{MatrixError, Result};
use crate::view::{MatView, MatViewMut};

/// Side length of the square power-of-two buffer that holds an
/// n×k by k×m product.
///
/// Fails with [`MatrixError::DimensionTooLarge`] when a `size×size` f64
/// buffer could not be addressed (more than `isize::MAX` bytes).
pub fn padded_size(n: usize, k: usize, m: usize) -> Result<usize> {
    let largest = n.max(k).max(m);
    let size = largest
        .checked_next_power_of_two()
        .ok_or(MatrixError::DimensionTooLarge(largest))?;
    let bytes = size
        .checked_mul(size)
        .and_then(|len| len.checked_mul(std::mem::size_of::<f64>()))
        .ok_or(MatrixError::DimensionTooLarge(largest))?;
    if bytes > isize::MAX as usize {
        return Err(MatrixError::DimensionTooLarge(largest));
    }
    Ok(size)
}

/// Number of recursive splits before a block of `size` reaches `leaf_size`.
pub fn recursion_depth(size: usize, leaf_size: usize) -> usize {
    let mut depth = 0;
    let mut r = size;
    while r > leaf_size.max(1) {
        r /= 2;
        depth += 1;
    }
    depth
}

/// Parallel Strassen multiplication engine.
///
/// Pads both operands to a common power-of-two square, runs the recursion
/// once inside the engine's own thread pool, and copies the top-left n×m
/// block of the padded product back out. Padding never changes the rows and
/// columns the caller asked for.
#[derive(Debug)]
pub struct StrassenEngine {
    config: EngineConfig,
    pool: ThreadPool,
}

impl StrassenEngine {
    /// Create an engine, spawning its worker pool.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("se-worker-{}", i));
        if let Some(n) = config.num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder.build()?;
        debug!(
            leaf_size = config.leaf_size,
            threads = pool.current_num_threads(),
            "strassen engine ready"
        );
        Ok(StrassenEngine { config, pool })
    }

    /// Engine configured from `SE_LEAF_SIZE` / `SE_NUM_THREADS`.
    pub fn from_env() -> Result<Self> {
        Self::new(EngineConfig::from_env()?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Multiply `a` (n×k) by `b` (k×m) into `out` (n×m).
    ///
    /// `out` is overwritten. Fails with [`MatrixError::InvalidDimension`] when
    /// any dimension is zero, and with [`MatrixError::BufferLength`] when a
    /// slice does not hold exactly its matrix; in both cases nothing is
    /// allocated and `out` is untouched.
    pub fn multiply(
        &self,
        a: &[f64],
        b: &[f64],
        n: usize,
        k: usize,
        m: usize,
        out: &mut [f64],
    ) -> Result<()> {
        check_operands(a, b, n, k, m, out)?;
        let size = padded_size(n, k, m)?;
        let leaf_size = self.config.leaf_size;
        debug!(
            n,
            k,
            m,
            padded = size,
            leaf_size,
            depth = recursion_depth(size, leaf_size),
            "strassen multiply"
        );

        let a_pad = pad(a, k, size);
        let b_pad = pad(b, m, size);
        let mut c_pad = allocate(size);

        self.pool.install(|| {
            strassen(
                MatView::compact(&a_pad, size),
                MatView::compact(&b_pad, size),
                MatViewMut::compact(&mut c_pad, size),
                leaf_size,
            )
        });
        if size > leaf_size {
            self.trim_scratch();
        }

        for (dst, src) in out.chunks_exact_mut(m).zip(c_pad.chunks_exact(size)) {
            dst.copy_from_slice(&src[..m]);
        }
        Ok(())
    }

    /// Shrink every worker's arena back under the configured scratch limit.
    fn trim_scratch(&self) {
        let limit = self.config.scratch_limit;
        let released: usize = self
            .pool
            .broadcast(|_| trim_thread_arena(limit))
            .into_iter()
            .sum();
        if released > 0 {
            debug!(released, limit, "trimmed scratch buffers");
        }
    }

    /// Free the scratch buffers every worker keeps between calls.
    ///
    /// Returns the number of buffers released.
    pub fn release_scratch(&self) -> usize {
        self.pool
            .broadcast(|_| clear_thread_arena())
            .into_iter()
            .sum()
    }
}

/// Copy a row-major matrix with `cols` columns into the top-left corner of a
/// zeroed `size×size` buffer.
fn pad(src: &[f64], cols: usize, size: usize) -> Vec<f64> {
    let mut dst = allocate(size);
    for (dst_row, src_row) in dst.chunks_exact_mut(size).zip(src.chunks_exact(cols)) {
        dst_row[..cols].copy_from_slice(src_row);
    }
    dst
}

impl MatmulBackend for StrassenEngine {
    fn name(&self) -> &str {
        "strassen"
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
        self.multiply(a, b, n, k, m, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{COMBINATIONS, PRODUCTS};

    fn engine(leaf_size: usize) -> StrassenEngine {
        StrassenEngine::new(EngineConfig::new().with_leaf_size(leaf_size).with_num_threads(2))
            .unwrap()
    }

    #[test]
    fn test_padded_size() {
        assert_eq!(padded_size(1, 1, 1).unwrap(), 1);
        assert_eq!(padded_size(3, 5, 2).unwrap(), 8);
        assert_eq!(padded_size(64, 64, 64).unwrap(), 64);
        assert_eq!(padded_size(65, 2, 2).unwrap(), 128);
        assert!(matches!(
            padded_size(usize::MAX, 1, 1),
            Err(MatrixError::DimensionTooLarge(_))
        ));
        // Side 2^30 squares to 2^60 elements: the count fits, the bytes don't.
        let side = 1usize << (usize::BITS / 2 - 2);
        assert!(side.checked_mul(side).is_some());
        assert!(matches!(
            padded_size(side, 1, 1),
            Err(MatrixError::DimensionTooLarge(_))
        ));
        let fits = 1usize << (usize::BITS / 2 - 3);
        assert_eq!(padded_size(fits, 1, 1).unwrap(), fits);
    }

    #[test]
    fn test_recursion_depth() {
        assert_eq!(recursion_depth(64, 64), 0);
        assert_eq!(recursion_depth(1024, 64), 4);
        assert_eq!(recursion_depth(8, 1), 3);
        assert_eq!(recursion_depth(2, 100), 0);
    }

    #[test]
    fn test_pad() {
        let p = pad(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 4);
        assert_eq!(
            p,
            vec![
                1.0, 2.0, 3.0, 0.0, //
                4.0, 5.0, 6.0, 0.0, //
                0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 0.0,
            ]
        );
    }

    #[test]
    fn test_multiply_2x2() {
        let e = engine(1);
        let mut out = vec![0.0; 4];
        e.multiply(&[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0], 2, 2, 2, &mut out)
            .unwrap();
        assert_eq!(out, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_multiply_overwrites_out() {
        let e = engine(64);
        let mut out = vec![-1.0; 4];
        e.multiply(&[1.0, 0.0, 0.0, 1.0], &[1.0, 2.0, 3.0, 4.0], 2, 2, 2, &mut out)
            .unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_zero_dimension_leaves_out_untouched() {
        let e = engine(64);
        let mut out = vec![9.0; 3];
        let err = e.multiply(&[], &[1.0, 2.0, 3.0], 0, 1, 3, &mut out).unwrap_err();
        assert!(matches!(err, MatrixError::InvalidDimension { n: 0, k: 1, m: 3 }));
        assert_eq!(out, vec![9.0; 3]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(StrassenEngine::new(EngineConfig::new().with_leaf_size(0)).is_err());
    }

    #[test]
    fn test_scratch_reused_across_calls() {
        let e = StrassenEngine::new(EngineConfig::new().with_leaf_size(1).with_num_threads(1))
            .unwrap();
        let a: Vec<f64> = (0..64).map(|i| (i % 9) as f64).collect();
        let mut out = vec![0.0; 64];

        e.multiply(&a, &a, 8, 8, 8, &mut out).unwrap();
        let first = e.pool.install(crate::alloc::arena_stats);
        assert!(first.fresh_allocations >= 3 * (COMBINATIONS + PRODUCTS));

        e.multiply(&a, &a, 8, 8, 8, &mut out).unwrap();
        let second = e.pool.install(crate::alloc::arena_stats);
        assert_eq!(second.fresh_allocations, first.fresh_allocations);
        assert!(second.reuses > first.reuses);

        assert_eq!(e.release_scratch(), second.retained_buffers);
        assert_eq!(e.release_scratch(), 0);
    }

    fn retained_bytes(e: &StrassenEngine) -> Vec<usize> {
        e.pool
            .broadcast(|_| crate::alloc::arena_stats().retained_bytes)
    }

    #[test]
    fn test_scratch_bounded_after_call() {
        let limit = 1 << 20;
        let e = StrassenEngine::new(
            EngineConfig::new()
                .with_leaf_size(32)
                .with_num_threads(2)
                .with_scratch_limit(limit),
        )
        .unwrap();
        let n = 256;
        let a: Vec<f64> = (0..n * n).map(|i| (i % 13) as f64).collect();

        // One 128x128 scratch set alone is about 2.2 MB.
        e.matmul(&a, &a, n, n, n).unwrap();
        assert!(retained_bytes(&e).iter().all(|&b| b <= limit));

        // Concurrent callers still settle under the limit.
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| e.matmul(&a, &a, n, n, n).unwrap());
            }
        });
        assert!(retained_bytes(&e).iter().all(|&b| b <= limit));
    }

    #[test]
    fn test_zero_scratch_limit_keeps_nothing() {
        let e = StrassenEngine::new(
            EngineConfig::new()
                .with_leaf_size(4)
                .with_num_threads(2)
                .with_scratch_limit(0),
        )
        .unwrap();
        let a: Vec<f64> = (0..256).map(|i| (i % 7) as f64).collect();
        e.matmul(&a, &a, 16, 16, 16).unwrap();
        assert_eq!(retained_bytes(&e), vec![0, 0]);
        assert_eq!(e.release_scratch(), 0);
    }

    #[test]
    fn test_backend_name() {
        assert_eq!(engine(64).name(), "strassen");
    }
}
