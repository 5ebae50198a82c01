//! `se-matrix` - Parallel Strassen matrix multiplication.
//!
//! This crate provides:
//! - A `StrassenEngine` that pads operands to a power of two and runs a
//!   recursive, fork-join Strassen multiply on a rayon thread pool
//! - A classical i-k-j multiplier used below a configurable leaf size
//! - Strided quadrant views over row-major buffers
//! - A per-thread scratch arena reused across recursion frames
//! - A `MatmulBackend` trait with a serial `NaiveBackend` reference
//!
//! ```
//! use se_matrix::{EngineConfig, StrassenEngine};
//!
//! let engine = StrassenEngine::new(EngineConfig::default().with_num_threads(2)).unwrap();
//! let a = [1.0, 2.0, 3.0, 4.0];
//! let b = [5.0, 6.0, 7.0, 8.0];
//! let mut c = [0.0; 4];
//! engine.multiply(&a, &b, 2, 2, 2, &mut c).unwrap();
//! assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
//! ```

pub mod alloc;
pub mod backend;
pub mod config;
pub mod cpu;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod view;

// Re-export primary types at the crate root for convenience.
pub use alloc::{allocate, ArenaStats};
pub use backend::MatmulBackend;
pub use config::{EngineConfig, DEFAULT_LEAF_SIZE, DEFAULT_SCRATCH_LIMIT};
pub use cpu::NaiveBackend;
pub use engine::StrassenEngine;
pub use error::{MatrixError, Result};
pub use matrix::Matrix;
pub use view::{MatView, MatViewMut, Quadrant};
