use se_matrix::{EngineConfig, Result, StrassenEngine};

/// Opaque engine handle that owns the worker pool and its scratch buffers.
pub struct SEEngine {
    pub engine: StrassenEngine,
}

impl SEEngine {
    /// `0` for either argument keeps the library default.
    pub fn new(leaf_size: usize, num_threads: usize) -> Result<Self> {
        let mut config = EngineConfig::default();
        if leaf_size > 0 {
            config = config.with_leaf_size(leaf_size);
        }
        if num_threads > 0 {
            config = config.with_num_threads(num_threads);
        }
        Ok(Self {
            engine: StrassenEngine::new(config)?,
        })
    }
}
