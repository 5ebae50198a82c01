use crate::error::{MatrixError, Result};

/// Default leaf threshold: blocks of this size or smaller are multiplied
/// with the classical triple loop.
pub const DEFAULT_LEAF_SIZE: usize = 64;

/// Default cap on scratch memory each worker keeps between calls (32 MiB).
pub const DEFAULT_SCRATCH_LIMIT: usize = 32 << 20;

/// Environment variable overriding [`EngineConfig::leaf_size`].
pub const LEAF_SIZE_ENV: &str = "SE_LEAF_SIZE";
/// Environment variable overriding [`EngineConfig::num_threads`].
pub const NUM_THREADS_ENV: &str = "SE_NUM_THREADS";
/// Environment variable overriding [`EngineConfig::scratch_limit`].
pub const SCRATCH_LIMIT_ENV: &str = "SE_SCRATCH_LIMIT";

/// Tuning knobs for a [`StrassenEngine`](crate::StrassenEngine).
///
/// No field affects the mathematical result, only how the work is split up
/// and how much memory stays resident between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Working size at or below which recursion stops and the classical
    /// multiplier takes over.
    pub leaf_size: usize,
    /// Worker count for the engine's thread pool. `None` lets rayon pick
    /// (one worker per logical CPU).
    pub num_threads: Option<usize>,
    /// Bytes of scratch buffers each worker may keep after a multiply
    /// returns. Anything above it is freed, largest buffers first. `0`
    /// keeps nothing.
    pub scratch_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            leaf_size: DEFAULT_LEAF_SIZE,
            num_threads: None,
            scratch_limit: DEFAULT_SCRATCH_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_scratch_limit(mut self, bytes: usize) -> Self {
        self.scratch_limit = bytes;
        self
    }

    /// Checks that the leaf size and thread count are usable.
    pub fn validate(&self) -> Result<()> {
        if self.leaf_size == 0 {
            return Err(MatrixError::InvalidConfig(
                "leaf_size must be at least 1".to_string(),
            ));
        }
        if self.num_threads == Some(0) {
            return Err(MatrixError::InvalidConfig(
                "num_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a configuration from the process environment.
    ///
    /// Reads the following variables, falling back to the defaults when unset:
    /// - `SE_LEAF_SIZE` -> leaf_size
    /// - `SE_NUM_THREADS` -> num_threads
    /// - `SE_SCRATCH_LIMIT` -> scratch_limit (bytes)
    pub fn from_env() -> Result<EngineConfig> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<EngineConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();
        if let Some(leaf_size) = parse_var(&lookup, LEAF_SIZE_ENV)? {
            config.leaf_size = leaf_size;
        }
        if let Some(num_threads) = parse_var(&lookup, NUM_THREADS_ENV)? {
            config.num_threads = Some(num_threads);
        }
        if let Some(scratch_limit) = parse_var(&lookup, SCRATCH_LIMIT_ENV)? {
            config.scratch_limit = scratch_limit;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> Result<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<usize>().map(Some).map_err(|e| {
            MatrixError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))
        }),
    }
}
