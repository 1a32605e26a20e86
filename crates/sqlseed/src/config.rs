//! Seeder configuration

use anyhow::{Context, Result};

/// Lines per chunk when a task leaves its chunk size unset
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Environment variable overriding [`DEFAULT_CHUNK_SIZE`]
pub const CHUNK_SIZE_ENV: &str = "SEED_DEFAULT_CHUNK_SIZE";

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeederConfig {
    /// Chunk size for tasks whose own chunk size is 0
    pub default_chunk_size: usize,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl SeederConfig {
    /// Defaults overridden by `SEED_DEFAULT_CHUNK_SIZE`
    pub fn from_env() -> Result<Self> {
        let config = Self::default();

        match std::env::var(CHUNK_SIZE_ENV) {
            Ok(size) => {
                let parsed = size
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid {} '{}'", CHUNK_SIZE_ENV, size))?;
                config
                    .with_default_chunk_size(parsed)
                    .with_context(|| format!("Invalid {} '{}'", CHUNK_SIZE_ENV, size))
            },
            Err(_) => Ok(config),
        }
    }

    pub fn with_default_chunk_size(mut self, size: usize) -> Result<Self> {
        if size == 0 {
            anyhow::bail!("Default chunk size must be positive");
        }
        self.default_chunk_size = size;
        Ok(self)
    }

    /// The chunk size a task actually runs with
    pub fn effective_chunk_size(&self, configured: usize) -> usize {
        if configured != 0 {
            configured
        } else {
            self.default_chunk_size
        }
    }
}
