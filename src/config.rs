//! Run configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::error::{FinderResult, ValidationError};
use crate::layout::MAX_WORLD_DIM;
use crate::solver::QueryPoolConfig;

/// Configuration of one envelope search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Side length of the square world.
    pub world_dim: u32,
    /// Ceiling for a single satisfiability query, in milliseconds.
    pub query_timeout_ms: u64,
    /// Worker threads answering per-cell queries.
    pub query_workers: usize,
    /// Maximum queued per-cell queries.
    pub queue_capacity: usize,
    /// Ask the directional oracle after every move.
    pub ask_direction_oracle: bool,
    /// Use the same-cell presence flag reported by moves.
    pub use_presence_flag: bool,
    /// Cells known not to hold the envelope before the first step.
    pub initial_exclusions: Vec<Coordinate>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            world_dim: 5,
            query_timeout_ms: 60 * 60 * 1000, // 1 hour
            query_workers: 1,
            queue_capacity: 256,
            ask_direction_oracle: false,
            use_presence_flag: true,
            initial_exclusions: Vec::new(),
        }
    }
}

impl FinderConfig {
    /// Default configuration for a `world_dim`x`world_dim` world.
    #[must_use]
    pub fn for_world(world_dim: u32) -> Self {
        Self {
            world_dim,
            ..Self::default()
        }
    }

    /// Checks every field.
    ///
    /// # Errors
    /// [`ValidationError::InvalidWorldDim`] for a dimension outside
    /// `[1, MAX_WORLD_DIM]`, [`ValidationError::CoordinateOutOfRange`] for an
    /// initial exclusion outside the world, and
    /// [`ValidationError::InvalidConfig`] for a zero timeout or worker count.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.world_dim == 0 || self.world_dim > MAX_WORLD_DIM {
            return Err(ValidationError::InvalidWorldDim {
                dim: self.world_dim,
                max: MAX_WORLD_DIM,
            });
        }
        if self.query_timeout_ms == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "query_timeout_ms must be positive".to_string(),
            });
        }
        if self.query_workers == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "query_workers must be at least 1".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "queue_capacity must be at least 1".to_string(),
            });
        }
        for cell in &self.initial_exclusions {
            cell.validate(self.world_dim)?;
        }
        Ok(self)
    }

    /// Reads a JSON configuration file. Missing fields take their defaults.
    ///
    /// # Errors
    /// An I/O error if the file cannot be read, or a validation error if it
    /// does not parse or fails [`FinderConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> FinderResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| ValidationError::InvalidConfig {
            reason: format!("{}: {e}", path.display()),
        })?;
        Ok(config.validate()?)
    }

    /// Query ceiling.
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Pool settings derived from this configuration.
    #[must_use]
    pub const fn pool_config(&self) -> QueryPoolConfig {
        QueryPoolConfig {
            workers: self.query_workers,
            queue_capacity: self.queue_capacity,
            timeout: self.query_timeout(),
        }
    }
}
