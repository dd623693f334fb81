//! Error types for the envelope finder.
//!
//! All errors are strongly typed using thiserror so callers can match on the
//! exact failure. Nothing in the core is retried: once the formula may be
//! corrupted there is no meaningful partial success, so every execution error
//! aborts the run.

use thiserror::Error;

/// Validation errors: malformed input rejected at the boundary.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("World dimension {dim} is out of range [1, {max}]")]
    InvalidWorldDim {
        dim: u32,
        max: u32,
    },

    #[error("Coordinate ({x},{y}) is outside the {dim}x{dim} world")]
    CoordinateOutOfRange {
        x: u32,
        y: u32,
        dim: u32,
    },

    #[error("Malformed step token '{token}': expected 'x,y'")]
    MalformedStep {
        token: String,
    },

    #[error("Malformed belief grid: {reason}")]
    MalformedGrid {
        reason: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },

    #[error("Hint line {line} is outside [1, {dim}]")]
    HintLineOutOfRange {
        line: u32,
        dim: u32,
    },
}

/// Execution errors: failures while running a step.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Contradiction while adding {context}")]
    Contradiction {
        context: String,
    },

    #[error("Satisfiability query timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Sensor reported unknown band code '{code}'")]
    DecodeMismatch {
        code: String,
    },

    #[error("SAT backend failure: {message}")]
    Solver {
        message: String,
    },

    #[error("Environment rejected move to ({x},{y})")]
    MoveRejected {
        x: u32,
        y: u32,
    },

    #[error("No more steps to perform (script has {total} steps)")]
    ScriptExhausted {
        total: usize,
    },

    #[error("Query workers unavailable: {reason}")]
    WorkerUnavailable {
        reason: String,
    },
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl FinderError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a contradiction error.
    #[must_use]
    pub fn contradiction(context: impl Into<String>) -> Self {
        Self::Execution(ExecutionError::Contradiction {
            context: context.into(),
        })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if the formula became (or would become) unsatisfiable.
    #[must_use]
    pub const fn is_contradiction(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Contradiction { .. }))
    }

    /// Returns true if a satisfiability query exceeded its ceiling.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Timeout { .. }))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for finder operations.
pub type FinderResult<T> = Result<T, FinderError>;
