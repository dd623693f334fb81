//! Satisfiability backend seam.
//!
//! The solver is consumed as a black box: it receives an immutable formula
//! snapshot plus assumption literals and answers SAT or UNSAT. Backends must be
//! shareable across query workers; each call builds its own solver state.

mod pool;
mod splr_backend;

pub use pool::{QueryPool, QueryPoolConfig};
pub use splr_backend::SplrBackend;

use crate::clause::{FormulaSnapshot, Literal};
use crate::error::ExecutionError;

/// A SAT solver usable by the inference engine.
pub trait SatBackend: Send + Sync {
    /// Short stable identifier suitable for logging.
    fn name(&self) -> &'static str;

    /// Decides `formula ∧ assumptions`.
    ///
    /// # Errors
    /// [`ExecutionError::Solver`] if the backend fails to produce an answer.
    fn solve(&self, formula: &FormulaSnapshot, assumptions: &[Literal]) -> Result<bool, ExecutionError>;
}
