//! `splr` backend.

use splr::{Certificate, SolverError};

use crate::clause::{FormulaSnapshot, Literal};
use crate::error::ExecutionError;

use super::SatBackend;

/// Decides formulas with a fresh `splr` solver per call.
///
/// Assumptions are passed as extra unit clauses, so no solver state leaks
/// between queries and workers never share a solver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SplrBackend;

impl SatBackend for SplrBackend {
    fn name(&self) -> &'static str {
        "splr"
    }

    fn solve(&self, formula: &FormulaSnapshot, assumptions: &[Literal]) -> Result<bool, ExecutionError> {
        let mut cnf: Vec<Vec<i32>> = Vec::with_capacity(formula.len() + assumptions.len());
        cnf.extend(formula.clauses().iter().cloned());
        cnf.extend(assumptions.iter().map(|lit| vec![lit.to_dimacs()]));
        if cnf.is_empty() {
            return Ok(true);
        }

        match Certificate::try_from(cnf) {
            Ok(Certificate::SAT(_)) => Ok(true),
            Ok(Certificate::UNSAT) => Ok(false),
            Err(e) => classify(e),
        }
    }
}

/// Maps a solver error to an answer or an execution error.
///
/// Conflicts found while loading the clauses are plain UNSAT answers. A
/// `splr` time-out carries no duration; the query pool reports its ceiling.
fn classify(error: SolverError) -> Result<bool, ExecutionError> {
    match error {
        SolverError::EmptyClause | SolverError::Inconsistent | SolverError::RootLevelConflict(_) => Ok(false),
        SolverError::TimeOut => Err(ExecutionError::Timeout { duration_ms: 0 }),
        other => Err(ExecutionError::Solver {
            message: format!("splr: {other:?}"),
        }),
    }
}
