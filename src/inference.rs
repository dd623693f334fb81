//! Per-cell inference.
//!
//! For every cell `c`, row-major, the engine asks whether the formula plus
//! `future(c)` is satisfiable. Unsatisfiable means the envelope cannot be at
//! `c`: the cell is excluded and scheduled for rollover into the past frame.
//!
//! A pass has two phases. [`InferenceEngine::infer`] computes a verdict for
//! every cell without touching any state; [`InferenceEngine::apply`] then
//! writes the verdicts to the grid and the rollover buffer in row-major order.
//! A timeout or backend failure in the first phase leaves everything as it was.

use serde::Serialize;

use crate::clause::{ClauseSet, FormulaSnapshot, Literal};
use crate::coord::Coordinate;
use crate::error::{ExecutionError, FinderError, FinderResult};
use crate::grid::{BeliefGrid, CellStatus};
use crate::layout::{Frame, VariableLayout};
use crate::rollover::TemporalRollover;
use crate::solver::QueryPool;

/// Strategy for deciding a batch of independent queries against one snapshot.
pub trait CellScan {
    /// Decides `formula ∧ q` for every assumption set `q`, preserving order.
    fn solve_batch(&self, formula: &FormulaSnapshot, queries: Vec<Vec<Literal>>) -> Result<Vec<bool>, ExecutionError>;
}

impl CellScan for QueryPool {
    fn solve_batch(&self, formula: &FormulaSnapshot, queries: Vec<Vec<Literal>>) -> Result<Vec<bool>, ExecutionError> {
        self.solve_all(formula, queries)
    }
}

/// Verdict for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellVerdict {
    /// The cell.
    pub cell: Coordinate,
    /// Whether `future(cell)` is satisfiable.
    pub satisfiable: bool,
}

/// Verdicts of one pass, row-major, plus how they were obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferenceOutcome {
    /// One verdict per cell.
    pub verdicts: Vec<CellVerdict>,
    /// Cells refuted by propagation, without the solver.
    pub refuted: usize,
    /// Queries sent to the solver backend.
    pub solver_queries: usize,
}

/// Changes applied to the grid by one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedInference {
    /// Cells excluded for the first time.
    pub newly_excluded: Vec<Coordinate>,
    /// The confirmed cell, once a single candidate is left.
    pub confirmed: Option<Coordinate>,
}

/// Runs the per-cell satisfiability scan.
#[derive(Debug)]
pub struct InferenceEngine<S = QueryPool> {
    scan: S,
}

impl<S: CellScan> InferenceEngine<S> {
    /// Engine using `scan` for solver queries.
    pub const fn new(scan: S) -> Self {
        Self { scan }
    }

    /// Query strategy.
    pub const fn scan(&self) -> &S {
        &self.scan
    }

    /// Computes a verdict for every cell.
    ///
    /// # Errors
    /// - [`ExecutionError::Contradiction`] if no cell is satisfiable: the
    ///   accumulated evidence contradicts itself.
    /// - Timeouts and backend failures from the scan, unchanged.
    pub fn infer(&self, layout: &VariableLayout, clauses: &ClauseSet) -> FinderResult<InferenceOutcome> {
        let mut verdicts: Vec<CellVerdict> = Vec::with_capacity(layout.cell_count() as usize);
        let mut pending: Vec<usize> = Vec::new();
        let mut queries: Vec<Vec<Literal>> = Vec::new();

        for cell in layout.cells() {
            let future = Literal::positive(layout.location_variable(&cell, Frame::Future));
            if clauses.refutes(future) {
                verdicts.push(CellVerdict { cell, satisfiable: false });
            } else {
                pending.push(verdicts.len());
                queries.push(vec![future]);
                // Placeholder until the batch answers.
                verdicts.push(CellVerdict { cell, satisfiable: true });
            }
        }

        let refuted = verdicts.len() - pending.len();
        let solver_queries = queries.len();
        tracing::debug!(refuted, solver_queries, clauses = clauses.len(), "inference scan");

        if !queries.is_empty() {
            let answers = self.scan.solve_batch(&clauses.snapshot(), queries)?;
            for (slot, answer) in pending.into_iter().zip(answers) {
                verdicts[slot].satisfiable = answer;
            }
        }

        if !verdicts.iter().any(|v| v.satisfiable) {
            return Err(FinderError::contradiction("evidence: no cell can hold the envelope"));
        }

        Ok(InferenceOutcome {
            verdicts,
            refuted,
            solver_queries,
        })
    }

    /// Writes verdicts to the grid and schedules exclusions for rollover.
    ///
    /// Excluded cells never go back to unknown. When exactly one cell is left
    /// it becomes confirmed.
    pub fn apply(&self, outcome: &InferenceOutcome, grid: &mut BeliefGrid, rollover: &mut TemporalRollover) -> AppliedInference {
        let mut applied = AppliedInference::default();

        for verdict in &outcome.verdicts {
            if verdict.satisfiable {
                continue;
            }
            if grid.status(&verdict.cell) != Some(CellStatus::Excluded) {
                applied.newly_excluded.push(verdict.cell);
                grid.set(&verdict.cell, CellStatus::Excluded);
            }
            rollover.schedule(verdict.cell);
        }
        rollover.seal();

        if !applied.newly_excluded.is_empty() {
            tracing::info!(
                newly_excluded = applied.newly_excluded.len(),
                remaining = grid.remaining().len(),
                "cells excluded"
            );
        }

        if let [only] = grid.remaining().as_slice() {
            if grid.status(only) != Some(CellStatus::Confirmed) {
                tracing::info!(cell = %only, "envelope location confirmed");
                grid.set(only, CellStatus::Confirmed);
            }
            applied.confirmed = Some(*only);
        }
        applied
    }
}
