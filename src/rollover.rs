//! Future-to-past frame rollover.
//!
//! Exclusions proven during step `t` are expressed over the future frame.
//! They are buffered, sealed at the end of the step, and committed as
//! past-frame unit facts at the start of step `t+1`, before new evidence:
//!
//! ```text
//! schedule(c) ──► pending_future_exclusions ──seal()──► pending_past_facts ──commit()──► formula
//! ```
//!
//! The two buffers are swapped, never shared, so the frame transition is a
//! single explicit step. Committed cells are remembered and never re-added.

use std::collections::BTreeSet;
use std::mem;

use crate::clause::{ClauseSet, Literal};
use crate::coord::Coordinate;
use crate::error::FinderResult;
use crate::layout::{Frame, VariableLayout};

/// Double buffer of exclusions moving from the future frame to the past frame.
#[derive(Debug, Clone, Default)]
pub struct TemporalRollover {
    pending_future_exclusions: BTreeSet<Coordinate>,
    pending_past_facts: BTreeSet<Coordinate>,
    committed: BTreeSet<Coordinate>,
}

impl TemporalRollover {
    /// Empty rollover.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers an exclusion proven in the current step.
    ///
    /// Returns false if the cell is already committed or buffered.
    pub fn schedule(&mut self, cell: Coordinate) -> bool {
        if self.committed.contains(&cell) || self.pending_past_facts.contains(&cell) {
            return false;
        }
        self.pending_future_exclusions.insert(cell)
    }

    /// Ends the current step: this step's exclusions become the facts to commit next.
    pub fn seal(&mut self) {
        let sealed = mem::take(&mut self.pending_future_exclusions);
        self.pending_past_facts.extend(sealed);
    }

    /// Adds the sealed facts to the formula as `¬past(c)` units.
    ///
    /// Returns the number of clauses added. Calling it again without new
    /// sealed facts adds nothing.
    ///
    /// # Errors
    /// [`ExecutionError::Contradiction`](crate::error::ExecutionError::Contradiction) if a fact contradicts the formula.
    pub fn commit(&mut self, layout: &VariableLayout, clauses: &mut ClauseSet) -> FinderResult<usize> {
        let facts = mem::take(&mut self.pending_past_facts);
        let mut added = 0;
        for cell in facts {
            if !self.committed.insert(cell) {
                continue;
            }
            let past = layout.location_variable(&cell, Frame::Past);
            added += usize::from(clauses.add_unit(Literal::negative(past), "past-frame exclusion")?);
        }
        if added > 0 {
            tracing::debug!(added, committed = self.committed.len(), "rolled exclusions into past frame");
        }
        Ok(added)
    }

    /// Re-applies every committed fact. Used to check idempotence; adds nothing
    /// to a formula that already holds them.
    ///
    /// # Errors
    /// [`ExecutionError::Contradiction`](crate::error::ExecutionError::Contradiction) if a fact contradicts the formula.
    pub fn replay(&self, layout: &VariableLayout, clauses: &mut ClauseSet) -> FinderResult<usize> {
        let mut added = 0;
        for cell in &self.committed {
            let past = layout.location_variable(cell, Frame::Past);
            added += usize::from(clauses.add_unit(Literal::negative(past), "past-frame exclusion")?);
        }
        Ok(added)
    }

    /// Returns true if `cell` is already a committed past-frame fact.
    #[must_use]
    pub fn is_committed(&self, cell: &Coordinate) -> bool {
        self.committed.contains(cell)
    }

    /// Cells committed so far.
    #[must_use]
    pub fn committed(&self) -> &BTreeSet<Coordinate> {
        &self.committed
    }

    /// Cells sealed and waiting for the next commit.
    #[must_use]
    pub fn pending(&self) -> &BTreeSet<Coordinate> {
        &self.pending_past_facts
    }
}
