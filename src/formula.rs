//! Time-invariant rules of the envelope world.
//!
//! Built once, when the agent starts, before any evidence arrives:
//!
//! 1. frame consistency: `future(c) → past(c)`, so a cell excluded in the past
//!    frame stays excluded in the future frame;
//! 2. exactly one envelope location per frame;
//! 3. sensor implications linking every band variable to the future frame;
//! 4. the configured initial exclusions, in both frames.
//!
//! A contradiction while building means the rules themselves are broken and is
//! reported as fatal.

use serde::Serialize;

use crate::clause::{Clause, ClauseSet, Literal};
use crate::coord::Coordinate;
use crate::error::{ExecutionError, FinderResult};
use crate::layout::{Frame, VariableLayout};
use crate::sensor::SensorBand;

/// Number of clauses emitted per rule group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FormulaStats {
    /// Past/future consistency clauses.
    pub consistency: usize,
    /// At-least-one and at-most-one location clauses.
    pub location: usize,
    /// Band implication clauses.
    pub sensor: usize,
    /// Initial exclusion units.
    pub exclusions: usize,
}

impl FormulaStats {
    /// Total clauses added.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.consistency + self.location + self.sensor + self.exclusions
    }
}

/// Builds the static part of the formula.
#[derive(Debug, Clone, Copy)]
pub struct StaticFormulaBuilder<'a> {
    layout: &'a VariableLayout,
    initial_exclusions: &'a [Coordinate],
}

impl<'a> StaticFormulaBuilder<'a> {
    /// Builder for `layout` with no initial exclusions.
    #[must_use]
    pub const fn new(layout: &'a VariableLayout) -> Self {
        Self {
            layout,
            initial_exclusions: &[],
        }
    }

    /// Cells known not to hold the envelope before the first step.
    #[must_use]
    pub const fn with_initial_exclusions(mut self, cells: &'a [Coordinate]) -> Self {
        self.initial_exclusions = cells;
        self
    }

    /// Emits every static rule into `clauses`.
    ///
    /// # Errors
    /// A validation error for an out-of-range initial exclusion, or
    /// [`ExecutionError::Contradiction`] if the rules contradict each other.
    pub fn build(&self, clauses: &mut ClauseSet) -> FinderResult<FormulaStats> {
        for cell in self.initial_exclusions {
            cell.validate(self.layout.dim())?;
        }

        let stats = FormulaStats {
            consistency: self.frame_consistency(clauses)?,
            location: self.exactly_one(clauses, Frame::Past)? + self.exactly_one(clauses, Frame::Future)?,
            sensor: self.sensor_implications(clauses)?,
            exclusions: self.initial_exclusion_units(clauses)?,
        };

        tracing::debug!(
            dim = self.layout.dim(),
            variables = self.layout.total_variables(),
            clauses = stats.total(),
            "static formula built"
        );
        Ok(stats)
    }

    fn frame_consistency(&self, clauses: &mut ClauseSet) -> Result<usize, ExecutionError> {
        let mut added = 0;
        for cell in self.layout.cells() {
            let past = self.layout.location_variable(&cell, Frame::Past);
            let future = self.layout.location_variable(&cell, Frame::Future);
            let clause = Clause::new([Literal::positive(past), Literal::negative(future)]);
            added += usize::from(clauses.add_clause(clause, "frame consistency")?);
        }
        Ok(added)
    }

    fn exactly_one(&self, clauses: &mut ClauseSet, frame: Frame) -> Result<usize, ExecutionError> {
        let vars: Vec<_> = self
            .layout
            .cells()
            .map(|cell| self.layout.location_variable(&cell, frame))
            .collect();

        let mut added = usize::from(clauses.add_clause(
            Clause::new(vars.iter().map(|var| Literal::positive(*var))),
            "at least one location",
        )?);
        for (i, first) in vars.iter().enumerate() {
            for second in &vars[i + 1..] {
                let clause = Clause::new([Literal::negative(*first), Literal::negative(*second)]);
                added += usize::from(clauses.add_clause(clause, "at most one location")?);
            }
        }
        Ok(added)
    }

    fn sensor_implications(&self, clauses: &mut ClauseSet) -> Result<usize, ExecutionError> {
        let mut added = 0;
        for reading in self.layout.cells() {
            for band in SensorBand::ALL {
                let band_var = self.layout.sensor_variable(&reading, band);
                let not_band = Literal::negative(band_var);

                let (inside, outside): (Vec<Coordinate>, Vec<Coordinate>) = self
                    .layout
                    .cells()
                    .partition(|cell| band.matches(&reading, cell));

                // band(r) → the envelope lies in the ring. Empty ring: band never fires here.
                let ring = inside
                    .iter()
                    .map(|cell| Literal::positive(self.layout.location_variable(cell, Frame::Future)));
                added += usize::from(
                    clauses.add_clause(Clause::new(std::iter::once(not_band).chain(ring)), "band pattern")?,
                );

                // band(r) → not outside the ring.
                for cell in &outside {
                    let future = self.layout.location_variable(cell, Frame::Future);
                    let clause = Clause::new([not_band, Literal::negative(future)]);
                    added += usize::from(clauses.add_clause(clause, "band exclusion")?);
                }

                // Envelope in the ring → band(r).
                for cell in &inside {
                    let future = self.layout.location_variable(cell, Frame::Future);
                    let clause = Clause::new([Literal::negative(future), Literal::positive(band_var)]);
                    added += usize::from(clauses.add_clause(clause, "band trigger")?);
                }
            }
        }
        Ok(added)
    }

    fn initial_exclusion_units(&self, clauses: &mut ClauseSet) -> Result<usize, ExecutionError> {
        let mut added = 0;
        for cell in self.initial_exclusions {
            for frame in [Frame::Past, Frame::Future] {
                let var = self.layout.location_variable(cell, frame);
                added += usize::from(clauses.add_unit(Literal::negative(var), "initial exclusion")?);
            }
        }
        Ok(added)
    }
}
