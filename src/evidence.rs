//! Per-step evidence injection.
//!
//! Evidence only adds clauses; it never asks the solver anything. The reading
//! at a cell is asserted completely: every active band as a positive unit and
//! every inactive band as a negative unit, so "none" negates all five.

use crate::clause::{ClauseSet, Literal};
use crate::coord::Coordinate;
use crate::error::{FinderResult, ValidationError};
use crate::layout::{Frame, VariableLayout};
use crate::sensor::{DirectionalHint, SensorBand, SensorReading};

/// Turns observations into clauses.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceEncoder<'a> {
    layout: &'a VariableLayout,
}

impl<'a> EvidenceEncoder<'a> {
    /// Encoder for `layout`.
    #[must_use]
    pub const fn new(layout: &'a VariableLayout) -> Self {
        Self { layout }
    }

    /// Asserts the detector reading taken at `at`. Returns the clauses added.
    ///
    /// # Errors
    /// A validation error if `at` is outside the world, or a contradiction if
    /// the reading is inconsistent with what is already known.
    pub fn encode_reading(&self, clauses: &mut ClauseSet, at: Coordinate, reading: &SensorReading) -> FinderResult<usize> {
        at.validate(self.layout.dim())?;
        let context = format!("sensor reading {reading} at {at}");

        let mut added = 0;
        for band in SensorBand::ALL {
            let var = self.layout.sensor_variable(&at, band);
            let literal = Literal::with_polarity(var, reading.is_active(band));
            added += usize::from(clauses.add_unit(literal, &context)?);
        }
        tracing::debug!(%at, %reading, added, "sensor evidence encoded");
        Ok(added)
    }

    /// Asserts the same-cell presence flag reported by a move.
    ///
    /// # Errors
    /// A validation error if `at` is off the grid, or
    /// [`ExecutionError::Contradiction`](crate::error::ExecutionError::Contradiction) if the flag contradicts earlier facts.
    pub fn encode_presence(&self, clauses: &mut ClauseSet, at: Coordinate, present: bool) -> FinderResult<usize> {
        at.validate(self.layout.dim())?;
        let context = format!("presence={present} at {at}");

        let mut added = 0;
        if present {
            for cell in self.layout.cells().filter(|cell| *cell != at) {
                added += self.exclude_future(clauses, &cell, &context)?;
            }
        } else {
            added += self.exclude_future(clauses, &at, &context)?;
        }
        Ok(added)
    }

    /// Asserts a directional-oracle answer: every cell on the wrong side of the
    /// line is excluded in the future frame.
    ///
    /// # Errors
    /// [`ValidationError::HintLineOutOfRange`] for a line outside the grid, or
    /// [`ExecutionError::Contradiction`](crate::error::ExecutionError::Contradiction) if the hint contradicts earlier facts.
    pub fn encode_hint(&self, clauses: &mut ClauseSet, hint: DirectionalHint) -> FinderResult<usize> {
        let dim = self.layout.dim();
        if hint.line == 0 || hint.line > dim {
            return Err(ValidationError::HintLineOutOfRange { line: hint.line, dim }.into());
        }
        let context = format!("hint {:?} {}", hint.direction, hint.line);

        let mut added = 0;
        for cell in self.layout.cells().filter(|cell| !hint.admits(cell)) {
            added += self.exclude_future(clauses, &cell, &context)?;
        }
        tracing::debug!(direction = ?hint.direction, line = hint.line, added, "hint encoded");
        Ok(added)
    }

    fn exclude_future(&self, clauses: &mut ClauseSet, cell: &Coordinate, context: &str) -> FinderResult<usize> {
        let var = self.layout.location_variable(cell, Frame::Future);
        Ok(usize::from(clauses.add_unit(Literal::negative(var), context)?))
    }
}
