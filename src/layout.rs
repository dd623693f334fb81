//! Propositional variable layout.
//!
//! Every cell owns one variable per range. Ranges are laid out back to back,
//! each `dim²` long, starting at 1:
//!
//! ```text
//! [ past | future | band:here | band:adjacent | band:near | band:mid | band:far ]
//! ```
//!
//! Inside a range the cell index is row-major, `(x-1)·dim + (y-1)`.
//! The layout is computed once from the world dimension and never changes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::{self, Coordinate};
use crate::error::ValidationError;
use crate::sensor::SensorBand;

/// Largest supported world dimension.
///
/// The static formula grows with the fourth power of the side: a 16x16 world
/// already needs about 394k clauses, and every per-cell query hands the whole
/// formula to a fresh solver.
pub const MAX_WORLD_DIM: u32 = 16;

/// Number of variable ranges (two frames plus five bands).
const RANGE_COUNT: u32 = 7;

/// Identifier of one boolean proposition. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(u32);

impl VariableId {
    /// Raw identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Logical time-frame of a location variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frame {
    /// Knowledge settled by earlier steps.
    Past,
    /// Hypothesis space challenged by the current step's evidence.
    Future,
}

/// Named variable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableRange {
    /// "Envelope at cell" in a frame.
    Location(Frame),
    /// "Band active when read at cell".
    Band(SensorBand),
}

impl VariableRange {
    const fn ordinal(self) -> u32 {
        match self {
            Self::Location(Frame::Past) => 0,
            Self::Location(Frame::Future) => 1,
            Self::Band(band) => 2 + band.index() as u32,
        }
    }

    fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Location(Frame::Past)),
            1 => Some(Self::Location(Frame::Future)),
            n => SensorBand::ALL
                .get(usize::try_from(n.checked_sub(2)?).ok()?)
                .copied()
                .map(Self::Band),
        }
    }
}

/// Immutable mapping between cells and variable identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    dim: u32,
    cells: u32,
}

impl VariableLayout {
    /// Computes the layout for a `dim`x`dim` world.
    ///
    /// # Errors
    /// [`ValidationError::InvalidWorldDim`] unless `1 <= dim <= MAX_WORLD_DIM`.
    pub fn new(dim: u32) -> Result<Self, ValidationError> {
        if dim == 0 || dim > MAX_WORLD_DIM {
            return Err(ValidationError::InvalidWorldDim {
                dim,
                max: MAX_WORLD_DIM,
            });
        }
        Ok(Self {
            dim,
            cells: dim * dim,
        })
    }

    /// World dimension.
    #[must_use]
    pub const fn dim(&self) -> u32 {
        self.dim
    }

    /// Number of cells (`dim²`).
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.cells
    }

    /// Total number of variables across all ranges.
    #[must_use]
    pub const fn total_variables(&self) -> u32 {
        self.cells * RANGE_COUNT
    }

    /// Returns true if `coord` lies in the world.
    #[must_use]
    pub const fn contains(&self, coord: &Coordinate) -> bool {
        coord.within(self.dim)
    }

    /// Iterates all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Coordinate> {
        coord::cells(self.dim)
    }

    /// Variable for "envelope at `coord`" in `frame`.
    ///
    /// `coord` must be inside the world; callers validate at the boundary.
    #[must_use]
    pub fn location_variable(&self, coord: &Coordinate, frame: Frame) -> VariableId {
        self.variable(VariableRange::Location(frame), coord)
    }

    /// Variable for "`band` read at `coord`".
    #[must_use]
    pub fn sensor_variable(&self, coord: &Coordinate, band: SensorBand) -> VariableId {
        self.variable(VariableRange::Band(band), coord)
    }

    /// Inverse of [`Self::location_variable`]. `None` if `var` is not in the frame's range.
    #[must_use]
    pub fn coordinate_of(&self, var: VariableId, frame: Frame) -> Option<Coordinate> {
        match self.classify(var)? {
            (VariableRange::Location(f), coord) if f == frame => Some(coord),
            _ => None,
        }
    }

    /// Range and cell a variable belongs to.
    #[must_use]
    pub fn classify(&self, var: VariableId) -> Option<(VariableRange, Coordinate)> {
        let zero_based = var.get().checked_sub(1)?;
        let range = VariableRange::from_ordinal(zero_based / self.cells)?;
        let index = zero_based % self.cells;
        let coord = Coordinate::new(index / self.dim + 1, index % self.dim + 1);
        Some((range, coord))
    }

    fn variable(&self, range: VariableRange, coord: &Coordinate) -> VariableId {
        debug_assert!(self.contains(coord), "{coord} outside {0}x{0} world", self.dim);
        let index = (coord.x - 1) * self.dim + (coord.y - 1);
        VariableId(range.ordinal() * self.cells + index + 1)
    }
}
