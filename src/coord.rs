//! Grid coordinates.
//!
//! Coordinates are 1-indexed. `x` is the row (row `dim` is rendered on top),
//! `y` is the column.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A cell of the square world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    /// Row, in `[1, dim]`.
    pub x: u32,
    /// Column, in `[1, dim]`.
    pub y: u32,
}

impl Coordinate {
    /// Creates a coordinate without bounds checking.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Creates a coordinate, rejecting it if it lies outside a `dim`x`dim` world.
    ///
    /// # Errors
    /// [`ValidationError::CoordinateOutOfRange`].
    pub fn checked(x: u32, y: u32, dim: u32) -> Result<Self, ValidationError> {
        let coord = Self::new(x, y);
        coord.validate(dim)?;
        Ok(coord)
    }

    /// Returns true if the coordinate lies inside a `dim`x`dim` world.
    #[must_use]
    pub const fn within(&self, dim: u32) -> bool {
        self.x >= 1 && self.x <= dim && self.y >= 1 && self.y <= dim
    }

    /// Validates the coordinate against a `dim`x`dim` world.
    ///
    /// # Errors
    /// [`ValidationError::CoordinateOutOfRange`] if either axis is outside `1..=dim`.
    pub fn validate(&self, dim: u32) -> Result<(), ValidationError> {
        if self.within(dim) {
            Ok(())
        } else {
            Err(ValidationError::CoordinateOutOfRange {
                x: self.x,
                y: self.y,
                dim,
            })
        }
    }

    /// Floor of the Euclidean distance to `other`.
    ///
    /// This is the ring index the proximity sensor reports.
    #[must_use]
    pub fn ring_distance(&self, other: &Self) -> u32 {
        let dx = u128::from(self.x.abs_diff(other.x));
        let dy = u128::from(self.y.abs_diff(other.y));
        u32::try_from((dx * dx + dy * dy).isqrt()).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Iterates every cell of a `dim`x`dim` world in row-major order.
pub fn cells(dim: u32) -> impl Iterator<Item = Coordinate> {
    (1..=dim).flat_map(move |x| (1..=dim).map(move |y| Coordinate::new(x, y)))
}
