//! The agent's view of the world, and a reference simulator.
//!
//! The finder only talks to the world through [`Environment`]. The simulator,
//! [`EnvelopeWorld`], hides a single envelope and answers with the same band
//! geometry the formula encodes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::error::{FinderResult, ValidationError};
use crate::script::parse_coordinate;
use crate::sensor::{SensorBand, NONE_CODE};

/// Answer to a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Whether the move was accepted.
    pub moved: bool,
    /// Position after the request.
    pub position: Coordinate,
    /// Same-cell presence flag, when the world reports one.
    pub object_here: Option<bool>,
}

/// Everything the finder can ask the world.
pub trait Environment {
    /// Moves the agent to `to`.
    fn move_to(&mut self, to: Coordinate) -> MoveOutcome;

    /// Raw detector codes read at `at`.
    fn detect_at(&self, at: Coordinate) -> Vec<String>;

    /// Directional oracle: is the envelope in a row above `at`?
    fn is_object_above(&self, at: Coordinate) -> bool;
}

/// Simulated world holding one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeWorld {
    dim: u32,
    envelope: Coordinate,
    position: Coordinate,
}

impl EnvelopeWorld {
    /// World of side `dim` with the envelope at `envelope`. The agent starts at (1,1).
    ///
    /// # Errors
    /// [`ValidationError::CoordinateOutOfRange`] if the envelope is off the grid.
    pub fn new(dim: u32, envelope: Coordinate) -> Result<Self, ValidationError> {
        envelope.validate(dim)?;
        Ok(Self {
            dim,
            envelope,
            position: Coordinate::new(1, 1),
        })
    }

    /// Reads the envelope location from a file of whitespace-separated `x,y`
    /// tokens. The world holds one envelope, so the file must list exactly one.
    ///
    /// # Errors
    /// [`crate::FinderError::Io`] if the file cannot be read, a validation error
    /// for a malformed or out-of-range token, or
    /// [`ValidationError::InvalidConfig`] unless exactly one location is listed.
    pub fn load(path: impl AsRef<Path>, dim: u32) -> FinderResult<Self> {
        let text = fs::read_to_string(path)?;
        let locations = text
            .split_whitespace()
            .map(|token| parse_coordinate(token, dim))
            .collect::<FinderResult<Vec<_>>>()?;
        match locations.as_slice() {
            [envelope] => Ok(Self::new(dim, *envelope)?),
            _ => Err(ValidationError::InvalidConfig {
                reason: format!("envelope file must list exactly one location, found {}", locations.len()),
            }
            .into()),
        }
    }

    /// World dimension.
    #[must_use]
    pub const fn dim(&self) -> u32 {
        self.dim
    }

    /// Where the envelope is.
    #[must_use]
    pub const fn envelope(&self) -> Coordinate {
        self.envelope
    }

    /// Current agent position.
    #[must_use]
    pub const fn position(&self) -> Coordinate {
        self.position
    }
}

impl Environment for EnvelopeWorld {
    fn move_to(&mut self, to: Coordinate) -> MoveOutcome {
        let moved = to.within(self.dim);
        if moved {
            self.position = to;
        } else {
            tracing::warn!(%to, dim = self.dim, "move outside world refused");
        }
        MoveOutcome {
            moved,
            position: self.position,
            object_here: Some(self.position == self.envelope),
        }
    }

    fn detect_at(&self, at: Coordinate) -> Vec<String> {
        let code = SensorBand::for_ring(at.ring_distance(&self.envelope)).map_or(NONE_CODE, SensorBand::code);
        vec![code.to_string()]
    }

    fn is_object_above(&self, at: Coordinate) -> bool {
        self.envelope.x > at.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorReading;

    #[test]
    fn envelope_must_be_inside() {
        assert!(EnvelopeWorld::new(5, Coordinate::new(6, 1)).is_err());
    }

    #[test]
    fn loads_envelope_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envelopes1.txt");
        std::fs::write(&path, "3,4\n").unwrap();
        let world = EnvelopeWorld::load(&path, 5).unwrap();
        assert_eq!(world.envelope(), Coordinate::new(3, 4));
        assert_eq!(world.position(), Coordinate::new(1, 1));
    }

    #[test]
    fn envelope_file_must_list_one_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envelopes.txt");

        std::fs::write(&path, "3,4 2,2").unwrap();
        let err = EnvelopeWorld::load(&path, 5).unwrap_err();
        assert!(matches!(
            err,
            crate::FinderError::Validation(ValidationError::InvalidConfig { .. })
        ));

        std::fs::write(&path, "  \n").unwrap();
        assert!(EnvelopeWorld::load(&path, 5).unwrap_err().is_validation());

        std::fs::write(&path, "9,9").unwrap();
        assert!(EnvelopeWorld::load(&path, 5).unwrap_err().is_validation());
    }

    #[test]
    fn missing_envelope_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EnvelopeWorld::load(dir.path().join("absent.txt"), 5).unwrap_err();
        assert!(matches!(err, crate::FinderError::Io(_)));
    }

    #[test]
    fn detector_reports_rings() {
        let world = EnvelopeWorld::new(7, Coordinate::new(4, 4)).unwrap();
        let read = |x, y| SensorReading::decode(&world.detect_at(Coordinate::new(x, y))).unwrap();
        assert_eq!(read(4, 4), SensorReading::single(SensorBand::Here));
        assert_eq!(read(5, 5), SensorReading::single(SensorBand::Adjacent));
        assert_eq!(read(6, 4), SensorReading::single(SensorBand::Near));
        assert_eq!(read(1, 4), SensorReading::single(SensorBand::Mid));
        assert_eq!(read(1, 1), SensorReading::single(SensorBand::Far)); // sqrt(18)
        let far = EnvelopeWorld::new(7, Coordinate::new(7, 7)).unwrap();
        assert!(SensorReading::decode(&far.detect_at(Coordinate::new(1, 1))).unwrap().is_none());
    }

    #[test]
    fn moves_inside_are_accepted() {
        let mut world = EnvelopeWorld::new(3, Coordinate::new(2, 3)).unwrap();
        let outcome = world.move_to(Coordinate::new(2, 3));
        assert!(outcome.moved);
        assert_eq!(outcome.object_here, Some(true));

        let outcome = world.move_to(Coordinate::new(4, 1));
        assert!(!outcome.moved);
        assert_eq!(outcome.position, Coordinate::new(2, 3));
    }

    #[test]
    fn oracle_compares_rows() {
        let world = EnvelopeWorld::new(7, Coordinate::new(2, 6)).unwrap();
        assert!(world.is_object_above(Coordinate::new(1, 1)));
        assert!(!world.is_object_above(Coordinate::new(2, 1)));
        assert!(!world.is_object_above(Coordinate::new(5, 7)));
    }
}
