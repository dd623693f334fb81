//! Sensor vocabulary: proximity bands, decoded readings, directional hints.
//!
//! The detector reports the ring the envelope lies in, measured as the floor of
//! the Euclidean distance between the reading cell and the envelope:
//!
//! | code | band       | ring |
//! |------|------------|------|
//! | `1`  | `Here`     | 0    |
//! | `2`  | `Adjacent` | 1    |
//! | `3`  | `Near`     | 2    |
//! | `4`  | `Mid`      | 3    |
//! | `5`  | `Far`      | 4    |
//! | `0`  | none       | ≥ 5  |
//!
//! Raw codes are decoded exactly once, at the boundary, by
//! [`SensorReading::decode`]. The simulator, the evidence encoder and the static
//! sensor implications all share [`SensorBand::matches`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::error::ExecutionError;

/// Raw code for "nothing within detector range".
pub const NONE_CODE: &str = "0";

/// One of the five proximity bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorBand {
    /// The envelope is in the reading cell.
    Here,
    /// Ring 1 (orthogonal and diagonal neighbours).
    Adjacent,
    /// Ring 2.
    Near,
    /// Ring 3.
    Mid,
    /// Ring 4, the edge of detector range.
    Far,
}

impl SensorBand {
    /// All bands, in code order.
    pub const ALL: [Self; 5] = [Self::Here, Self::Adjacent, Self::Near, Self::Mid, Self::Far];

    /// Zero-based position of the band, used to pick its variable range.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Here => 0,
            Self::Adjacent => 1,
            Self::Near => 2,
            Self::Mid => 3,
            Self::Far => 4,
        }
    }

    /// Ring distance covered by this band.
    #[must_use]
    pub const fn ring(self) -> u32 {
        // Ring equals the index for the ring-distance geometry.
        self.index() as u32
    }

    /// Wire code of this band.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Here => "1",
            Self::Adjacent => "2",
            Self::Near => "3",
            Self::Mid => "4",
            Self::Far => "5",
        }
    }

    /// Decodes a single band code. `"0"` is not a band and is rejected here.
    ///
    /// # Errors
    /// [`ExecutionError::DecodeMismatch`] for any code outside `"1"`..`"5"`.
    pub fn from_code(code: &str) -> Result<Self, ExecutionError> {
        Self::ALL
            .into_iter()
            .find(|band| band.code() == code.trim())
            .ok_or_else(|| ExecutionError::DecodeMismatch {
                code: code.to_string(),
            })
    }

    /// Band reported for a ring distance, if within detector range.
    #[must_use]
    pub fn for_ring(ring: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|band| band.ring() == ring)
    }

    /// Returns true if an envelope at `cell` produces this band when read at `reading`.
    #[must_use]
    pub fn matches(self, reading: &Coordinate, cell: &Coordinate) -> bool {
        reading.ring_distance(cell) == self.ring()
    }
}

impl fmt::Display for SensorBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Here => "here",
            Self::Adjacent => "adjacent",
            Self::Near => "near",
            Self::Mid => "mid",
            Self::Far => "far",
        };
        f.write_str(name)
    }
}

/// A decoded sensor reading: the set of active bands. Empty means "none".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    active: Vec<SensorBand>,
}

impl SensorReading {
    /// Reading with nothing in detector range.
    #[must_use]
    pub const fn none() -> Self {
        Self { active: Vec::new() }
    }

    /// Reading with a single active band.
    #[must_use]
    pub fn single(band: SensorBand) -> Self {
        Self { active: vec![band] }
    }

    /// Reading with several simultaneously active bands.
    #[must_use]
    pub fn from_bands(bands: impl IntoIterator<Item = SensorBand>) -> Self {
        let mut active: Vec<SensorBand> = bands.into_iter().collect();
        active.sort_unstable();
        active.dedup();
        Self { active }
    }

    /// Decodes raw sensor codes.
    ///
    /// `"0"` must appear alone.
    ///
    /// # Errors
    /// [`ExecutionError::DecodeMismatch`] for an empty answer, a code outside
    /// the band table, or `"0"` mixed with bands.
    pub fn decode<S: AsRef<str>>(codes: &[S]) -> Result<Self, ExecutionError> {
        if codes.is_empty() {
            return Err(ExecutionError::DecodeMismatch { code: String::new() });
        }
        let mut bands = Vec::with_capacity(codes.len());
        let mut saw_none = false;
        for code in codes {
            let code = code.as_ref().trim();
            if code == NONE_CODE {
                saw_none = true;
            } else {
                bands.push(SensorBand::from_code(code)?);
            }
        }
        if saw_none && !bands.is_empty() {
            return Err(ExecutionError::DecodeMismatch {
                code: codes
                    .iter()
                    .map(|c| c.as_ref().trim())
                    .collect::<Vec<_>>()
                    .join(","),
            });
        }
        Ok(Self::from_bands(bands))
    }

    /// Active bands, sorted.
    #[must_use]
    pub fn active(&self) -> &[SensorBand] {
        &self.active
    }

    /// Returns true if `band` is active.
    #[must_use]
    pub fn is_active(&self, band: SensorBand) -> bool {
        self.active.contains(&band)
    }

    /// Returns true if nothing was in detector range.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.active.is_empty()
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.active.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<String> = self.active.iter().map(ToString::to_string).collect();
        f.write_str(&names.join("+"))
    }
}

/// Side of a grid line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Rows strictly greater than the line.
    Above,
    /// Rows strictly smaller than the line.
    Below,
    /// Columns strictly smaller than the line.
    LeftOf,
    /// Columns strictly greater than the line.
    RightOf,
}

/// Answer of the directional oracle: the envelope lies on `direction` of `line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectionalHint {
    /// Which side of the line holds the envelope.
    pub direction: Direction,
    /// Row (for `Above`/`Below`) or column (for `LeftOf`/`RightOf`).
    pub line: u32,
}

impl DirectionalHint {
    /// Envelope is in a row above `row`.
    #[must_use]
    pub const fn above(row: u32) -> Self {
        Self { direction: Direction::Above, line: row }
    }

    /// Envelope is in a row below `row`.
    #[must_use]
    pub const fn below(row: u32) -> Self {
        Self { direction: Direction::Below, line: row }
    }

    /// Envelope is in a column left of `column`.
    #[must_use]
    pub const fn left_of(column: u32) -> Self {
        Self { direction: Direction::LeftOf, line: column }
    }

    /// Envelope is in a column right of `column`.
    #[must_use]
    pub const fn right_of(column: u32) -> Self {
        Self { direction: Direction::RightOf, line: column }
    }

    /// Returns true if an envelope at `cell` is consistent with the hint.
    #[must_use]
    pub const fn admits(&self, cell: &Coordinate) -> bool {
        match self.direction {
            Direction::Above => cell.x > self.line,
            Direction::Below => cell.x < self.line,
            Direction::LeftOf => cell.y < self.line,
            Direction::RightOf => cell.y > self.line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_the_table() {
        for band in SensorBand::ALL {
            assert_eq!(SensorBand::from_code(band.code()).unwrap(), band);
            assert_eq!(SensorBand::for_ring(band.ring()), Some(band));
        }
        assert_eq!(SensorBand::for_ring(5), None);
    }

    #[test]
    fn decode_single_band() {
        let reading = SensorReading::decode(&["3"]).unwrap();
        assert_eq!(reading.active(), &[SensorBand::Near]);
        assert!(!reading.is_none());
    }

    #[test]
    fn decode_none() {
        assert!(SensorReading::decode(&["0"]).unwrap().is_none());
    }

    #[test]
    fn decode_empty_answer_is_mismatch() {
        let empty: [&str; 0] = [];
        let err = SensorReading::decode(&empty).unwrap_err();
        assert!(matches!(err, ExecutionError::DecodeMismatch { ref code } if code.is_empty()));
    }

    #[test]
    fn decode_multiple_bands_sorted_and_deduped() {
        let reading = SensorReading::decode(&["4", "2", "4"]).unwrap();
        assert_eq!(reading.active(), &[SensorBand::Adjacent, SensorBand::Mid]);
    }

    #[test]
    fn decode_rejects_unknown_codes() {
        let err = SensorReading::decode(&["7"]).unwrap_err();
        assert!(matches!(err, ExecutionError::DecodeMismatch { code } if code == "7"));
        assert!(SensorReading::decode(&["here"]).is_err());
    }

    #[test]
    fn decode_rejects_none_mixed_with_bands() {
        assert!(SensorReading::decode(&["0", "1"]).is_err());
    }

    #[test]
    fn band_geometry() {
        let at = Coordinate::new(2, 2);
        assert!(SensorBand::Here.matches(&at, &Coordinate::new(2, 2)));
        assert!(SensorBand::Adjacent.matches(&at, &Coordinate::new(3, 3)));
        assert!(SensorBand::Near.matches(&at, &Coordinate::new(4, 4)));
        assert!(SensorBand::Mid.matches(&at, &Coordinate::new(5, 2)));
        assert!(!SensorBand::Here.matches(&at, &Coordinate::new(1, 1)));
    }

    #[test]
    fn hint_sides() {
        let below = DirectionalHint::below(4);
        assert!(below.admits(&Coordinate::new(3, 7)));
        assert!(!below.admits(&Coordinate::new(4, 1)));
        let right = DirectionalHint::right_of(2);
        assert!(right.admits(&Coordinate::new(1, 3)));
        assert!(!right.admits(&Coordinate::new(1, 2)));
    }

    #[test]
    fn display() {
        assert_eq!(SensorReading::none().to_string(), "none");
        let r = SensorReading::from_bands([SensorBand::Far, SensorBand::Here]);
        assert_eq!(r.to_string(), "here+far");
    }
}
