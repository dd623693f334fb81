//! The agent's observable belief about every cell.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::{self, Coordinate};
use crate::error::ValidationError;

/// What the agent knows about one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    /// Still consistent with the evidence.
    #[default]
    Unknown,
    /// Proven not to hold the envelope.
    Excluded,
    /// The only cell left that can hold the envelope.
    Confirmed,
}

impl CellStatus {
    /// Rendering symbol.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Unknown => '?',
            Self::Excluded => 'X',
            Self::Confirmed => 'E',
        }
    }

    /// Parses a rendering symbol.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "?" => Some(Self::Unknown),
            "X" => Some(Self::Excluded),
            "E" => Some(Self::Confirmed),
            _ => None,
        }
    }
}

/// `dim`x`dim` grid of cell statuses.
///
/// Equality is cell-wise. Only the inference engine mutates a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefGrid {
    dim: u32,
    cells: Vec<CellStatus>,
}

impl BeliefGrid {
    /// All-unknown grid.
    #[must_use]
    pub fn new(dim: u32) -> Self {
        Self {
            dim,
            cells: vec![CellStatus::Unknown; (dim as usize) * (dim as usize)],
        }
    }

    /// World dimension.
    #[must_use]
    pub const fn dim(&self) -> u32 {
        self.dim
    }

    /// Status of `cell`, or `None` if it lies outside the grid.
    #[must_use]
    pub fn status(&self, cell: &Coordinate) -> Option<CellStatus> {
        self.index(cell).map(|i| self.cells[i])
    }

    /// Every cell with its status, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, CellStatus)> + '_ {
        coord::cells(self.dim).zip(self.cells.iter().copied())
    }

    /// Number of excluded cells.
    #[must_use]
    pub fn excluded_count(&self) -> usize {
        self.cells.iter().filter(|s| **s == CellStatus::Excluded).count()
    }

    /// Cells not excluded, row-major.
    #[must_use]
    pub fn remaining(&self) -> Vec<Coordinate> {
        self.iter()
            .filter(|(_, status)| *status != CellStatus::Excluded)
            .map(|(cell, _)| cell)
            .collect()
    }

    /// The confirmed cell, if the search converged.
    #[must_use]
    pub fn confirmed(&self) -> Option<Coordinate> {
        self.iter()
            .find(|(_, status)| *status == CellStatus::Confirmed)
            .map(|(cell, _)| cell)
    }

    pub(crate) fn set(&mut self, cell: &Coordinate, status: CellStatus) {
        if let Some(i) = self.index(cell) {
            self.cells[i] = status;
        }
    }

    /// Parses a rendered grid: `dim` lines, top row (`x = dim`) first, symbols
    /// separated by whitespace.
    ///
    /// # Errors
    /// [`ValidationError::MalformedGrid`] for a wrong row count, row width or symbol.
    pub fn parse(text: &str, dim: u32) -> Result<Self, ValidationError> {
        let rows: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        Self::from_rows(&rows, dim)
    }

    /// Parses blank-line-separated grids.
    ///
    /// # Errors
    /// Same as [`BeliefGrid::parse`], for any grid in the sequence.
    pub fn parse_sequence(text: &str, dim: u32) -> Result<Vec<Self>, ValidationError> {
        let mut grids = Vec::new();
        let mut block: Vec<&str> = Vec::new();
        for line in text.lines().map(str::trim) {
            if line.is_empty() {
                if !block.is_empty() {
                    grids.push(Self::from_rows(&block, dim)?);
                    block.clear();
                }
            } else {
                block.push(line);
            }
        }
        if !block.is_empty() {
            grids.push(Self::from_rows(&block, dim)?);
        }
        Ok(grids)
    }

    fn from_rows(rows: &[&str], dim: u32) -> Result<Self, ValidationError> {
        if rows.len() != dim as usize {
            return Err(ValidationError::MalformedGrid {
                reason: format!("expected {dim} rows, found {}", rows.len()),
            });
        }
        let mut grid = Self::new(dim);
        for (offset, row) in rows.iter().enumerate() {
            let x = dim - offset as u32;
            let symbols: Vec<&str> = row.split_whitespace().collect();
            if symbols.len() != dim as usize {
                return Err(ValidationError::MalformedGrid {
                    reason: format!("row {x}: expected {dim} cells, found {}", symbols.len()),
                });
            }
            for (col, symbol) in symbols.iter().enumerate() {
                let status = CellStatus::from_symbol(symbol).ok_or_else(|| ValidationError::MalformedGrid {
                    reason: format!("row {x}: unknown symbol '{symbol}'"),
                })?;
                grid.set(&Coordinate::new(x, col as u32 + 1), status);
            }
        }
        Ok(grid)
    }

    fn index(&self, cell: &Coordinate) -> Option<usize> {
        if !cell.within(self.dim) {
            return None;
        }
        Some(((cell.x - 1) * self.dim + (cell.y - 1)) as usize)
    }
}

impl fmt::Display for BeliefGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for x in (1..=self.dim).rev() {
            let row: Vec<String> = (1..=self.dim)
                .map(|y| {
                    self.status(&Coordinate::new(x, y))
                        .unwrap_or_default()
                        .symbol()
                        .to_string()
                })
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_unknown() {
        let grid = BeliefGrid::new(3);
        assert_eq!(grid.excluded_count(), 0);
        assert_eq!(grid.remaining().len(), 9);
        assert_eq!(grid.confirmed(), None);
        assert_eq!(grid.status(&Coordinate::new(4, 1)), None);
    }

    #[test]
    fn render_puts_top_row_first() {
        let mut grid = BeliefGrid::new(2);
        grid.set(&Coordinate::new(2, 1), CellStatus::Excluded);
        grid.set(&Coordinate::new(1, 2), CellStatus::Confirmed);
        assert_eq!(grid.to_string(), "X ?\n? E\n");
    }

    #[test]
    fn parse_reads_rendered_grid() {
        let mut grid = BeliefGrid::new(3);
        grid.set(&Coordinate::new(3, 3), CellStatus::Excluded);
        grid.set(&Coordinate::new(1, 1), CellStatus::Excluded);
        let parsed = BeliefGrid::parse(&grid.to_string(), 3).unwrap();
        assert_eq!(parsed, grid);
    }

    #[test]
    fn parse_sequence_splits_on_blank_lines() {
        let text = "? ?\n? ?\n\nX ?\n? ?\n\n";
        let grids = BeliefGrid::parse_sequence(text, 2).unwrap();
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0], BeliefGrid::new(2));
        assert_eq!(grids[1].status(&Coordinate::new(2, 1)), Some(CellStatus::Excluded));
    }

    #[test]
    fn parse_rejects_bad_shapes_and_symbols() {
        assert!(BeliefGrid::parse("? ?\n", 2).is_err());
        assert!(BeliefGrid::parse("? ?\n? ? ?\n", 2).is_err());
        assert!(BeliefGrid::parse("? ?\n? Z\n", 2).is_err());
    }

    #[test]
    fn equality_is_cell_wise() {
        let mut a = BeliefGrid::new(2);
        let b = BeliefGrid::new(2);
        assert_eq!(a, b);
        a.set(&Coordinate::new(1, 1), CellStatus::Excluded);
        assert_ne!(a, b);
    }
}
