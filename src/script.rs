//! Step scripts: the externally supplied sequence of cells to visit.
//!
//! A script is whitespace-separated `x,y` tokens, on any number of lines.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::error::{FinderError, FinderResult, ValidationError};

static STEP_TOKEN: OnceLock<Option<Regex>> = OnceLock::new();

fn step_token() -> FinderResult<&'static Regex> {
    STEP_TOKEN
        .get_or_init(|| Regex::new(r"^(\d+),(\d+)$").ok())
        .as_ref()
        .ok_or_else(|| FinderError::internal("step token pattern failed to compile"))
}

/// Parses one `x,y` token and checks it against a `dim`x`dim` world.
///
/// # Errors
/// [`ValidationError::MalformedStep`] for a token that is not `x,y`, or
/// [`ValidationError::CoordinateOutOfRange`] for a cell off the grid.
pub fn parse_coordinate(token: &str, dim: u32) -> FinderResult<Coordinate> {
    let token = token.trim();
    let malformed = || ValidationError::MalformedStep {
        token: token.to_string(),
    };
    let caps = step_token()?.captures(token).ok_or_else(malformed)?;
    let x: u32 = caps[1].parse().map_err(|_| malformed())?;
    let y: u32 = caps[2].parse().map_err(|_| malformed())?;
    Ok(Coordinate::checked(x, y, dim)?)
}

/// Ordered cells the agent visits, one per step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepScript {
    steps: Vec<Coordinate>,
}

impl StepScript {
    /// Script from already validated cells.
    #[must_use]
    pub fn new(steps: Vec<Coordinate>) -> Self {
        Self { steps }
    }

    /// Parses a script for a `dim`x`dim` world.
    ///
    /// # Errors
    /// [`ValidationError::MalformedStep`] for a token that is not `x,y`, and
    /// [`ValidationError::CoordinateOutOfRange`] for a cell outside the world.
    pub fn parse(text: &str, dim: u32) -> FinderResult<Self> {
        let steps = text
            .split_whitespace()
            .map(|token| parse_coordinate(token, dim))
            .collect::<FinderResult<Vec<_>>>()?;
        Ok(Self { steps })
    }

    /// Reads and parses a script file.
    ///
    /// # Errors
    /// [`FinderError::Io`] if the file cannot be read, otherwise as [`StepScript::parse`].
    pub fn load(path: impl AsRef<Path>, dim: u32) -> FinderResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, dim)
    }

    /// Keeps only the first `count` steps.
    #[must_use]
    pub fn truncated(mut self, count: usize) -> Self {
        self.steps.truncate(count);
        self
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true for an empty script.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step `index` (zero-based).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Coordinate> {
        self.steps.get(index).copied()
    }

    /// Steps in order.
    #[must_use]
    pub fn steps(&self) -> &[Coordinate] {
        &self.steps
    }
}
