//! # envelope-finder
//!
//! A knowledge-tracking agent that explores a square grid and deduces where a
//! hidden envelope can no longer be, from proximity sensor readings.
//!
//! ## Core Concepts
//!
//! - **VariableLayout**: immutable mapping between cells and propositional
//!   variables, split into a past frame, a future frame and five sensor bands
//! - **ClauseSet**: the monotonically growing formula, decided by a SAT backend
//! - **StaticFormulaBuilder**: the time-invariant rules of the world
//! - **EvidenceEncoder**: per-step readings, presence flags and oracle hints
//! - **InferenceEngine**: one satisfiability query per cell; unsatisfiable
//!   cells are excluded
//! - **TemporalRollover**: carries this step's exclusions into the next step's
//!   past frame
//! - **BeliefGrid**: what the agent knows about every cell
//!
//! ## Usage
//!
//! ```rust,ignore
//! use envelope_finder::{Coordinate, EnvelopeFinder, EnvelopeWorld, FinderConfig, StepScript};
//!
//! let world = EnvelopeWorld::new(5, Coordinate::new(2, 2))?;
//! let mut finder = EnvelopeFinder::new(FinderConfig::for_world(5), world)?;
//! finder.load_steps(StepScript::parse("1,1 2,2", 5)?)?;
//! for report in finder.run_all()? {
//!     println!("step {}: {} cells left", report.step, report.remaining);
//! }
//! print!("{}", finder.state());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Vocabulary
pub mod coord;
pub mod error;
pub mod sensor;

// Encoding
pub mod clause;
pub mod evidence;
pub mod formula;
pub mod layout;
pub mod solver;

// Inference and state
pub mod grid;
pub mod inference;
pub mod rollover;

// Agent and its surroundings
pub mod agent;
pub mod config;
pub mod script;
pub mod world;

pub use agent::{EnvelopeFinder, RunId, StepReport};
pub use clause::{Clause, ClauseSet, FormulaSnapshot, Literal};
pub use config::FinderConfig;
pub use coord::Coordinate;
pub use error::{ExecutionError, FinderError, FinderResult, ValidationError};
pub use evidence::EvidenceEncoder;
pub use formula::{FormulaStats, StaticFormulaBuilder};
pub use grid::{BeliefGrid, CellStatus};
pub use inference::{AppliedInference, CellScan, CellVerdict, InferenceEngine, InferenceOutcome};
pub use layout::{Frame, VariableId, VariableLayout, VariableRange, MAX_WORLD_DIM};
pub use rollover::TemporalRollover;
pub use script::{parse_coordinate, StepScript};
pub use sensor::{Direction, DirectionalHint, SensorBand, SensorReading};
pub use solver::{QueryPool, QueryPoolConfig, SatBackend, SplrBackend};
pub use world::{EnvelopeWorld, Environment, MoveOutcome};
