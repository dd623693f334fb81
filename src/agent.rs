//! The envelope finder agent.
//!
//! Owns the formula and the belief grid and runs one step per scripted cell:
//!
//! 1. commit the previous step's exclusions as past-frame facts;
//! 2. move to the next cell (a refused move is fatal);
//! 3. read the detector and decode the reading;
//! 4. encode the reading, the presence flag and the oracle answer, as configured;
//! 5. run the per-cell inference and apply its verdicts.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clause::ClauseSet;
use crate::config::FinderConfig;
use crate::coord::Coordinate;
use crate::error::{ExecutionError, FinderError, FinderResult};
use crate::evidence::EvidenceEncoder;
use crate::formula::{FormulaStats, StaticFormulaBuilder};
use crate::grid::BeliefGrid;
use crate::inference::InferenceEngine;
use crate::layout::VariableLayout;
use crate::rollover::TemporalRollover;
use crate::script::StepScript;
use crate::sensor::{DirectionalHint, SensorReading};
use crate::solver::{QueryPool, SatBackend, SplrBackend};
use crate::world::Environment;

/// Unique identifier for one run of the finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new random run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What one step observed and concluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Step number, starting at 1.
    pub step: usize,
    /// Cell the agent read from.
    pub position: Coordinate,
    /// Decoded detector reading.
    pub reading: SensorReading,
    /// Oracle answer, when asked.
    pub hint: Option<DirectionalHint>,
    /// Cells excluded for the first time in this step, row-major.
    pub newly_excluded: Vec<Coordinate>,
    /// The confirmed cell, once the search converged.
    pub confirmed: Option<Coordinate>,
    /// Cells still consistent with the evidence.
    pub remaining: usize,
    /// Per-cell queries that needed the solver.
    pub solver_queries: usize,
    /// When the step finished.
    pub completed_at: DateTime<Utc>,
}

/// Knowledge-tracking agent searching for the envelope.
pub struct EnvelopeFinder<E> {
    run_id: RunId,
    config: FinderConfig,
    layout: VariableLayout,
    clauses: ClauseSet,
    engine: InferenceEngine<QueryPool>,
    rollover: TemporalRollover,
    grid: BeliefGrid,
    script: StepScript,
    next_step: usize,
    position: Option<Coordinate>,
    environment: E,
}

impl<E> fmt::Debug for EnvelopeFinder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeFinder")
            .field("run_id", &self.run_id)
            .field("dim", &self.layout.dim())
            .field("clauses", &self.clauses)
            .field("steps", &self.script.len())
            .field("next_step", &self.next_step)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl<E: Environment> EnvelopeFinder<E> {
    /// Creates an agent deciding queries with `splr`.
    ///
    /// # Errors
    /// A validation error for an invalid configuration, or a contradiction if
    /// the static rules are unsatisfiable.
    pub fn new(config: FinderConfig, environment: E) -> FinderResult<Self> {
        Self::with_backend(config, environment, Arc::new(SplrBackend))
    }

    /// Creates an agent deciding queries with `backend`.
    ///
    /// # Errors
    /// Same as [`EnvelopeFinder::new`], plus [`ExecutionError::WorkerUnavailable`]
    /// if the query workers cannot be started.
    pub fn with_backend(config: FinderConfig, environment: E, backend: Arc<dyn SatBackend>) -> FinderResult<Self> {
        let config = config.validate()?;
        let layout = VariableLayout::new(config.world_dim)?;
        let run_id = RunId::new();

        let mut clauses = ClauseSet::new(Arc::clone(&backend));
        let stats: FormulaStats = StaticFormulaBuilder::new(&layout)
            .with_initial_exclusions(&config.initial_exclusions)
            .build(&mut clauses)?;

        let pool = QueryPool::start(backend, config.pool_config())?;
        if !pool.solve_one(&clauses.snapshot(), Vec::new())? {
            return Err(FinderError::contradiction("static formula is unsatisfiable"));
        }

        tracing::info!(
            %run_id,
            dim = layout.dim(),
            variables = layout.total_variables(),
            clauses = stats.total(),
            workers = pool.worker_count(),
            "envelope finder started"
        );

        Ok(Self {
            run_id,
            grid: BeliefGrid::new(layout.dim()),
            config,
            layout,
            clauses,
            engine: InferenceEngine::new(pool),
            rollover: TemporalRollover::new(),
            script: StepScript::default(),
            next_step: 0,
            position: None,
            environment,
        })
    }

    /// Replaces the step script and rewinds to its first step.
    ///
    /// # Errors
    /// A validation error if a step lies outside the world.
    pub fn load_steps(&mut self, script: StepScript) -> FinderResult<()> {
        for step in script.steps() {
            step.validate(self.layout.dim())?;
        }
        tracing::debug!(steps = script.len(), "step script loaded");
        self.script = script;
        self.next_step = 0;
        Ok(())
    }

    /// Performs the next scripted step.
    ///
    /// # Errors
    /// - [`ExecutionError::ScriptExhausted`] when every step has been run.
    /// - [`ExecutionError::MoveRejected`] when the world refuses the move.
    /// - [`ExecutionError::DecodeMismatch`] for an unknown detector code.
    /// - [`ExecutionError::Contradiction`] when the evidence is inconsistent.
    /// - [`ExecutionError::Timeout`] when a query exceeds its ceiling; the
    ///   grid is left as it was before the step.
    pub fn run_next_step(&mut self) -> FinderResult<StepReport> {
        let Some(target) = self.script.get(self.next_step) else {
            return Err(ExecutionError::ScriptExhausted {
                total: self.script.len(),
            }
            .into());
        };
        let step = self.next_step + 1;
        let span = tracing::info_span!("step", run_id = %self.run_id, step, %target);
        let _guard = span.enter();

        let result = self.perform_step(step, target);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "step aborted");
        }
        result
    }

    /// Runs every remaining step, stopping at the first error.
    ///
    /// # Errors
    /// The first error returned by [`EnvelopeFinder::run_next_step`].
    pub fn run_all(&mut self) -> FinderResult<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(self.script.len().saturating_sub(self.next_step));
        while self.next_step < self.script.len() {
            reports.push(self.run_next_step()?);
        }
        Ok(reports)
    }

    /// Commits exclusions proven by the last step without taking another step.
    ///
    /// Returns the number of past-frame facts added; a second call adds none.
    ///
    /// # Errors
    /// [`ExecutionError::Contradiction`] if a fact contradicts the formula.
    pub fn flush_rollover(&mut self) -> FinderResult<usize> {
        self.rollover.commit(&self.layout, &mut self.clauses)
    }

    fn perform_step(&mut self, step: usize, target: Coordinate) -> FinderResult<StepReport> {
        self.rollover.commit(&self.layout, &mut self.clauses)?;

        let moved = self.environment.move_to(target);
        if !moved.moved {
            return Err(ExecutionError::MoveRejected {
                x: target.x,
                y: target.y,
            }
            .into());
        }
        self.next_step = step;
        let at = moved.position;
        self.position = Some(at);

        let reading = SensorReading::decode(&self.environment.detect_at(at))?;
        let encoder = EvidenceEncoder::new(&self.layout);
        encoder.encode_reading(&mut self.clauses, at, &reading)?;

        if self.config.use_presence_flag {
            if let Some(present) = moved.object_here {
                encoder.encode_presence(&mut self.clauses, at, present)?;
            }
        }

        let hint = if self.config.ask_direction_oracle {
            self.oracle_hint(at)
        } else {
            None
        };
        if let Some(hint) = hint {
            encoder.encode_hint(&mut self.clauses, hint)?;
        }

        let outcome = self.engine.infer(&self.layout, &self.clauses)?;
        let applied = self.engine.apply(&outcome, &mut self.grid, &mut self.rollover);

        let report = StepReport {
            step,
            position: at,
            reading,
            hint,
            newly_excluded: applied.newly_excluded,
            confirmed: applied.confirmed,
            remaining: self.grid.remaining().len(),
            solver_queries: outcome.solver_queries,
            completed_at: Utc::now(),
        };
        tracing::info!(
            reading = %report.reading,
            newly_excluded = report.newly_excluded.len(),
            remaining = report.remaining,
            clauses = self.clauses.len(),
            "step completed"
        );
        Ok(report)
    }

    /// Turns the row oracle's yes/no into a hint. "Not above" on the top row says nothing.
    fn oracle_hint(&self, at: Coordinate) -> Option<DirectionalHint> {
        if self.environment.is_object_above(at) {
            Some(DirectionalHint::above(at.x))
        } else if at.x < self.layout.dim() {
            Some(DirectionalHint::below(at.x + 1))
        } else {
            None
        }
    }

    /// Current belief grid.
    #[must_use]
    pub const fn state(&self) -> &BeliefGrid {
        &self.grid
    }

    /// Where the agent is, once it has moved.
    #[must_use]
    pub const fn position(&self) -> Option<Coordinate> {
        self.position
    }

    /// Variable layout of this run.
    #[must_use]
    pub const fn layout(&self) -> &VariableLayout {
        &self.layout
    }

    /// Identifier of this run.
    #[must_use]
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Accumulated formula.
    #[must_use]
    pub const fn formula(&self) -> &ClauseSet {
        &self.clauses
    }

    /// Past-frame bookkeeping.
    #[must_use]
    pub const fn rollover(&self) -> &TemporalRollover {
        &self.rollover
    }

    /// Steps performed so far.
    #[must_use]
    pub const fn steps_taken(&self) -> usize {
        self.next_step
    }

    /// Steps left in the script.
    #[must_use]
    pub fn steps_remaining(&self) -> usize {
        self.script.len().saturating_sub(self.next_step)
    }

    /// The world the agent talks to.
    #[must_use]
    pub const fn environment(&self) -> &E {
        &self.environment
    }
}
