use std::sync::Arc;
use std::thread;
use std::time::Duration;

use envelope_finder::{
    BeliefGrid, CellStatus, ClauseSet, Coordinate, DirectionalHint, EnvelopeFinder, EnvelopeWorld, Environment,
    EvidenceEncoder, ExecutionError, FinderConfig, FinderError, FormulaSnapshot, InferenceEngine, Literal, QueryPool,
    QueryPoolConfig, SatBackend, SensorReading, SplrBackend, StaticFormulaBuilder, StepScript, TemporalRollover,
    VariableLayout,
};

fn finder(dim: u32, envelope: Coordinate, config: FinderConfig) -> EnvelopeFinder<EnvelopeWorld> {
    let world = EnvelopeWorld::new(dim, envelope).unwrap();
    EnvelopeFinder::new(FinderConfig { world_dim: dim, ..config }, world).unwrap()
}

fn without_presence() -> FinderConfig {
    FinderConfig {
        use_presence_flag: false,
        ..FinderConfig::default()
    }
}

#[test]
fn same_cell_reading_confirms_envelope_in_5x5() {
    let mut finder = finder(5, Coordinate::new(2, 2), without_presence());
    finder.load_steps(StepScript::parse("2,2", 5).unwrap()).unwrap();
    let report = finder.run_next_step().unwrap();

    let expected = BeliefGrid::parse(
        "X X X X X\n\
         X X X X X\n\
         X X X X X\n\
         X E X X X\n\
         X X X X X\n",
        5,
    )
    .unwrap();
    assert_eq!(finder.state(), &expected);
    assert_eq!(report.confirmed, Some(Coordinate::new(2, 2)));
    assert_eq!(report.newly_excluded.len(), 24);
}

#[test]
fn below_row_hint_excludes_upper_rows_in_7x7() {
    let layout = VariableLayout::new(7).unwrap();
    let mut clauses = ClauseSet::new(Arc::new(SplrBackend));
    StaticFormulaBuilder::new(&layout).build(&mut clauses).unwrap();
    EvidenceEncoder::new(&layout)
        .encode_hint(&mut clauses, DirectionalHint::below(4))
        .unwrap();

    let pool = QueryPool::start(Arc::new(SplrBackend), QueryPoolConfig::default()).unwrap();
    let outcome = InferenceEngine::new(pool).infer(&layout, &clauses).unwrap();
    for verdict in &outcome.verdicts {
        assert_eq!(verdict.satisfiable, verdict.cell.x < 4, "{}", verdict.cell);
    }
}

#[test]
fn oracle_answer_reaches_the_grid() {
    let config = FinderConfig {
        ask_direction_oracle: true,
        ..without_presence()
    };
    let mut finder = finder(7, Coordinate::new(1, 5), config);
    finder.load_steps(StepScript::parse("3,7", 7).unwrap()).unwrap();
    let report = finder.run_next_step().unwrap();
    assert_eq!(report.hint, Some(DirectionalHint::below(4)));
    for (cell, status) in finder.state().iter() {
        if cell.x >= 4 {
            assert_eq!(status, CellStatus::Excluded, "{cell}");
        }
    }
    assert_eq!(finder.state().status(&Coordinate::new(1, 5)), Some(CellStatus::Unknown));
}

#[test]
fn three_readings_pin_down_the_envelope() {
    let envelope = Coordinate::new(5, 2);
    let mut finder = finder(7, envelope, without_presence());
    finder.load_steps(StepScript::parse("4,2 6,2 5,4", 7).unwrap()).unwrap();
    let reports = finder.run_all().unwrap();

    let remaining: Vec<usize> = reports.iter().map(|r| r.remaining).collect();
    assert_eq!(remaining, vec![8, 3, 1]);
    assert_eq!(reports[2].confirmed, Some(envelope));
    assert_eq!(finder.state().confirmed(), Some(envelope));
}

#[test]
fn knowledge_only_grows_and_never_loses_the_envelope() {
    let envelope = Coordinate::new(3, 6);
    let mut finder = finder(7, envelope, without_presence());
    finder
        .load_steps(StepScript::parse("1,1 7,7 1,7 4,4 7,1 3,3", 7).unwrap())
        .unwrap();

    let mut previous = finder.state().clone();
    while finder.steps_remaining() > 0 {
        finder.run_next_step().unwrap();
        let current = finder.state();
        for (cell, status) in previous.iter() {
            if status == CellStatus::Excluded {
                assert_eq!(current.status(&cell), Some(CellStatus::Excluded), "{cell} regressed");
            }
        }
        assert_ne!(current.status(&envelope), Some(CellStatus::Excluded));
        assert!(current.excluded_count() >= previous.excluded_count());
        previous = current.clone();
    }
}

#[test]
fn stepping_on_the_envelope_confirms_it() {
    let envelope = Coordinate::new(4, 4);
    let mut finder = finder(6, envelope, FinderConfig::default());
    finder.load_steps(StepScript::parse("1,1 2,2 4,4", 6).unwrap()).unwrap();
    let reports = finder.run_all().unwrap();
    assert_eq!(reports.last().and_then(|r| r.confirmed), Some(envelope));
}

#[test]
fn rollover_is_idempotent_after_a_run() {
    let mut finder = finder(5, Coordinate::new(4, 1), without_presence());
    finder.load_steps(StepScript::parse("1,1 3,3", 5).unwrap()).unwrap();
    finder.run_all().unwrap();

    let flushed = finder.flush_rollover().unwrap();
    assert!(flushed > 0);
    let fingerprint = finder.formula().fingerprint();
    let clauses = finder.formula().len();

    assert_eq!(finder.flush_rollover().unwrap(), 0);
    assert_eq!(finder.formula().fingerprint(), fingerprint);
    assert_eq!(finder.formula().len(), clauses);
    for (cell, status) in finder.state().iter() {
        assert_eq!(status == CellStatus::Excluded, finder.rollover().is_committed(&cell), "{cell}");
    }
}

#[test]
fn rollover_replay_leaves_the_grid_unchanged() {
    let world = EnvelopeWorld::new(5, Coordinate::new(4, 1)).unwrap();
    let layout = VariableLayout::new(5).unwrap();
    let mut clauses = ClauseSet::new(Arc::new(SplrBackend));
    StaticFormulaBuilder::new(&layout).build(&mut clauses).unwrap();
    let encoder = EvidenceEncoder::new(&layout);
    let engine = InferenceEngine::new(QueryPool::start(Arc::new(SplrBackend), QueryPoolConfig::default()).unwrap());
    let mut grid = BeliefGrid::new(5);
    let mut rollover = TemporalRollover::new();

    for at in [Coordinate::new(1, 1), Coordinate::new(3, 3)] {
        rollover.commit(&layout, &mut clauses).unwrap();
        let reading = SensorReading::decode(&world.detect_at(at)).unwrap();
        encoder.encode_reading(&mut clauses, at, &reading).unwrap();
        let outcome = engine.infer(&layout, &clauses).unwrap();
        engine.apply(&outcome, &mut grid, &mut rollover);
    }
    let settled = grid.clone();
    assert!(settled.excluded_count() > 0);

    let rescan = |clauses: &ClauseSet, grid: &mut BeliefGrid, rollover: &mut TemporalRollover| {
        let outcome = engine.infer(&layout, clauses).unwrap();
        let applied = engine.apply(&outcome, grid, rollover);
        assert!(applied.newly_excluded.is_empty());
    };

    assert!(rollover.commit(&layout, &mut clauses).unwrap() > 0);
    rescan(&clauses, &mut grid, &mut rollover);
    assert_eq!(grid, settled, "\n{grid}");

    assert_eq!(rollover.replay(&layout, &mut clauses).unwrap(), 0);
    rescan(&clauses, &mut grid, &mut rollover);
    assert_eq!(grid, settled, "\n{grid}");

    assert_eq!(rollover.commit(&layout, &mut clauses).unwrap(), 0);
    rescan(&clauses, &mut grid, &mut rollover);
    for (cell, status) in settled.iter() {
        assert_eq!(grid.status(&cell), Some(status), "{cell}");
    }
}

/// Answers the static check immediately and stalls on every per-cell query.
struct StallingBackend;

impl SatBackend for StallingBackend {
    fn name(&self) -> &'static str {
        "stalling"
    }

    fn solve(&self, formula: &FormulaSnapshot, assumptions: &[Literal]) -> Result<bool, ExecutionError> {
        if !assumptions.is_empty() {
            thread::sleep(Duration::from_millis(400));
        }
        SplrBackend.solve(formula, assumptions)
    }
}

#[test]
fn timeout_aborts_step_without_touching_the_grid() {
    let world = EnvelopeWorld::new(4, Coordinate::new(2, 2)).unwrap();
    let config = FinderConfig {
        world_dim: 4,
        query_timeout_ms: 30,
        ..without_presence()
    };
    let mut finder = EnvelopeFinder::with_backend(config, world, Arc::new(StallingBackend)).unwrap();
    finder.load_steps(StepScript::parse("1,1", 4).unwrap()).unwrap();

    let err = finder.run_next_step().unwrap_err();
    assert!(err.is_timeout(), "{err}");
    assert_eq!(finder.state(), &BeliefGrid::new(4));
    assert!(finder.rollover().pending().is_empty());
}

#[test]
fn exhausted_script_is_reported() {
    let mut finder = finder(3, Coordinate::new(1, 1), FinderConfig::default());
    let err = finder.run_next_step().unwrap_err();
    assert!(matches!(
        err,
        FinderError::Execution(ExecutionError::ScriptExhausted { total: 0 })
    ));
}
