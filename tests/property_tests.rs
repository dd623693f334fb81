//! Property-based tests for the encoding and inference
//!
//! Every verdict of the per-cell scan is checked against a brute-force
//! enumeration of the cells consistent with the same readings.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;

use envelope_finder::{
    BeliefGrid, CellStatus, ClauseSet, Coordinate, EnvelopeFinder, EnvelopeWorld, Environment, EvidenceEncoder,
    FinderConfig, InferenceEngine, QueryPool, QueryPoolConfig, SensorBand, SensorReading, SplrBackend,
    StaticFormulaBuilder, StepScript, VariableLayout,
};

// ============================================================================
// Helper functions
// ============================================================================

fn cell(dim: u32) -> impl Strategy<Value = Coordinate> {
    (1..=dim, 1..=dim).prop_map(|(x, y)| Coordinate::new(x, y))
}

/// World dimension, envelope and up to three reading cells.
fn scenario() -> impl Strategy<Value = (u32, Coordinate, Vec<Coordinate>)> {
    (3u32..=6).prop_flat_map(|dim| (Just(dim), cell(dim), prop::collection::vec(cell(dim), 1..=3)))
}

/// Cells whose readings would all match the envelope's.
fn brute_force(dim: u32, envelope: Coordinate, readings: &[Coordinate]) -> BTreeSet<Coordinate> {
    let band = |from: &Coordinate, to: &Coordinate| SensorBand::for_ring(from.ring_distance(to));
    envelope_finder::coord::cells(dim)
        .filter(|candidate| readings.iter().all(|r| band(r, candidate) == band(r, &envelope)))
        .collect()
}

fn sat_candidates(dim: u32, envelope: Coordinate, readings: &[Coordinate]) -> BTreeSet<Coordinate> {
    let world = EnvelopeWorld::new(dim, envelope).unwrap();
    let layout = VariableLayout::new(dim).unwrap();
    let mut clauses = ClauseSet::new(Arc::new(SplrBackend));
    StaticFormulaBuilder::new(&layout).build(&mut clauses).unwrap();

    let encoder = EvidenceEncoder::new(&layout);
    for at in readings {
        let reading = SensorReading::decode(&world.detect_at(*at)).unwrap();
        encoder.encode_reading(&mut clauses, *at, &reading).unwrap();
    }

    let pool = QueryPool::start(
        Arc::new(SplrBackend),
        QueryPoolConfig {
            workers: 2,
            ..QueryPoolConfig::default()
        },
    )
    .unwrap();
    InferenceEngine::new(pool)
        .infer(&layout, &clauses)
        .unwrap()
        .verdicts
        .into_iter()
        .filter(|v| v.satisfiable)
        .map(|v| v.cell)
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn sat_verdicts_match_brute_force((dim, envelope, readings) in scenario()) {
        let expected = brute_force(dim, envelope, &readings);
        let actual = sat_candidates(dim, envelope, &readings);
        prop_assert!(actual.contains(&envelope));
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn agent_never_excludes_the_envelope((dim, envelope, steps) in scenario()) {
        let world = EnvelopeWorld::new(dim, envelope).unwrap();
        let mut finder = EnvelopeFinder::new(FinderConfig::for_world(dim), world).unwrap();
        finder.load_steps(StepScript::new(steps)).unwrap();

        let mut excluded = 0;
        for report in finder.run_all().unwrap() {
            prop_assert!(!report.newly_excluded.contains(&envelope));
            prop_assert!(report.remaining >= 1);
            let now = finder.state().excluded_count();
            prop_assert!(now >= excluded);
            excluded = now;
        }
        prop_assert_ne!(finder.state().status(&envelope), Some(CellStatus::Excluded));
    }

    #[test]
    fn rendered_grids_parse_back(dim in 1u32..=8, marks in prop::collection::vec(0u8..3, 64)) {
        let mut text = String::new();
        for x in (1..=dim).rev() {
            let row: Vec<&str> = (1..=dim)
                .map(|y| match marks[((x - 1) * dim + (y - 1)) as usize % marks.len()] {
                    0 => "?",
                    1 => "X",
                    _ => "E",
                })
                .collect();
            text.push_str(&row.join(" "));
            text.push('\n');
        }
        let grid = BeliefGrid::parse(&text, dim).unwrap();
        prop_assert_eq!(grid.to_string(), text);
    }
}
