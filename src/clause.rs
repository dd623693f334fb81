//! CNF clauses and the accumulated formula.
//!
//! [`ClauseSet`] is the single mutable formula of a run. It only grows:
//! clauses are appended, never removed, and exact duplicates are skipped.
//! It keeps two cheap indexes next to the clause list:
//!
//! - the unit facts asserted so far, used to reject clauses that immediately
//!   contradict them;
//! - the binary implications, used by [`ClauseSet::refutes`] to answer most
//!   per-cell queries without calling the solver backend.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::ExecutionError;
use crate::layout::VariableId;
use crate::solver::SatBackend;

/// A variable or its negation, in solver (DIMACS) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(i32);

impl Literal {
    /// The variable itself.
    #[must_use]
    pub fn positive(var: VariableId) -> Self {
        Self(Self::signed(var))
    }

    /// The negation of the variable.
    #[must_use]
    pub fn negative(var: VariableId) -> Self {
        Self(-Self::signed(var))
    }

    /// Literal with the given polarity.
    #[must_use]
    pub fn with_polarity(var: VariableId, positive: bool) -> Self {
        if positive {
            Self::positive(var)
        } else {
            Self::negative(var)
        }
    }

    /// The complementary literal.
    #[must_use]
    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Returns true for a non-negated literal.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Signed DIMACS value.
    #[must_use]
    pub const fn to_dimacs(self) -> i32 {
        self.0
    }

    fn signed(var: VariableId) -> i32 {
        // Layout caps the variable count well below i32::MAX.
        i32::try_from(var.get()).unwrap_or(i32::MAX)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "¬v{}", -self.0)
        } else {
            write!(f, "v{}", self.0)
        }
    }
}

/// A disjunction of literals, kept sorted and free of repeats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause(Vec<Literal>);

impl Clause {
    /// Builds a normalized clause.
    #[must_use]
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        let mut lits: Vec<Literal> = literals.into_iter().collect();
        lits.sort_unstable();
        lits.dedup();
        Self(lits)
    }

    /// Single-literal clause.
    #[must_use]
    pub fn unit(literal: Literal) -> Self {
        Self(vec![literal])
    }

    /// Literals of the clause.
    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        &self.0
    }

    /// Returns true for the empty (always false) clause.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The literal of a unit clause.
    #[must_use]
    pub fn as_unit(&self) -> Option<Literal> {
        match self.0.as_slice() {
            [lit] => Some(*lit),
            _ => None,
        }
    }

    /// Returns true if the clause holds both a literal and its negation.
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.0
            .iter()
            .any(|lit| lit.is_positive() && self.0.binary_search(&lit.negate()).is_ok())
    }

    fn to_dimacs(&self) -> Vec<i32> {
        self.0.iter().map(|lit| lit.to_dimacs()).collect()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", parts.join(" ∨ "))
    }
}

/// Immutable copy of the formula handed to query workers.
#[derive(Debug, Clone)]
pub struct FormulaSnapshot {
    clauses: Arc<Vec<Vec<i32>>>,
}

impl FormulaSnapshot {
    /// Clauses in DIMACS form.
    #[must_use]
    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }

    /// Number of clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns true if the snapshot holds no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// The accumulated formula plus the solver backend that decides it.
pub struct ClauseSet {
    backend: Arc<dyn SatBackend>,
    clauses: Vec<Clause>,
    seen: HashSet<Clause>,
    units: HashMap<i32, bool>,
    implications: HashMap<Literal, Vec<Literal>>,
}

impl fmt::Debug for ClauseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClauseSet")
            .field("backend", &self.backend.name())
            .field("clauses", &self.clauses.len())
            .field("units", &self.units.len())
            .finish()
    }
}

impl ClauseSet {
    /// Creates an empty formula decided by `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn SatBackend>) -> Self {
        Self {
            backend,
            clauses: Vec::new(),
            seen: HashSet::new(),
            units: HashMap::new(),
            implications: HashMap::new(),
        }
    }

    /// Solver backend deciding this formula.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn SatBackend> {
        &self.backend
    }

    /// Adds a clause. Returns `Ok(false)` if it was a duplicate or a tautology.
    ///
    /// # Errors
    /// [`ExecutionError::Contradiction`] if the clause is empty or every literal
    /// is already falsified by a unit fact. The formula is left unchanged.
    pub fn add_clause(&mut self, clause: Clause, context: &str) -> Result<bool, ExecutionError> {
        if clause.is_empty() {
            return Err(ExecutionError::Contradiction {
                context: format!("empty clause ({context})"),
            });
        }
        if clause.is_tautology() || self.seen.contains(&clause) {
            return Ok(false);
        }
        if clause.literals().iter().all(|lit| self.is_falsified(*lit)) {
            return Err(ExecutionError::Contradiction {
                context: format!("{clause} ({context})"),
            });
        }

        match clause.literals() {
            [lit] => {
                self.units.insert(lit.to_dimacs().abs(), lit.is_positive());
            }
            [a, b] => {
                // {a ∨ b}: ¬a → b and ¬b → a.
                self.implications.entry(a.negate()).or_default().push(*b);
                self.implications.entry(b.negate()).or_default().push(*a);
            }
            _ => {}
        }
        self.seen.insert(clause.clone());
        self.clauses.push(clause);
        Ok(true)
    }

    /// Adds a unit clause.
    ///
    /// # Errors
    /// [`ExecutionError::Contradiction`] if the opposite literal is already asserted.
    pub fn add_unit(&mut self, literal: Literal, context: &str) -> Result<bool, ExecutionError> {
        self.add_clause(Clause::unit(literal), context)
    }

    /// Returns true if `literal` is asserted as a unit fact.
    #[must_use]
    pub fn is_asserted(&self, literal: Literal) -> bool {
        self.units.get(&literal.to_dimacs().abs()) == Some(&literal.is_positive())
    }

    /// Returns true if the negation of `literal` is asserted as a unit fact.
    #[must_use]
    pub fn is_falsified(&self, literal: Literal) -> bool {
        self.is_asserted(literal.negate())
    }

    /// Returns true if asserting `literal` is refuted by one propagation step
    /// over the unit facts and binary clauses.
    ///
    /// A `true` answer is sound (the formula plus `literal` is unsatisfiable);
    /// `false` means "unknown", not "satisfiable".
    #[must_use]
    pub fn refutes(&self, literal: Literal) -> bool {
        if self.is_falsified(literal) {
            return true;
        }
        self.implications
            .get(&literal)
            .is_some_and(|implied| implied.iter().any(|lit| self.is_falsified(*lit)))
    }

    /// Decides the formula under `assumptions`, on the calling thread.
    ///
    /// # Errors
    /// Whatever the backend reports, typically [`ExecutionError::Solver`].
    pub fn is_satisfiable(&self, assumptions: &[Literal]) -> Result<bool, ExecutionError> {
        self.backend.solve(&self.snapshot(), assumptions)
    }

    /// Copies the formula for query workers.
    #[must_use]
    pub fn snapshot(&self) -> FormulaSnapshot {
        FormulaSnapshot {
            clauses: Arc::new(self.clauses.iter().map(Clause::to_dimacs).collect()),
        }
    }

    /// Number of clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns true if no clause was added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Number of distinct unit facts.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Stable content hash of the formula, in insertion order.
    #[must_use]
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for clause in &self.clauses {
            for lit in clause.literals() {
                hasher.update(&lit.to_dimacs().to_le_bytes());
            }
            hasher.update(&0i32.to_le_bytes());
        }
        hasher.finalize()
    }
}
