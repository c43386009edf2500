//! Fitness comparison strategies.
//!
//! A comparator returns `< 0` when the first fitness is strictly better
//! under the configured sense, `> 0` when it is strictly worse, and `0`
//! when the two are equal or incomparable.
use super::{compare_raw, Fitness};

/// Whether lower or higher objective values are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    MinimizeAll,
    MaximizeAll,
}

impl Sense {
    /// Multiplier applied to the raw "greater is better" comparison.
    fn factor(&self) -> i32 {
        match self {
            Sense::MinimizeAll => -1,
            Sense::MaximizeAll => 1,
        }
    }
}

/// Comparator parameters: the optimisation sense, plus the objective index
/// used by the single-objective strategy.
#[derive(Debug, Clone, Copy)]
pub struct CompareParams {
    pub sense: Sense,
    pub objective_index: usize,
}

impl CompareParams {
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            objective_index: 0,
        }
    }

    pub fn with_objective(sense: Sense, objective_index: usize) -> Self {
        Self {
            sense,
            objective_index,
        }
    }
}

/// Comparison strategy over fitness values.
pub trait FitnessComparator: Send + Sync + std::fmt::Debug {
    /// Compares two value vectors of equal length.
    fn compare_values(&self, a: &[f64], b: &[f64], params: &CompareParams) -> i32;

    fn compare(&self, a: &Fitness, b: &Fitness, params: &CompareParams) -> i32 {
        self.compare_values(a.comparison_values(), b.comparison_values(), params)
    }
}

/// Compares single-value fitnesses.
#[derive(Debug, Clone, Default)]
pub struct Simple;

impl FitnessComparator for Simple {
    fn compare_values(&self, a: &[f64], b: &[f64], params: &CompareParams) -> i32 {
        params.sense.factor() * compare_raw(a[0], b[0])
    }
}

/// Lexicographic comparison from index 0 upward; the first differing
/// objective decides.
#[derive(Debug, Clone, Default)]
pub struct Positional;

impl FitnessComparator for Positional {
    fn compare_values(&self, a: &[f64], b: &[f64], params: &CompareParams) -> i32 {
        let factor = params.sense.factor();
        for (x, y) in a.iter().zip(b) {
            let result = factor * compare_raw(*x, *y);
            if result != 0 {
                return result;
            }
        }
        0
    }
}

/// Pareto dominance: the sign is returned only when every non-tied
/// objective agrees on it; mixed signs mean the pair is incomparable.
#[derive(Debug, Clone, Default)]
pub struct Dominance;

impl FitnessComparator for Dominance {
    fn compare_values(&self, a: &[f64], b: &[f64], params: &CompareParams) -> i32 {
        let factor = params.sense.factor();
        let mut result = 0;
        for index in (0..a.len()).rev() {
            let cmp = factor * compare_raw(a[index], b[index]);
            if result == 0 {
                result = cmp;
            } else if cmp != 0 && result != cmp {
                return 0;
            }
        }
        result
    }
}

/// Compares one chosen objective, as used by round-robin single-objective
/// selection.
#[derive(Debug, Clone, Default)]
pub struct Objective;

impl FitnessComparator for Objective {
    fn compare_values(&self, a: &[f64], b: &[f64], params: &CompareParams) -> i32 {
        let index = params.objective_index;
        params.sense.factor() * compare_raw(a[index], b[index])
    }
}

#[derive(Debug, Clone)]
pub enum Wrapper {
    Simple(Simple),
    Positional(Positional),
    Dominance(Dominance),
    Objective(Objective),
}

impl FitnessComparator for Wrapper {
    fn compare_values(&self, a: &[f64], b: &[f64], params: &CompareParams) -> i32 {
        match self {
            Wrapper::Simple(comparator) => comparator.compare_values(a, b, params),
            Wrapper::Positional(comparator) => comparator.compare_values(a, b, params),
            Wrapper::Dominance(comparator) => comparator.compare_values(a, b, params),
            Wrapper::Objective(comparator) => comparator.compare_values(a, b, params),
        }
    }
}

impl From<Simple> for Wrapper {
    fn from(comparator: Simple) -> Self {
        Wrapper::Simple(comparator)
    }
}
impl From<Positional> for Wrapper {
    fn from(comparator: Positional) -> Self {
        Wrapper::Positional(comparator)
    }
}
impl From<Dominance> for Wrapper {
    fn from(comparator: Dominance) -> Self {
        Wrapper::Dominance(comparator)
    }
}
impl From<Objective> for Wrapper {
    fn from(comparator: Objective) -> Self {
        Wrapper::Objective(comparator)
    }
}

/// A comparator together with its parameters, ready to be installed on a
/// population.
#[derive(Debug, Clone)]
pub struct ComparatorSetup {
    pub comparator: Wrapper,
    pub params: CompareParams,
}

impl ComparatorSetup {
    pub fn new(comparator: impl Into<Wrapper>, params: CompareParams) -> Self {
        Self {
            comparator: comparator.into(),
            params,
        }
    }

    pub fn compare(&self, a: &Fitness, b: &Fitness) -> i32 {
        self.comparator.compare(a, b, &self.params)
    }

    pub fn compare_values(&self, a: &[f64], b: &[f64]) -> i32 {
        self.comparator.compare_values(a, b, &self.params)
    }
}
