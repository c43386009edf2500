//! Fitness values and their arithmetic, distance and comparison contracts.
//!
//! Three shapes are supported: a single scalar, an ordered vector of
//! objective values, and a weighted vector that maintains its weighted sum.
//! Arithmetic is component-wise; comparisons require identical shape and
//! dimension. The scalar a selection or scaling operation uses as a
//! chromosome's weight is the *probability base*: the value itself for the
//! single shape, one chosen objective for the multi shape (rotatable, see
//! [FitnessParams::next_probability_index]) and the weighted sum for the
//! weighted shape.
pub mod comparators;
pub mod placeholders;

use crate::errors::{CoreError, Result};
use itertools::Itertools;
use rand::Rng;

/// Shared parameters of the fitness objects a population stores: the number
/// of objective values and the objective used as probability base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitnessParams {
    value_count: usize,
    probability_base_index: usize,
}

impl FitnessParams {
    pub fn new(value_count: usize, probability_base_index: usize) -> Result<Self> {
        if value_count == 0 {
            return Err(CoreError::InvalidArgument(
                "fitness must store at least one value",
            ));
        }
        if probability_base_index >= value_count {
            return Err(CoreError::OutOfRange(
                "probability base index beyond fitness size",
            ));
        }
        Ok(Self {
            value_count,
            probability_base_index,
        })
    }

    pub fn value_count(&self) -> usize {
        self.value_count
    }

    pub fn probability_base_index(&self) -> usize {
        self.probability_base_index
    }

    pub fn set_probability_base_index(&mut self, index: usize) -> Result<()> {
        if index >= self.value_count {
            return Err(CoreError::OutOfRange(
                "probability base index beyond fitness size",
            ));
        }
        self.probability_base_index = index;
        Ok(())
    }

    /// Moves the probability base to the next objective, wrapping around
    /// after the last one.
    pub fn next_probability_index(&mut self) {
        self.probability_base_index = (self.probability_base_index + 1) % self.value_count;
    }
}

impl Default for FitnessParams {
    fn default() -> Self {
        Self {
            value_count: 1,
            probability_base_index: 0,
        }
    }
}

/// A fitness value of one of the three supported shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Fitness {
    Single {
        value: f64,
    },
    Multi {
        values: Vec<f64>,
    },
    Weighted {
        values: Vec<f64>,
        weights: Vec<f64>,
        sum: f64,
    },
}

impl Fitness {
    pub fn single(value: f64) -> Self {
        Fitness::Single { value }
    }

    pub fn multi(values: Vec<f64>) -> Self {
        Fitness::Multi { values }
    }

    pub fn weighted(values: Vec<f64>, weights: Vec<f64>) -> Result<Self> {
        if values.len() != weights.len() {
            return Err(CoreError::InvalidArgument(
                "weight count does not match value count",
            ));
        }
        let sum = values.iter().zip(&weights).map(|(v, w)| v * w).sum();
        Ok(Fitness::Weighted {
            values,
            weights,
            sum,
        })
    }

    /// A zero-valued fitness of the same shape, used as prototype when a
    /// storage object is recycled.
    pub fn zeroed_like(&self) -> Self {
        match self {
            Fitness::Single { .. } => Fitness::single(0.0),
            Fitness::Multi { values } => Fitness::multi(vec![0.0; values.len()]),
            Fitness::Weighted { weights, .. } => Fitness::Weighted {
                values: vec![0.0; weights.len()],
                weights: weights.clone(),
                sum: 0.0,
            },
        }
    }

    pub fn value_count(&self) -> usize {
        self.values().len()
    }

    /// The stored objective values.
    pub fn values(&self) -> &[f64] {
        match self {
            Fitness::Single { value } => std::slice::from_ref(value),
            Fitness::Multi { values } => values,
            Fitness::Weighted { values, .. } => values,
        }
    }

    /// The values comparisons are defined over: the stored vector, except
    /// for the weighted shape where every comparison uses the maintained
    /// sum.
    pub fn comparison_values(&self) -> &[f64] {
        match self {
            Fitness::Weighted { sum, .. } => std::slice::from_ref(sum),
            _ => self.values(),
        }
    }

    pub fn set_values(&mut self, new_values: &[f64]) -> Result<()> {
        if new_values.len() != self.value_count() {
            return Err(CoreError::InvalidArgument("fitness dimension mismatch"));
        }
        match self {
            Fitness::Single { value } => *value = new_values[0],
            Fitness::Multi { values } => values.copy_from_slice(new_values),
            Fitness::Weighted { values, .. } => values.copy_from_slice(new_values),
        }
        self.refresh_sum();
        Ok(())
    }

    pub fn set_value_at(&mut self, index: usize, new_value: f64) -> Result<()> {
        if index >= self.value_count() {
            return Err(CoreError::InvalidArgument("fitness index out of range"));
        }
        match self {
            Fitness::Single { value } => *value = new_value,
            Fitness::Multi { values } => values[index] = new_value,
            Fitness::Weighted { values, .. } => values[index] = new_value,
        }
        self.refresh_sum();
        Ok(())
    }

    fn refresh_sum(&mut self) {
        if let Fitness::Weighted {
            values,
            weights,
            sum,
        } = self
        {
            *sum = values.iter().zip(weights.iter()).map(|(v, w)| v * w).sum();
        }
    }

    /// The scalar used as this fitness' selection weight.
    pub fn probability_base(&self, params: &FitnessParams) -> f64 {
        match self {
            Fitness::Single { value } => *value,
            Fitness::Multi { values } => values[params.probability_base_index()],
            Fitness::Weighted { sum, .. } => *sum,
        }
    }

    /// Fails with `InvalidArgument` unless both operands have the same
    /// shape and dimension.
    pub fn check_same_shape(&self, other: &Fitness) -> Result<()> {
        let compatible = match (self, other) {
            (Fitness::Single { .. }, Fitness::Single { .. }) => true,
            (Fitness::Multi { values: a }, Fitness::Multi { values: b }) => a.len() == b.len(),
            (Fitness::Weighted { values: a, .. }, Fitness::Weighted { values: b, .. }) => {
                a.len() == b.len()
            }
            _ => false,
        };
        if compatible {
            Ok(())
        } else {
            Err(CoreError::InvalidArgument("fitness dimension mismatch"))
        }
    }

    /// Distance between two fitness values of the same shape: absolute
    /// difference for the single shape, Euclidean otherwise.
    pub fn distance(&self, other: &Fitness) -> f64 {
        match (self, other) {
            (Fitness::Single { value: a }, Fitness::Single { value: b }) => (a - b).abs(),
            _ => self
                .values()
                .iter()
                .zip_eq(other.values())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt(),
        }
    }

    /// Compares one objective pair: −1 when this fitness' value is greater,
    /// +1 when the other's is, 0 on equality.
    pub fn compare_value_at(&self, other: &Fitness, index: usize) -> i32 {
        compare_raw(self.values()[index], other.values()[index])
    }
}

/// Sign convention shared by all comparators: −1 means the first value is
/// the greater one, so that under maximisation "negative" reads "better".
pub(crate) fn compare_raw(a: f64, b: f64) -> i32 {
    if a > b {
        -1
    } else if b > a {
        1
    } else {
        0
    }
}

impl std::ops::AddAssign<&Fitness> for Fitness {
    fn add_assign(&mut self, rhs: &Fitness) {
        component_op(self, rhs, |a, b| a + b);
    }
}

impl std::ops::SubAssign<&Fitness> for Fitness {
    fn sub_assign(&mut self, rhs: &Fitness) {
        component_op(self, rhs, |a, b| a - b);
    }
}

impl std::ops::DivAssign<u32> for Fitness {
    fn div_assign(&mut self, rhs: u32) {
        let divisor = rhs as f64;
        match self {
            Fitness::Single { value } => *value /= divisor,
            Fitness::Multi { values } => values.iter_mut().for_each(|v| *v /= divisor),
            Fitness::Weighted { values, .. } => values.iter_mut().for_each(|v| *v /= divisor),
        }
        self.refresh_sum();
    }
}

impl std::ops::Add<&Fitness> for &Fitness {
    type Output = Fitness;

    fn add(self, rhs: &Fitness) -> Fitness {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl std::ops::Sub<&Fitness> for &Fitness {
    type Output = Fitness;

    fn sub(self, rhs: &Fitness) -> Fitness {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl std::ops::Div<u32> for &Fitness {
    type Output = Fitness;

    fn div(self, rhs: u32) -> Fitness {
        let mut out = self.clone();
        out /= rhs;
        out
    }
}

fn component_op(lhs: &mut Fitness, rhs: &Fitness, op: impl Fn(f64, f64) -> f64) {
    lhs.check_same_shape(rhs).expect("fitness dimension mismatch");
    match (&mut *lhs, rhs) {
        (Fitness::Single { value }, Fitness::Single { value: b }) => *value = op(*value, *b),
        (Fitness::Multi { values }, Fitness::Multi { values: b }) => {
            values.iter_mut().zip_eq(b).for_each(|(a, b)| *a = op(*a, *b))
        }
        (Fitness::Weighted { values, .. }, Fitness::Weighted { values: b, .. }) => {
            values.iter_mut().zip_eq(b).for_each(|(a, b)| *a = op(*a, *b))
        }
        _ => unreachable!("shape checked above"),
    }
    lhs.refresh_sum();
}

/// A probability parameter, validated to lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probability(f64);

impl Probability {
    pub fn new(value: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(CoreError::OutOfRange("probability outside [0, 1]"));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Uniform gate: `true` with this probability.
    pub fn gate<R: Rng>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.0
    }
}
