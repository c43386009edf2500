//! Placeholder chromosomes and raw-fitness operations, used in tests and
//! benches and as minimal examples of the collaborator interfaces.
use crate::chromosome::{Chromosome, RawFitnessOperation};
use crate::fitness::Fitness;

/// A chromosome that is nothing but a point in objective space.
#[derive(Debug, Clone, PartialEq)]
pub struct PointChromosome {
    pub point: Vec<f64>,
}

impl PointChromosome {
    pub fn new(point: Vec<f64>) -> Self {
        Self { point }
    }
}

impl Chromosome for PointChromosome {
    fn clone_box(&self) -> Box<dyn Chromosome> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Copies a [PointChromosome]'s coordinates straight into the fitness
/// vector; non-point chromosomes keep their current fitness.
#[derive(Debug, Clone, Default)]
pub struct PointObjectives;

impl RawFitnessOperation for PointObjectives {
    fn evaluate(&mut self, chromosome: &dyn Chromosome, fitness: &mut Fitness) {
        if let Some(point) = chromosome.as_any().downcast_ref::<PointChromosome>() {
            fitness
                .set_values(&point.point)
                .expect("point dimension matches fitness prototype");
        }
    }
}

/// Sums a [PointChromosome]'s coordinates into a single-value fitness.
#[derive(Debug, Clone, Default)]
pub struct CoordinateSum;

impl RawFitnessOperation for CoordinateSum {
    fn evaluate(&mut self, chromosome: &dyn Chromosome, fitness: &mut Fitness) {
        if let Some(point) = chromosome.as_any().downcast_ref::<PointChromosome>() {
            let sum: f64 = point.point.iter().sum();
            fitness
                .set_values(&[sum])
                .expect("single-value fitness prototype");
        }
    }
}
