use super::{perform_scaling, Scaling};
use crate::population::{stat_ids, Population};
use crate::statistics::OperationTimer;

/// Exponential scaling: raises the raw probability base to a fixed power.
#[derive(Debug, Clone)]
pub struct Exponential {
    pub factor: f64,
}

impl Exponential {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }
}

impl Scaling for Exponential {
    fn call(&mut self, population: &mut Population) {
        let timer = OperationTimer::new(stat_ids::SCALING_TIME);
        let factor = self.factor;
        perform_scaling(population, false, move |raw, _index, params| {
            raw.probability_base(params).powf(factor)
        });
        timer.record(population.statistics_mut());
    }
}
