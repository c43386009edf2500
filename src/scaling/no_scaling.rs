use super::{perform_scaling, Scaling};
use crate::population::{stat_ids, Population};
use crate::statistics::OperationTimer;

/// Copies the raw probability base straight into the scaled fitness.
#[derive(Debug, Clone, Default)]
pub struct NoScaling;

impl Scaling for NoScaling {
    fn call(&mut self, population: &mut Population) {
        let timer = OperationTimer::new(stat_ids::SCALING_TIME);
        perform_scaling(population, false, |raw, _index, params| {
            raw.probability_base(params)
        });
        timer.record(population.statistics_mut());
    }
}
