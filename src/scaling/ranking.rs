use super::{perform_scaling, Scaling};
use crate::population::{stat_ids, Population, COMPLETE_SCALED_FITNESS_UPDATE};
use crate::statistics::OperationTimer;

/// Ranking scaling: a chromosome's scaled fitness is its position rank,
/// the best rank being the population size minus one. Always rescales the
/// whole generation.
#[derive(Debug, Clone, Default)]
pub struct Ranking;

impl Scaling for Ranking {
    fn call(&mut self, population: &mut Population) {
        let timer = OperationTimer::new(stat_ids::SCALING_TIME);
        let max_rank = population.size().saturating_sub(1);
        perform_scaling(population, true, move |_raw, index, _params| {
            (max_rank - index) as f64
        });
        population.flags().set(COMPLETE_SCALED_FITNESS_UPDATE);
        timer.record(population.statistics_mut());
    }
}
