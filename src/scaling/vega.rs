use super::{perform_scaling, Scaling};
use crate::population::{stat_ids, Population, COMPLETE_SCALED_FITNESS_UPDATE};
use crate::statistics::OperationTimer;

/// VEGA-style scaling: the scaled fitness is the raw probability base, and
/// after every sweep the probability-base index rotates to the next
/// objective, so successive generations select on successive objectives.
#[derive(Debug, Clone, Default)]
pub struct Vega;

impl Scaling for Vega {
    fn call(&mut self, population: &mut Population) {
        let timer = OperationTimer::new(stat_ids::SCALING_TIME);
        perform_scaling(population, true, |raw, _index, params| {
            raw.probability_base(params)
        });
        population.fitness_params_mut().next_probability_index();
        population.flags().set(COMPLETE_SCALED_FITNESS_UPDATE);
        timer.record(population.statistics_mut());
    }
}
