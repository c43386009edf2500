use super::{perform_scaling, Scaling};
use crate::population::{stat_ids, Population, COMPLETE_SCALED_FITNESS_UPDATE};
use crate::statistics::OperationTimer;

/// Window scaling: scaled fitness is the raw probability base minus the
/// worst one in the population. When the tracked worst value moved since
/// the previous generation the whole population is rescaled.
#[derive(Debug, Clone, Default)]
pub struct Windowing;

impl Scaling for Windowing {
    fn call(&mut self, population: &mut Population) {
        let timer = OperationTimer::new(stat_ids::SCALING_TIME);

        population
            .update_fitness_statistics()
            .expect("scaling runs on a populated population");
        let worst_value = population
            .statistics()
            .value(stat_ids::WORST_PROBABILITY_BASE)
            .expect("tracker registered at construction");
        let worst = worst_value
            .current()
            .expect("tracker updated above");
        let worst_changed = match worst_value.previous(1) {
            Ok(previous) => previous != worst,
            Err(_) => true,
        };
        if worst_changed {
            population.flags().set(COMPLETE_SCALED_FITNESS_UPDATE);
        }

        perform_scaling(population, worst_changed, move |raw, _index, params| {
            raw.probability_base(params) - worst
        });
        timer.record(population.statistics_mut());
    }
}
