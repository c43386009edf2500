use super::{perform_scaling, Scaling};
use crate::population::{stat_ids, Population, COMPLETE_SCALED_FITNESS_UPDATE};
use crate::statistics::OperationTimer;

/// Sigma truncation: scaled fitness is the raw probability base shifted by
/// `average − factor·deviation`, cutting off chromosomes more than
/// `factor` deviations below the mean.
#[derive(Debug, Clone)]
pub struct SigmaTruncation {
    pub factor: f64,
}

impl SigmaTruncation {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }
}

impl Scaling for SigmaTruncation {
    fn call(&mut self, population: &mut Population) {
        let timer = OperationTimer::new(stat_ids::SCALING_TIME);

        population
            .update_fitness_statistics()
            .expect("scaling runs on a populated population");
        population.flags().set(COMPLETE_SCALED_FITNESS_UPDATE);

        let stats = population.statistics();
        let average = stats
            .value(stat_ids::MEAN_PROBABILITY_BASE)
            .and_then(|value| value.current_value())
            .expect("tracker updated above");
        let deviation = stats
            .value(stat_ids::DEVIATION)
            .and_then(|value| value.current_value())
            .expect("tracker updated above");

        let shift = average - self.factor * deviation;
        perform_scaling(population, true, move |raw, _index, params| {
            raw.probability_base(params) - shift
        });
        timer.record(population.statistics_mut());
    }
}
