use super::{perform_scaling, Scaling};
use crate::population::{stat_ids, Population, COMPLETE_SCALED_FITNESS_UPDATE};
use crate::statistics::OperationTimer;

/// Linear scaling `a·raw + b`. The slope and intercept are derived each
/// generation from the best, worst and average probability base so that
/// the average chromosome keeps its fitness and the best is `factor` times
/// the average, falling back to clamping at the worst chromosome when that
/// would drive the worst fitness negative.
#[derive(Debug, Clone)]
pub struct Linear {
    pub factor: f64,
}

impl Linear {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    /// Slope and intercept for the current population statistics.
    fn coefficients(&self, best: f64, worst: f64, average: f64) -> (f64, f64) {
        if worst > (self.factor * average - best) / (self.factor - 1.0) {
            let spread = best - average;
            if spread.abs() < 1e-5 {
                (1.0, 0.0)
            } else {
                let base = average / spread;
                let intercept = base * (best - self.factor * average);
                (base * (self.factor - 1.0), intercept)
            }
        } else {
            let spread = average - worst;
            if spread.abs() < 1e-5 {
                (1.0, 0.0)
            } else {
                let slope = average / spread;
                (slope, -worst * slope)
            }
        }
    }
}

impl Scaling for Linear {
    fn call(&mut self, population: &mut Population) {
        let timer = OperationTimer::new(stat_ids::SCALING_TIME);

        population
            .update_fitness_statistics()
            .expect("scaling runs on a populated population");
        population.flags().set(COMPLETE_SCALED_FITNESS_UPDATE);

        let stats = population.statistics();
        let best = stats
            .value(stat_ids::BEST_PROBABILITY_BASE)
            .and_then(|value| value.current_value())
            .expect("tracker updated above");
        let worst = stats
            .value(stat_ids::WORST_PROBABILITY_BASE)
            .and_then(|value| value.current_value())
            .expect("tracker updated above");
        let average = stats
            .value(stat_ids::MEAN_PROBABILITY_BASE)
            .and_then(|value| value.current_value())
            .expect("tracker updated above");

        let (slope, intercept) = self.coefficients(best, worst, average);
        perform_scaling(population, true, move |raw, _index, params| {
            slope * raw.probability_base(params) + intercept
        });
        timer.record(population.statistics_mut());
    }
}
