//! Scaling operations: transform raw fitness into the scaled fitness that
//! selection draws probabilities from.
//!
//! Every operation follows the same update contract: when the population
//! asks for a complete update (stale fitness values or a changed scaled
//! prototype) the whole generation is rescaled and the population is marked
//! accordingly, otherwise only the freshly inserted chromosomes are.
pub mod exponential;
pub mod linear;
pub mod no_scaling;
pub mod ranking;
pub mod sigma_truncation;
pub mod vega;
pub mod windowing;
pub mod wrapper;

pub use exponential::Exponential;
pub use linear::Linear;
pub use no_scaling::NoScaling;
pub use ranking::Ranking;
pub use sigma_truncation::SigmaTruncation;
pub use vega::Vega;
pub use windowing::Windowing;
pub use wrapper::Wrapper;

use crate::chromosome::NEW_CHROMOSOME;
use crate::fitness::{Fitness, FitnessParams};
use crate::population::{
    Population, COMPLETE_FITNESS_UPDATE, COMPLETE_SCALED_FITNESS_UPDATE,
    SCALED_FITNESS_PROTOTYPE_CHANGED,
};
use rayon::prelude::*;

/// A scaling operation over the population.
pub trait Scaling: Send + Sync + std::fmt::Debug {
    fn call(&mut self, population: &mut Population);
}

/// Shared scaling driver. Rescales the whole generation when either the
/// caller or the population flags demand it (and marks the population
/// completely rescaled), otherwise only the new chromosomes. The operation
/// maps a chromosome's raw fitness and position to its scaled value.
pub fn perform_scaling(
    population: &mut Population,
    complete_update: bool,
    op: impl Fn(&Fitness, usize, &FitnessParams) -> f64 + Sync,
) {
    let complete = complete_update
        || population
            .flags()
            .is_set_any(COMPLETE_FITNESS_UPDATE | SCALED_FITNESS_PROTOTYPE_CHANGED);

    let (storages, params, flags) = population.scaling_split();
    if complete {
        storages
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, storage)| {
                let scaled = op(storage.raw_fitness(), index, params);
                storage
                    .scaled_fitness_mut()
                    .set_values(&[scaled])
                    .expect("single-value scaled fitness");
            });
        flags.set(COMPLETE_SCALED_FITNESS_UPDATE);
    } else {
        storages
            .par_iter_mut()
            .enumerate()
            .filter(|(_, storage)| storage.flags().is_set_any(NEW_CHROMOSOME))
            .for_each(|(index, storage)| {
                let scaled = op(storage.raw_fitness(), index, params);
                storage
                    .scaled_fitness_mut()
                    .set_values(&[scaled])
                    .expect("single-value scaled fitness");
            });
    }
}
