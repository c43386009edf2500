//! A runtime core for multi-objective evolutionary search.
//!
//! A population of candidate solutions is iteratively evaluated, compared,
//! scaled and partially replaced until a stop criterion fires. This crate
//! is the engine underneath such a loop:
//! * [Population](crate::population::Population) storage with pooled
//!   [chromosome records](crate::chromosome::ChromosomeStorage) and the
//!   [tag system](crate::tags) that lets operations attach per-chromosome
//!   state (dominance counts, hyperbox coordinates, per-branch lists)
//!   without touching the chromosome type
//! * the [fitness](crate::fitness) value model (single, multi, weighted)
//!   with its comparators, including Pareto dominance
//! * the [statistics](crate::statistics) engine with run-length history,
//!   combiners and derived values
//! * [hypergrids](crate::grid) over fitness space, fixed and adaptive,
//!   with the best-per-cell density matrix
//! * [scaling](crate::scaling) operations from plain copying to VEGA-style
//!   objective rotation, and [stop criteria](crate::stop)
//! * the rank-density [replacement](crate::replacement) operation, which
//!   combines dominance ranking with grid density to pick survivors using
//!   branch-parallel work distribution over the rayon pool
//!
//! Chromosome encodings, variation operators, the raw fitness function and
//! the outer generation loop are the caller's; the engine consumes them
//! through the traits in [chromosome](crate::chromosome).
//!
//! ## Quick Usage
//!
//! ```rust
//! use multiobjective_ga::fitness::comparators::{CompareParams, ComparatorSetup, Dominance, Sense};
//! use multiobjective_ga::fitness::placeholders::{PointChromosome, PointObjectives};
//! use multiobjective_ga::fitness::{Fitness, FitnessParams};
//! use multiobjective_ga::chromosome::evaluate_new_storages;
//! use multiobjective_ga::grid::AdaptiveGrid;
//! use multiobjective_ga::population::Population;
//! use multiobjective_ga::replacement::{OffspringBatch, Rdga, RdgaConfig, RdgaParams, Replacement};
//!
//! // a population over two maximised objectives
//! let mut population = Population::new(
//!     4,
//!     Fitness::multi(vec![0.0, 0.0]),
//!     FitnessParams::new(2, 0).unwrap(),
//!     ComparatorSetup::new(Dominance, CompareParams::new(Sense::MaximizeAll)),
//! )
//! .unwrap();
//!
//! let points = [[3.0, 3.0], [2.0, 4.0], [1.0, 1.0], [2.0, 2.0]];
//! let mut batch = Vec::new();
//! for point in points {
//!     let mut storage = population.acquire_storage();
//!     storage.set_chromosome(Box::new(PointChromosome::new(point.to_vec())), None);
//!     batch.push(storage);
//! }
//! population.insert(batch);
//! evaluate_new_storages(&mut PointObjectives, population.storages_mut(), None);
//!
//! // rank the generation with the rank-density replacement operation
//! let rdga = Rdga;
//! let params = RdgaParams::new(2);
//! let config = RdgaConfig::new(AdaptiveGrid::new(vec![4, 4]).unwrap());
//! let mut input = OffspringBatch::new();
//! rdga.prepare(&mut input, &mut population, &params, &config).unwrap();
//! rdga.update(&mut input, &mut population, &params, &config).unwrap();
//! rdga.exec(&mut input, &mut population, &params, &config).unwrap();
//! assert_eq!(population.size(), 4);
//! ```

pub mod branch;
pub mod chromosome;
pub mod container;
pub mod errors;
pub mod fitness;
pub mod flags;
pub mod grid;
pub mod population;
pub mod replacement;
pub mod scaling;
pub mod statistics;
pub mod stop;
pub mod tags;
