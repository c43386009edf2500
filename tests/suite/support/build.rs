use multiobjective_ga::chromosome::{evaluate_new_storages, ChromosomeStorage};
use multiobjective_ga::fitness::comparators::{CompareParams, ComparatorSetup, Dominance, Sense};
use multiobjective_ga::fitness::placeholders::{PointChromosome, PointObjectives};
use multiobjective_ga::fitness::{Fitness, FitnessParams};
use multiobjective_ga::population::Population;

/// A population over `value_count` maximised objectives with a Pareto
/// dominance comparator, populated with the given points and with raw
/// fitness already evaluated. The points stay staged as this generation's
/// new chromosomes.
#[allow(dead_code)]
pub fn point_population(capacity: usize, value_count: usize, points: &[Vec<f64>]) -> Population {
    let mut population = Population::new(
        capacity,
        Fitness::multi(vec![0.0; value_count]),
        FitnessParams::new(value_count, 0).unwrap(),
        ComparatorSetup::new(Dominance, CompareParams::new(Sense::MaximizeAll)),
    )
    .unwrap();
    let mut batch = Vec::new();
    for point in points {
        let mut storage = population.acquire_storage();
        storage.set_chromosome(Box::new(PointChromosome::new(point.clone())), None);
        batch.push(storage);
    }
    population.insert(batch);
    evaluate_new_storages(&mut PointObjectives, population.storages_mut(), None);
    population
}

/// Same as [point_population], but the initial generation is sealed: the
/// staging range is empty and statistics history holds one entry, ready
/// for an offspring batch.
#[allow(dead_code)]
pub fn settled_point_population(
    capacity: usize,
    value_count: usize,
    points: &[Vec<f64>],
) -> Population {
    let mut population = point_population(capacity, value_count, points);
    population.update_fitness_statistics().unwrap();
    population.next_generation().unwrap();
    population
}

/// An offspring storage for `point`, evaluated, with an optional parent
/// back-link.
#[allow(dead_code)]
pub fn offspring(
    population: &mut Population,
    point: Vec<f64>,
    parent: Option<usize>,
) -> ChromosomeStorage {
    let mut storage = population.acquire_storage();
    storage.set_chromosome(Box::new(PointChromosome::new(point.clone())), parent);
    storage
        .raw_fitness_mut()
        .set_values(&point)
        .expect("point matches fitness dimension");
    storage
}

/// Raw-fitness value vectors of every storage, in population order.
#[allow(dead_code)]
pub fn raw_points(population: &Population) -> Vec<Vec<f64>> {
    population
        .storages()
        .iter()
        .map(|storage| storage.raw_fitness().values().to_vec())
        .collect()
}
