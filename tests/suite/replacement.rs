use crate::support::build;
use multiobjective_ga::fitness::comparators::FitnessComparator;
use multiobjective_ga::fitness::comparators::Dominance;
use multiobjective_ga::grid::{AdaptiveGrid, BestCellMatrix, PerBranchMatrices};
use multiobjective_ga::population::Population;
use multiobjective_ga::replacement::rdga::{HyperBoxTag, ReplacementGrid, UnrankedFront};
use multiobjective_ga::replacement::{OffspringBatch, Rdga, RdgaConfig, RdgaParams, Replacement};
use multiobjective_ga::tags::{PartialIndexLists, TagGetter};
use std::sync::atomic::{AtomicI32, Ordering};

fn rdga_setup(cells: Vec<usize>, replacement_size: usize) -> (Rdga, RdgaParams, RdgaConfig) {
    (
        Rdga,
        RdgaParams::new(replacement_size),
        RdgaConfig::new(AdaptiveGrid::new(cells).unwrap()),
    )
}

fn prepare(
    rdga: &Rdga,
    population: &mut Population,
    params: &RdgaParams,
    config: &RdgaConfig,
) -> OffspringBatch {
    let mut input = OffspringBatch::new();
    rdga.prepare(&mut input, population, params, config).unwrap();
    rdga.update(&mut input, population, params, config).unwrap();
    input
}

fn rank_of(population: &Population, params: &RdgaParams, index: usize) -> i32 {
    let getter =
        TagGetter::<AtomicI32>::new(params.rank_tag, population.chromosome_tag_manager()).unwrap();
    getter
        .get(population.storage(index).tags())
        .load(Ordering::Acquire)
}

#[test]
fn ranks_accumulate_over_dominators() {
    crate::support::init_logger();
    // A and B are mutually nondominating, both dominate C and D, D
    // dominates C
    let mut population = build::point_population(
        4,
        2,
        &[
            vec![3.0, 3.0],
            vec![2.0, 4.0],
            vec![1.0, 1.0],
            vec![2.0, 2.0],
        ],
    );
    let (rdga, params, config) = rdga_setup(vec![4, 4], 0);
    let mut input = prepare(&rdga, &mut population, &params, &config);
    rdga.exec(&mut input, &mut population, &params, &config).unwrap();

    assert_eq!(population.size(), 4);
    assert_eq!(rank_of(&population, &params, 0), 1);
    assert_eq!(rank_of(&population, &params, 1), 1);
    assert_eq!(rank_of(&population, &params, 2), 6);
    assert_eq!(rank_of(&population, &params, 3), 3);
}

#[test]
fn every_chromosome_ends_ranked_with_clean_dominance_state() {
    let points: Vec<Vec<f64>> = (0..12)
        .map(|index| {
            let x = (index % 4) as f64;
            let y = (index / 4) as f64;
            vec![x * 1.5 + 0.25, 3.0 - y + 0.5 * x]
        })
        .collect();
    let mut population = build::point_population(16, 2, &points);
    let (rdga, params, config) = rdga_setup(vec![5, 5], 0);
    let mut input = prepare(&rdga, &mut population, &params, &config);
    rdga.exec(&mut input, &mut population, &params, &config).unwrap();

    let dom_count =
        TagGetter::<AtomicI32>::new(params.dom_count_tag, population.chromosome_tag_manager())
            .unwrap();
    let dom_list =
        TagGetter::<PartialIndexLists>::new(params.dom_list_tag, population.chromosome_tag_manager())
            .unwrap();
    let comparator = Dominance;
    let setup = population.comparator().clone();

    for (index, storage) in population.storages().iter().enumerate() {
        let rank = rank_of(&population, &params, index);
        assert!(rank >= 1, "chromosome {} left unranked", index);

        // the pass consumed all dominance bookkeeping
        assert_eq!(dom_count.get(storage.tags()).load(Ordering::Acquire), 0);
        assert_eq!(dom_list.get(storage.tags()).total_len(), 0);

        // rank 1 exactly for the nondominated chromosomes
        let dominated = population.storages().iter().any(|other| {
            comparator.compare(other.raw_fitness(), storage.raw_fitness(), &setup.params) < 0
        });
        assert_eq!(rank == 1, !dominated, "rank {} at {}", rank, index);

        // every dominated chromosome has a dominator of strictly lower rank
        if rank > 1 {
            let has_lower_dominator =
                population
                    .storages()
                    .iter()
                    .enumerate()
                    .any(|(other_index, other)| {
                        comparator.compare(
                            other.raw_fitness(),
                            storage.raw_fitness(),
                            &setup.params,
                        ) < 0
                            && rank_of(&population, &params, other_index) < rank
                    });
            assert!(has_lower_dominator, "no lower-ranked dominator at {}", index);
        }
    }
}

#[test]
fn density_branch_replaces_the_crowded_parent() {
    // a crowded cluster around [1, 1] and offspring escaping towards [5, 5]
    let mut population = build::settled_point_population(
        8,
        2,
        &[
            vec![1.0, 1.0],
            vec![1.05, 1.05],
            vec![1.1, 1.1],
            vec![0.95, 0.95],
            vec![0.9, 0.9],
        ],
    );
    let (rdga, params, config) = rdga_setup(vec![3, 3], 2);
    let mut input = prepare(&rdga, &mut population, &params, &config);

    // position 0 decides on density, position 1 on rank
    input.push(build::offspring(&mut population, vec![5.0, 5.0], Some(0)));
    input.push(build::offspring(&mut population, vec![4.9, 4.9], Some(4)));
    rdga.exec(&mut input, &mut population, &params, &config).unwrap();

    // one parent leaves per offspring: the population size is conserved
    assert_eq!(population.size(), 5);
    let survivors: Vec<Vec<f64>> = build::raw_points(&population);
    assert!(!survivors.contains(&vec![1.0, 1.0]), "crowded parent kept");
    assert!(!survivors.contains(&vec![0.9, 0.9]), "outranked parent kept");
    assert!(survivors.contains(&vec![5.0, 5.0]));
    assert!(survivors.contains(&vec![4.9, 4.9]));

    // surviving offspring dropped their parent links
    for storage in population.storages() {
        assert_eq!(storage.parent(), None);
    }
}

#[test]
fn outranked_offspring_is_rejected() {
    let mut population = build::settled_point_population(
        4,
        2,
        &[vec![3.0, 3.0], vec![2.8, 2.8]],
    );
    let (rdga, params, config) = rdga_setup(vec![3, 3], 2);
    let mut input = prepare(&rdga, &mut population, &params, &config);

    // position 1 is the rank branch: the child is dominated by its parent
    input.push(build::offspring(&mut population, vec![0.5, 3.5], None));
    input.push(build::offspring(&mut population, vec![1.0, 1.0], Some(0)));
    rdga.exec(&mut input, &mut population, &params, &config).unwrap();

    let survivors: Vec<Vec<f64>> = build::raw_points(&population);
    assert!(survivors.contains(&vec![3.0, 3.0]), "top parent removed");
    assert!(!survivors.contains(&vec![1.0, 1.0]), "dominated child kept");
}

#[test]
fn replacement_conserves_the_population_size() {
    let initial: Vec<Vec<f64>> = (0..10)
        .map(|index| vec![(index as f64) * 0.7 + 1.0, 10.0 - index as f64])
        .collect();
    let mut population = build::settled_point_population(10, 2, &initial);
    let (rdga, params, config) = rdga_setup(vec![4, 4], 4);
    let mut input = prepare(&rdga, &mut population, &params, &config);

    for index in 0..4 {
        let parent = index * 2;
        let point = vec![index as f64 + 0.3, 9.5 - index as f64];
        input.push(build::offspring(&mut population, point, Some(parent)));
    }
    rdga.exec(&mut input, &mut population, &params, &config).unwrap();
    assert_eq!(population.size(), 10);
}

#[test]
fn batch_is_trimmed_to_the_replacement_size() {
    let mut population =
        build::settled_point_population(4, 2, &[vec![1.0, 2.0], vec![2.0, 1.0]]);
    let (rdga, params, config) = rdga_setup(vec![3, 3], 1);
    let mut input = prepare(&rdga, &mut population, &params, &config);

    input.push(build::offspring(&mut population, vec![3.0, 3.0], Some(0)));
    input.push(build::offspring(&mut population, vec![4.0, 4.0], Some(1)));
    input.push(build::offspring(&mut population, vec![5.0, 5.0], Some(1)));
    rdga.exec(&mut input, &mut population, &params, &config).unwrap();

    // two offspring went back to the pool before insertion
    assert_eq!(population.size(), 2);
    let survivors: Vec<Vec<f64>> = build::raw_points(&population);
    assert!(survivors.contains(&vec![3.0, 3.0]));
    assert!(!survivors.contains(&vec![4.0, 4.0]));
    assert!(!survivors.contains(&vec![5.0, 5.0]));
}

#[test]
fn best_matrix_holds_the_top_rank_per_occupied_cell() {
    let points = [
        vec![1.0, 1.0],
        vec![1.2, 1.2],
        vec![4.0, 4.0],
        vec![4.2, 3.8],
        vec![2.5, 2.5],
    ];
    let mut population = build::point_population(8, 2, &points.to_vec());
    let (rdga, params, config) = rdga_setup(vec![3, 3], 0);
    let mut input = prepare(&rdga, &mut population, &params, &config);
    rdga.exec(&mut input, &mut population, &params, &config).unwrap();

    let matrix = population
        .population_tag::<BestCellMatrix>(params.best_matrix_tag)
        .unwrap();
    let hyper_box =
        TagGetter::<HyperBoxTag>::new(params.hyper_box_tag, population.chromosome_tag_manager())
            .unwrap();

    // group chromosomes by cell and verify the collected best of each
    let mut by_cell: std::collections::HashMap<usize, Vec<usize>> = Default::default();
    for (index, storage) in population.storages().iter().enumerate() {
        let cell = matrix.index_of(&hyper_box.get(storage.tags()).lock()).unwrap();
        by_cell.entry(cell).or_default().push(index);
    }
    for (cell, members) in by_cell {
        assert_eq!(matrix.cell(cell).count() as usize, members.len());
        let best = matrix.cell(cell).best().expect("occupied cell has a best");
        let best_rank = rank_of(&population, &params, best);
        for member in members {
            assert!(best_rank >= rank_of(&population, &params, member));
        }
    }
}

#[test]
fn clear_unregisters_the_replacement_tags() {
    let mut population = build::point_population(4, 2, &[vec![1.0, 2.0], vec![2.0, 1.0]]);
    let (rdga, params, config) = rdga_setup(vec![3, 3], 0);
    let mut input = prepare(&rdga, &mut population, &params, &config);

    assert!(population.chromosome_tag_manager().contains(params.rank_tag));
    assert!(population
        .population_tag::<UnrankedFront>(params.unranked_tag)
        .is_ok());
    assert!(population
        .population_tag::<ReplacementGrid>(params.grid_tag)
        .is_ok());
    assert!(population
        .population_tag::<PerBranchMatrices>(params.branch_matrices_tag)
        .is_ok());

    rdga.clear(&mut input, &mut population, &params, &config).unwrap();
    assert!(!population.chromosome_tag_manager().contains(params.rank_tag));
    assert!(population
        .population_tag::<BestCellMatrix>(params.best_matrix_tag)
        .is_err());
}
