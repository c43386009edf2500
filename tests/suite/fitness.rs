use crate::support::{assert_relative_eq, SeedableRng, SmallRng};
use multiobjective_ga::errors::CoreError;
use multiobjective_ga::fitness::comparators::{
    CompareParams, ComparatorSetup, Dominance, FitnessComparator, Objective, Positional, Sense,
    Simple,
};
use multiobjective_ga::fitness::{Fitness, FitnessParams, Probability};

#[test]
fn arithmetic_is_component_wise() {
    let mut left = Fitness::multi(vec![1.0, 2.0, 3.0]);
    let right = Fitness::multi(vec![0.5, 1.0, 1.5]);
    left += &right;
    assert_eq!(left.values(), &[1.5, 3.0, 4.5]);
    left -= &right;
    assert_eq!(left.values(), &[1.0, 2.0, 3.0]);
    left /= 2;
    assert_eq!(left.values(), &[0.5, 1.0, 1.5]);

    let sum = &Fitness::single(3.0) + &Fitness::single(4.0);
    assert_eq!(sum.values(), &[7.0]);
}

#[test]
fn weighted_sum_follows_every_mutation() {
    let mut fitness = Fitness::weighted(vec![1.0, 2.0], vec![2.0, 3.0]).unwrap();
    let params = FitnessParams::new(2, 0).unwrap();
    assert_relative_eq!(fitness.probability_base(&params), 8.0);

    fitness.set_value_at(0, 3.0).unwrap();
    assert_relative_eq!(fitness.probability_base(&params), 12.0);

    let other = Fitness::weighted(vec![1.0, 1.0], vec![2.0, 3.0]).unwrap();
    fitness += &other;
    assert_relative_eq!(fitness.probability_base(&params), 17.0);

    assert!(matches!(
        Fitness::weighted(vec![1.0], vec![1.0, 2.0]).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
}

#[test]
fn probability_base_per_shape() {
    let params = FitnessParams::new(3, 1).unwrap();
    assert_eq!(Fitness::single(4.0).probability_base(&params), 4.0);
    assert_eq!(
        Fitness::multi(vec![1.0, 2.0, 3.0]).probability_base(&params),
        2.0
    );
}

#[test]
fn probability_base_index_rotates_and_wraps() {
    let mut params = FitnessParams::new(3, 0).unwrap();
    params.next_probability_index();
    assert_eq!(params.probability_base_index(), 1);
    params.next_probability_index();
    params.next_probability_index();
    assert_eq!(params.probability_base_index(), 0);

    assert!(matches!(
        params.set_probability_base_index(3).unwrap_err(),
        CoreError::OutOfRange(_)
    ));
    assert!(matches!(
        FitnessParams::new(2, 2).unwrap_err(),
        CoreError::OutOfRange(_)
    ));
    assert!(matches!(
        FitnessParams::new(0, 0).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
}

#[test]
fn distance_is_absolute_or_euclidean() {
    assert_relative_eq!(Fitness::single(3.0).distance(&Fitness::single(7.5)), 4.5);
    let a = Fitness::multi(vec![0.0, 0.0]);
    let b = Fitness::multi(vec![3.0, 4.0]);
    assert_relative_eq!(a.distance(&b), 5.0);
}

#[test]
fn shape_mismatch_is_invalid_argument() {
    let a = Fitness::multi(vec![1.0, 2.0]);
    let b = Fitness::multi(vec![1.0, 2.0, 3.0]);
    assert!(matches!(
        a.check_same_shape(&b).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
    assert!(matches!(
        a.check_same_shape(&Fitness::single(1.0)).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
}

#[test]
fn simple_comparator_follows_the_sense() {
    let maximize = CompareParams::new(Sense::MaximizeAll);
    let minimize = CompareParams::new(Sense::MinimizeAll);
    let better = Fitness::single(5.0);
    let worse = Fitness::single(2.0);
    // negative result means the first operand is better
    assert!(Simple.compare(&better, &worse, &maximize) < 0);
    assert!(Simple.compare(&better, &worse, &minimize) > 0);
    assert_eq!(Simple.compare(&better, &better, &maximize), 0);
}

#[test]
fn positional_comparator_decides_on_the_first_difference() {
    let params = CompareParams::new(Sense::MaximizeAll);
    let a = Fitness::multi(vec![1.0, 9.0, 0.0]);
    let b = Fitness::multi(vec![1.0, 2.0, 5.0]);
    assert!(Positional.compare(&a, &b, &params) < 0);
    assert!(Positional.compare(&b, &a, &params) > 0);
}

#[test]
fn dominance_comparator_detects_incomparable_pairs() {
    let params = CompareParams::new(Sense::MaximizeAll);
    let a = Fitness::multi(vec![3.0, 3.0]);
    let b = Fitness::multi(vec![2.0, 4.0]);
    let c = Fitness::multi(vec![1.0, 1.0]);
    assert_eq!(Dominance.compare(&a, &b, &params), 0);
    assert!(Dominance.compare(&a, &c, &params) < 0);
    assert!(Dominance.compare(&c, &b, &params) > 0);
    // equal on one objective, better on the other still dominates
    let d = Fitness::multi(vec![3.0, 2.0]);
    assert!(Dominance.compare(&a, &d, &params) < 0);
}

#[test]
fn objective_comparator_uses_the_chosen_index() {
    let params = CompareParams::with_objective(Sense::MaximizeAll, 1);
    let a = Fitness::multi(vec![9.0, 1.0]);
    let b = Fitness::multi(vec![0.0, 2.0]);
    assert!(Objective.compare(&a, &b, &params) > 0);
}

#[test]
fn weighted_fitness_compares_by_sum() {
    let setup = ComparatorSetup::new(Simple, CompareParams::new(Sense::MaximizeAll));
    let a = Fitness::weighted(vec![1.0, 1.0], vec![1.0, 10.0]).unwrap();
    let b = Fitness::weighted(vec![4.0, 0.5], vec![1.0, 10.0]).unwrap();
    // a's weighted sum is 11, b's is 9
    assert!(setup.compare(&a, &b) < 0);
}

#[test]
fn probability_validates_its_range() {
    assert!(matches!(
        Probability::new(1.5).unwrap_err(),
        CoreError::OutOfRange(_)
    ));
    assert!(matches!(
        Probability::new(-0.1).unwrap_err(),
        CoreError::OutOfRange(_)
    ));

    let mut rng = SmallRng::seed_from_u64(7);
    let always = Probability::new(1.0).unwrap();
    let never = Probability::new(0.0).unwrap();
    for _ in 0..32 {
        assert!(always.gate(&mut rng));
        assert!(!never.gate(&mut rng));
    }
}
