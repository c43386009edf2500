use multiobjective_ga::statistics::{StatValue, Statistics};
use multiobjective_ga::stop::{
    GenerationCount, StatsChanges, StatsProgress, StatsValue, StopCriterion, StopMode, Wrapper,
};

const SCORE: i32 = 1;

/// Statistics with `values` rotated into the tracked value's history, one
/// generation per value.
fn tracked_statistics(values: &[f64]) -> Statistics {
    let mut statistics = Statistics::new();
    statistics
        .add_value(SCORE, StatValue::independent(None))
        .unwrap();
    for &value in values {
        statistics.set_current(SCORE, value).unwrap();
        statistics.next().unwrap();
    }
    statistics
}

#[test]
fn generation_count_fires_at_the_target() {
    let statistics = tracked_statistics(&[1.0, 2.0, 3.0]);
    assert!(!GenerationCount::new(4).call(&statistics));
    assert!(GenerationCount::new(3).call(&statistics));
    assert!(GenerationCount::new(2).call(&statistics));
}

#[test]
fn stats_value_respects_the_mode_bitmask() {
    let statistics = tracked_statistics(&[5.0]);

    assert!(StatsValue::new(SCORE, 4.0, StopMode::HIGHER).call(&statistics));
    assert!(!StatsValue::new(SCORE, 5.0, StopMode::HIGHER).call(&statistics));
    assert!(StatsValue::new(SCORE, 5.0, StopMode::HIGHER | StopMode::EQUAL).call(&statistics));
    assert!(StatsValue::new(SCORE, 6.0, StopMode::LOWER).call(&statistics));
    assert!(!StatsValue::new(SCORE, 5.0, StopMode::LOWER).call(&statistics));

    // unknown values never stop the loop
    assert!(!StatsValue::new(99, 0.0, StopMode::HIGHER | StopMode::LOWER).call(&statistics));
}

#[test]
fn stats_progress_waits_for_enough_history() {
    let mut statistics = tracked_statistics(&[1.0]);
    // this generation's value is not rotated into history yet
    statistics.set_current(SCORE, 2.0).unwrap();

    let shallow = StatsProgress::absolute(SCORE, 3, 0.5, StopMode::HIGHER);
    assert!(!shallow.call(&statistics));

    let progress = StatsProgress::absolute(SCORE, 1, 0.5, StopMode::HIGHER);
    assert!(progress.call(&statistics));
    let too_much = StatsProgress::absolute(SCORE, 1, 1.0, StopMode::HIGHER);
    assert!(!too_much.call(&statistics));
}

#[test]
fn relative_progress_is_measured_against_the_past_value() {
    let mut statistics = tracked_statistics(&[10.0]);
    statistics.set_current(SCORE, 11.0).unwrap();

    // progress of 1.0 against 10.0 is a relative 0.1
    let stalled = StatsProgress::relative(SCORE, 1, 0.2, StopMode::LOWER);
    assert!(stalled.call(&statistics));
    let moving = StatsProgress::relative(SCORE, 1, 0.05, StopMode::LOWER);
    assert!(!moving.call(&statistics));
}

#[test]
fn stats_changes_counts_flat_generations() {
    // four equal entries merge into one block over three generations
    let statistics = tracked_statistics(&[4.0, 4.0, 4.0, 4.0]);
    assert!(StatsChanges::new(SCORE, 3).call(&statistics));
    assert!(StatsChanges::new(SCORE, 2).call(&statistics));
    assert!(!StatsChanges::new(SCORE, 4).call(&statistics));

    let changing = tracked_statistics(&[1.0, 2.0]);
    assert!(!StatsChanges::new(SCORE, 1).call(&changing));
}

#[test]
fn wrapper_dispatches_to_the_selected_criterion() {
    let statistics = tracked_statistics(&[1.0, 2.0]);
    let criterion: Wrapper = GenerationCount::new(2).into();
    assert!(criterion.call(&statistics));
    let criterion: Wrapper = StatsValue::new(SCORE, 3.0, StopMode::HIGHER).into();
    assert!(!criterion.call(&statistics));
}
