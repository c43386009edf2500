use super::StopCriterion;
use crate::statistics::{StatId, Statistics};

/// Stops once a tracked value has entered history unchanged for the
/// configured number of generations.
#[derive(Debug, Clone)]
pub struct StatsChanges {
    pub value_id: StatId,
    pub generations: usize,
}

impl StatsChanges {
    pub fn new(value_id: StatId, generations: usize) -> Self {
        Self {
            value_id,
            generations,
        }
    }
}

impl StopCriterion for StatsChanges {
    fn call(&self, statistics: &Statistics) -> bool {
        statistics
            .value(self.value_id)
            .map_or(false, |value| value.last_change() >= self.generations)
    }
}
