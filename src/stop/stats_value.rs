use super::{criterion_reached, StopCriterion, StopMode};
use crate::statistics::{StatId, Statistics};

/// Stops when a tracked value reaches the desired value in one of the
/// accepted modes. An unknown or still-empty value never stops the loop.
#[derive(Debug, Clone)]
pub struct StatsValue {
    pub value_id: StatId,
    pub desired: f64,
    pub mode: StopMode,
}

impl StatsValue {
    pub fn new(value_id: StatId, desired: f64, mode: StopMode) -> Self {
        Self {
            value_id,
            desired,
            mode,
        }
    }
}

impl StopCriterion for StatsValue {
    fn call(&self, statistics: &Statistics) -> bool {
        statistics
            .value(self.value_id)
            .ok()
            .and_then(|value| value.current())
            .map_or(false, |current| {
                criterion_reached(current, self.desired, self.mode)
            })
    }
}
