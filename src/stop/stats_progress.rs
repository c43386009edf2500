use super::{criterion_reached, StopCriterion, StopMode};
use crate::statistics::{StatId, Statistics};

/// Stops when a tracked value's progress over a history window reaches the
/// desired value. Progress is absolute by default, or relative when so
/// configured; the criterion stays silent until the recorded history is at
/// least `depth` deep.
#[derive(Debug, Clone)]
pub struct StatsProgress {
    pub value_id: StatId,
    pub depth: usize,
    pub desired: f64,
    pub mode: StopMode,
    pub relative: bool,
}

impl StatsProgress {
    pub fn absolute(value_id: StatId, depth: usize, desired: f64, mode: StopMode) -> Self {
        Self {
            value_id,
            depth,
            desired,
            mode,
            relative: false,
        }
    }

    pub fn relative(value_id: StatId, depth: usize, desired: f64, mode: StopMode) -> Self {
        Self {
            value_id,
            depth,
            desired,
            mode,
            relative: true,
        }
    }
}

impl StopCriterion for StatsProgress {
    fn call(&self, statistics: &Statistics) -> bool {
        let Ok(value) = statistics.value(self.value_id) else {
            return false;
        };
        if value.stored_depth() < self.depth {
            return false;
        }
        let progress = if self.relative {
            value.relative_progress(self.depth)
        } else {
            value.progress(self.depth)
        };
        progress.map_or(false, |progress| {
            criterion_reached(progress, self.desired, self.mode)
        })
    }
}
