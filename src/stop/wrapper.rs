pub use super::generation_count::GenerationCount as StopGenerationCount;
pub use super::stats_changes::StatsChanges as StopStatsChanges;
pub use super::stats_progress::StatsProgress as StopStatsProgress;
pub use super::stats_value::StatsValue as StopStatsValue;
pub use super::StopCriterion;

use crate::statistics::Statistics;

#[derive(Debug, Clone)]
pub enum Wrapper {
    GenerationCount(StopGenerationCount),
    StatsValue(StopStatsValue),
    StatsProgress(StopStatsProgress),
    StatsChanges(StopStatsChanges),
}

impl StopCriterion for Wrapper {
    fn call(&self, statistics: &Statistics) -> bool {
        match self {
            Wrapper::GenerationCount(criterion) => criterion.call(statistics),
            Wrapper::StatsValue(criterion) => criterion.call(statistics),
            Wrapper::StatsProgress(criterion) => criterion.call(statistics),
            Wrapper::StatsChanges(criterion) => criterion.call(statistics),
        }
    }
}

impl From<StopGenerationCount> for Wrapper {
    fn from(criterion: StopGenerationCount) -> Self {
        Wrapper::GenerationCount(criterion)
    }
}
impl From<StopStatsValue> for Wrapper {
    fn from(criterion: StopStatsValue) -> Self {
        Wrapper::StatsValue(criterion)
    }
}
impl From<StopStatsProgress> for Wrapper {
    fn from(criterion: StopStatsProgress) -> Self {
        Wrapper::StatsProgress(criterion)
    }
}
impl From<StopStatsChanges> for Wrapper {
    fn from(criterion: StopStatsChanges) -> Self {
        Wrapper::StatsChanges(criterion)
    }
}
