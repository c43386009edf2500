//! Named statistical values with history, combiners and a dependency graph
//! of derived values.
pub mod combiner;
pub mod evaluator;
pub mod value;

pub use combiner::{Combiner, SelectionMode};
pub use evaluator::Evaluator;
pub use value::{HistoryBlock, StatValue};

use crate::errors::{CoreError, Result};
use nohash_hasher::IntMap;
use rustc_hash::FxHashMap;
use std::time::Instant;

/// Identifier of a statistical value. Ids are opaque integers owned by the
/// consumers that register the values.
pub type StatId = i32;

/// A group of tracked statistical values keyed by id, plus the generation
/// counter. Independent values can be combined across workers; evaluated
/// values are rewired and recomputed through the dependency graph kept
/// here.
#[derive(Debug, Default)]
pub struct Statistics {
    values: IntMap<StatId, StatValue>,
    dependants: FxHashMap<StatId, Vec<StatId>>,
    generation: usize,
    history_depth: usize,
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            values: IntMap::default(),
            dependants: FxHashMap::default(),
            generation: 0,
            history_depth: 10,
        }
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn contains(&self, id: StatId) -> bool {
        self.values.contains_key(&id)
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn value(&self, id: StatId) -> Result<&StatValue> {
        self.values
            .get(&id)
            .ok_or(CoreError::NotFound("no statistical value with this id"))
    }

    fn value_mut(&mut self, id: StatId) -> Result<&mut StatValue> {
        self.values
            .get_mut(&id)
            .ok_or(CoreError::NotFound("no statistical value with this id"))
    }

    /// Registers a value. Evaluated values are bound to their dependencies
    /// on the spot; a missing dependency fails with `NotFound` and leaves
    /// the group unchanged.
    pub fn add_value(&mut self, id: StatId, mut value: StatValue) -> Result<()> {
        if self.values.contains_key(&id) {
            return Err(CoreError::AlreadyExists(
                "statistical value id already registered",
            ));
        }
        if let Some(evaluator) = value.evaluator() {
            for dependency in evaluator.dependencies() {
                if !self.values.contains_key(&dependency) {
                    return Err(CoreError::NotFound("evaluator dependency not registered"));
                }
            }
            for dependency in evaluator.dependencies() {
                self.dependants.entry(dependency).or_default().push(id);
            }
        }
        if value.has_bound_history_depth() {
            value.set_history_depth(self.history_depth);
        }
        self.values.insert(id, value);
        self.refresh(id);
        Ok(())
    }

    pub fn remove_value(&mut self, id: StatId) -> Result<()> {
        let value = self
            .values
            .remove(&id)
            .ok_or(CoreError::NotFound("no statistical value with this id"))?;
        if let Some(evaluator) = value.evaluator() {
            for dependency in evaluator.dependencies() {
                if let Some(list) = self.dependants.get_mut(&dependency) {
                    list.retain(|&dependant| dependant != id);
                }
            }
        }
        self.dependants.remove(&id);
        Ok(())
    }

    /// Replaces the evaluator of a value, rewiring its dependency edges as
    /// one step; on a missing dependency nothing changes.
    pub fn set_evaluator(&mut self, id: StatId, evaluator: Evaluator) -> Result<()> {
        if !self.values.contains_key(&id) {
            return Err(CoreError::NotFound("no statistical value with this id"));
        }
        if evaluator.dependencies().contains(&id) {
            return Err(CoreError::InvalidArgument(
                "evaluated value cannot depend on itself",
            ));
        }
        for dependency in evaluator.dependencies() {
            if !self.values.contains_key(&dependency) {
                return Err(CoreError::NotFound("evaluator dependency not registered"));
            }
        }
        let old = self.values.get_mut(&id).expect("checked above");
        let previous = old.evaluator().copied();
        old.set_evaluator(Some(evaluator));
        if let Some(previous) = previous {
            for dependency in previous.dependencies() {
                if let Some(list) = self.dependants.get_mut(&dependency) {
                    list.retain(|&dependant| dependant != id);
                }
            }
        }
        for dependency in evaluator.dependencies() {
            self.dependants.entry(dependency).or_default().push(id);
        }
        self.refresh(id);
        Ok(())
    }

    /// Sets a value's current value and recomputes every transitively
    /// dependant evaluated value before returning.
    pub fn set_current(&mut self, id: StatId, value: f64) -> Result<()> {
        let target = self.value_mut(id)?;
        if target.is_evaluated() {
            return Err(CoreError::InvalidOperation(
                "set_current invoked on an evaluated value",
            ));
        }
        target.set_current(value);
        self.propagate(id);
        Ok(())
    }

    /// Recomputes `id` itself (when evaluated) and its dependants.
    fn refresh(&mut self, id: StatId) {
        if let Some(evaluator) = self.values.get(&id).and_then(|v| v.evaluator().copied()) {
            let result = evaluator.evaluate(|dep| self.values.get(&dep).and_then(|v| v.current()));
            if let (Some(result), Some(value)) = (result, self.values.get_mut(&id)) {
                value.set_current(result);
            }
        }
        self.propagate(id);
    }

    fn propagate(&mut self, changed: StatId) {
        let mut queue = vec![changed];
        let mut visited = rustc_hash::FxHashSet::default();
        while let Some(id) = queue.pop() {
            let Some(dependants) = self.dependants.get(&id) else {
                continue;
            };
            for dependant in dependants.clone() {
                if !visited.insert(dependant) {
                    continue;
                }
                let Some(evaluator) = self
                    .values
                    .get(&dependant)
                    .and_then(|v| v.evaluator().copied())
                else {
                    continue;
                };
                let result =
                    evaluator.evaluate(|dep| self.values.get(&dep).and_then(|v| v.current()));
                if let Some(result) = result {
                    if let Some(value) = self.values.get_mut(&dependant) {
                        value.set_current(result);
                        queue.push(dependant);
                    }
                }
            }
        }
    }

    /// Combines every combinable value with its counterpart from another
    /// snapshot (per-worker statistics folding).
    pub fn combine(&mut self, other: &Statistics) -> Result<()> {
        let ids: Vec<StatId> = self.values.keys().copied().collect();
        for id in ids {
            let value = self.values.get_mut(&id).expect("listed id");
            if value.is_combinable() {
                if let Ok(source) = other.value(id) {
                    value.combine(source)?;
                }
            }
        }
        Ok(())
    }

    /// Rotates every value's current value into its history and advances
    /// the generation counter.
    pub fn next(&mut self) -> Result<()> {
        for value in self.values.values_mut() {
            value.next()?;
        }
        self.generation += 1;
        Ok(())
    }

    pub fn clear(&mut self, keep_generation_counter: bool) {
        for value in self.values.values_mut() {
            value.clear();
        }
        if !keep_generation_counter {
            self.generation = 0;
        }
    }

    pub fn clear_current(&mut self) {
        for value in self.values.values_mut() {
            value.clear_current();
        }
    }

    /// Sets the preferred history depth; every value bound to it follows.
    pub fn set_history_depth(&mut self, depth: usize) {
        self.history_depth = depth;
        for value in self.values.values_mut() {
            if value.has_bound_history_depth() {
                value.set_history_depth(depth);
            }
        }
    }

    pub fn history_depth(&self) -> usize {
        self.history_depth
    }
}

/// Measures an operation and records the elapsed seconds into a timing
/// statistic, creating the value on first use.
#[derive(Debug)]
pub struct OperationTimer {
    id: StatId,
    start: Instant,
}

impl OperationTimer {
    pub fn new(id: StatId) -> Self {
        Self {
            id,
            start: Instant::now(),
        }
    }

    pub fn record(self, statistics: &mut Statistics) {
        let elapsed = self.start.elapsed().as_secs_f64();
        if !statistics.contains(self.id) {
            let value = StatValue::independent(Some(Combiner::Sum)).with_accumulation();
            statistics
                .add_value(self.id, value)
                .expect("fresh timing value id");
        }
        statistics
            .set_current(self.id, elapsed)
            .expect("timing value is independent");
    }
}
