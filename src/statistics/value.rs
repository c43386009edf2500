//! A single tracked statistical value with run-length history.
use super::combiner::Combiner;
use super::evaluator::Evaluator;
use crate::errors::{CoreError, Result};
use std::collections::VecDeque;

/// A run of consecutive equal values in the history buffer, stored
/// compressed as the value plus its repeat count.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBlock {
    pub value: f64,
    pub len: usize,
}

/// A named statistical value: the current value, a bounded history of past
/// values (consecutive duplicates compressed into blocks), change tracking
/// and an optional running total.
///
/// *Independent* values carry a [Combiner] so per-worker snapshots can be
/// folded together; *evaluated* values carry an [Evaluator] and are
/// recomputed whenever one of their dependencies changes.
#[derive(Debug, Clone)]
pub struct StatValue {
    current: Option<f64>,
    history: VecDeque<HistoryBlock>,
    max_depth: usize,
    stored_depth: usize,
    bound_depth: bool,
    last_change: usize,
    accumulating: bool,
    accumulated: Option<f64>,
    combiner: Option<Combiner>,
    evaluator: Option<Evaluator>,
}

impl StatValue {
    /// An independent value whose history depth follows the owning
    /// statistics object's preferred depth.
    pub fn independent(combiner: Option<Combiner>) -> Self {
        Self {
            current: None,
            history: VecDeque::new(),
            max_depth: 0,
            stored_depth: 0,
            bound_depth: true,
            last_change: 0,
            accumulating: false,
            accumulated: None,
            combiner,
            evaluator: None,
        }
    }

    /// An evaluated value, recomputed from its dependencies.
    pub fn evaluated(evaluator: Evaluator) -> Self {
        let mut value = Self::independent(None);
        value.evaluator = Some(evaluator);
        value
    }

    /// Unbinds the history depth from the statistics object's preferred
    /// depth and fixes it to `depth`.
    pub fn with_free_history_depth(mut self, depth: usize) -> Self {
        self.bound_depth = false;
        self.max_depth = depth;
        self
    }

    /// Enables summing every value pushed to history into a running total.
    pub fn with_accumulation(mut self) -> Self {
        self.accumulating = true;
        self
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluator.is_some()
    }

    pub fn is_combinable(&self) -> bool {
        self.combiner.is_some()
    }

    pub fn evaluator(&self) -> Option<&Evaluator> {
        self.evaluator.as_ref()
    }

    pub(super) fn set_evaluator(&mut self, evaluator: Option<Evaluator>) {
        self.evaluator = evaluator;
    }

    pub fn has_bound_history_depth(&self) -> bool {
        self.bound_depth
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }

    /// The current value; `InvalidOperation` when it was never set or has
    /// been cleared.
    pub fn current_value(&self) -> Result<f64> {
        self.current
            .ok_or(CoreError::InvalidOperation("statistical value is empty"))
    }

    pub fn set_current(&mut self, value: f64) {
        self.current = Some(value);
    }

    /// Folds another snapshot of this value into the current one using the
    /// installed combiner. Evaluated values cannot be combined.
    pub fn combine(&mut self, other: &StatValue) -> Result<()> {
        if self.is_evaluated() {
            return Err(CoreError::InvalidOperation(
                "combine invoked on an evaluated value",
            ));
        }
        let combiner = self
            .combiner
            .ok_or(CoreError::InvalidOperation("value has no combiner"))?;
        combiner.combine(&mut self.current, other.current);
        Ok(())
    }

    /// Rotates the current value into history. Merges with the newest block
    /// when equal (advancing the unchanged-generations counter), otherwise
    /// starts a new block and resets it; evicts the oldest entry when full.
    pub fn next(&mut self) -> Result<()> {
        let current = self.current_value()?;

        if self.accumulating {
            self.accumulated = Some(self.accumulated.unwrap_or(0.0) + current);
        }

        if self.max_depth == 0 {
            return Ok(());
        }

        if self.stored_depth == 0 {
            self.history.push_back(HistoryBlock {
                value: current,
                len: 1,
            });
            self.stored_depth = 1;
            return Ok(());
        }

        let newest = self.history.back_mut().expect("nonempty history");
        let changed = newest.value != current;
        if changed {
            self.last_change = 0;
        } else {
            newest.len += 1;
            self.last_change += 1;
        }

        if self.stored_depth < self.max_depth {
            if changed {
                self.history.push_back(HistoryBlock {
                    value: current,
                    len: 1,
                });
            }
            self.stored_depth += 1;
        } else {
            // full buffer: the oldest entry makes room for the new one
            let oldest = self.history.front_mut().expect("nonempty history");
            if oldest.len == 1 {
                self.history.pop_front();
            } else {
                oldest.len -= 1;
            }
            if changed {
                self.history.push_back(HistoryBlock {
                    value: current,
                    len: 1,
                });
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.stored_depth = 0;
        self.last_change = 0;
        self.current = None;
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Changes the history capacity, trimming oldest entries first; a block
    /// that only partially overflows is shrunk.
    pub fn set_history_depth(&mut self, depth: usize) {
        if depth < self.stored_depth {
            let mut excess = self.stored_depth - depth;
            while excess > 0 {
                let oldest = self.history.front_mut().expect("nonempty history");
                if oldest.len <= excess {
                    excess -= oldest.len;
                    self.history.pop_front();
                } else {
                    oldest.len -= excess;
                    excess = 0;
                }
            }
            self.stored_depth = depth;
        }
        self.max_depth = depth;
    }

    pub fn history_depth(&self) -> usize {
        self.max_depth
    }

    pub fn stored_depth(&self) -> usize {
        self.stored_depth
    }

    pub fn is_history_full(&self) -> bool {
        self.stored_depth == self.max_depth
    }

    pub fn history_blocks(&self) -> impl Iterator<Item = &HistoryBlock> {
        self.history.iter()
    }

    /// Generations in a row the value entered history unchanged.
    pub fn last_change(&self) -> usize {
        self.last_change
    }

    pub fn accumulated(&self) -> Option<f64> {
        self.accumulated
    }

    /// The value stored `depth` generations back. Depth 0 is the current
    /// value; a depth beyond the stored history yields the oldest entry.
    pub fn previous(&self, depth: usize) -> Result<f64> {
        if depth == 0 {
            return self.current_value();
        }
        if self.stored_depth == 0 {
            return Err(CoreError::InvalidOperation("history is empty"));
        }
        if depth > self.stored_depth {
            return Ok(self.history.front().expect("nonempty history").value);
        }
        let mut covered = 0;
        for block in self.history.iter().rev() {
            covered += block.len;
            if depth <= covered {
                return Ok(block.value);
            }
        }
        Ok(self.history.front().expect("nonempty history").value)
    }

    /// Whether the entry `depth` back differs from the newest history
    /// entry.
    pub fn is_changed(&self, depth: usize) -> bool {
        if depth == 0 || self.stored_depth == 0 {
            return false;
        }
        let newest = self.history.back().expect("nonempty history").value;
        if depth > self.stored_depth {
            return self.history.front().expect("nonempty history").value != newest;
        }
        let mut covered = 0;
        for block in self.history.iter().rev() {
            covered += block.len;
            if depth <= covered {
                return block.value != newest;
            }
        }
        false
    }

    /// Absolute progress: current minus the value `depth` generations back.
    pub fn progress(&self, depth: usize) -> Result<f64> {
        Ok(self.current_value()? - self.previous(depth)?)
    }

    /// Relative progress against the value `depth` generations back.
    pub fn relative_progress(&self, depth: usize) -> Result<f64> {
        let previous = self.previous(depth)?;
        Ok(((self.current_value()? - previous) / previous).abs())
    }
}
