//! Combining per-worker snapshots of an independent statistical value.
use ordered_float::OrderedFloat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Greater,
    Lower,
}

/// Folds a source snapshot into a destination value. An empty destination
/// simply takes the source; an empty source changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combiner {
    /// Keeps the greater or the lower of the two values.
    Selection(SelectionMode),
    /// Sums the two values.
    Sum,
}

impl Combiner {
    pub fn combine(&self, destination: &mut Option<f64>, source: Option<f64>) {
        let Some(source) = source else {
            return;
        };
        let Some(current) = *destination else {
            *destination = Some(source);
            return;
        };
        match self {
            Combiner::Selection(mode) => {
                let take = match mode {
                    SelectionMode::Greater => OrderedFloat(source) > OrderedFloat(current),
                    SelectionMode::Lower => OrderedFloat(source) < OrderedFloat(current),
                };
                if take {
                    *destination = Some(source);
                }
            }
            Combiner::Sum => *destination = Some(current + source),
        }
    }
}
