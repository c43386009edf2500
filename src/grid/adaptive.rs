//! Adaptive hypergrid: user-specified cell counts, cell sizes derived from
//! the running bounding box of observed points.
use super::{GridBounds, HyperGrid};
use crate::errors::{CoreError, Result};
use itertools::Itertools;

/// Divides the space into a fixed number of cells per dimension; the
/// concrete cell sizes follow the observed bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptiveGrid {
    cell_counts: Vec<usize>,
}

impl AdaptiveGrid {
    pub fn new(cell_counts: Vec<usize>) -> Result<Self> {
        if cell_counts.iter().any(|&count| count == 0) {
            return Err(CoreError::InvalidArgument(
                "cell counts must be at least one",
            ));
        }
        Ok(Self { cell_counts })
    }

    pub fn dimension_count(&self) -> usize {
        self.cell_counts.len()
    }

    pub fn cell_counts(&self) -> &[usize] {
        &self.cell_counts
    }

    /// Widens the running bounding box to include `point`.
    pub fn update_bounds(&self, point: &[f64], bounds: &mut GridBounds) {
        for index in (0..point.len()).rev() {
            let value = point[index];
            if value < bounds.lower()[index] {
                bounds.lower_mut()[index] = value;
            }
            if value > bounds.upper()[index] {
                bounds.upper_mut()[index] = value;
            }
        }
    }

    /// Creates or resizes the fixed grid so the bounding box is enclosed
    /// with one cell of margin on each side: the cell size on dimension i
    /// is `(dᵢ + 2·dᵢ/nᵢ)/nᵢ` for box extent `dᵢ` and cell count `nᵢ`.
    pub fn update_hyper_grid(&self, bounds: &GridBounds, grid: &mut Option<HyperGrid>) {
        let dimension_count = self.cell_counts.len();
        let target = grid.get_or_insert_with(|| HyperGrid::unsized_with_dimensions(dimension_count));
        if target.dimension_count() != dimension_count {
            target.set_dimension_count(dimension_count);
        }

        for (index, (low, up)) in bounds
            .lower()
            .iter()
            .zip_eq(bounds.upper().iter())
            .enumerate()
        {
            let extent = up - low;
            let count = self.cell_counts[index] as f64;
            let size = (extent + 2.0 * extent / count) / count;
            target
                .set_cell_size(index, size)
                .expect("dimension exists after resize");
        }
    }
}
