//! Fixed hypergrid: user-specified cell sizes.
use super::{GridBounds, HyperBox};
use crate::errors::{CoreError, Result};

/// Divides the space into cells of fixed per-dimension size.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperGrid {
    cell_sizes: Vec<f64>,
}

impl HyperGrid {
    pub fn new(cell_sizes: Vec<f64>) -> Result<Self> {
        if cell_sizes.iter().any(|&size| size <= 0.0) {
            return Err(CoreError::InvalidArgument("cell sizes must be positive"));
        }
        Ok(Self { cell_sizes })
    }

    /// A grid whose cell sizes are still to be assigned, as produced when
    /// an adaptive grid creates its fixed counterpart.
    pub fn unsized_with_dimensions(dimension_count: usize) -> Self {
        Self {
            cell_sizes: vec![0.0; dimension_count],
        }
    }

    pub fn dimension_count(&self) -> usize {
        self.cell_sizes.len()
    }

    pub fn set_dimension_count(&mut self, count: usize) {
        self.cell_sizes.resize(count, 0.0);
    }

    pub fn cell_sizes(&self) -> &[f64] {
        &self.cell_sizes
    }

    pub fn set_cell_size(&mut self, dimension: usize, size: f64) -> Result<()> {
        if dimension >= self.cell_sizes.len() {
            return Err(CoreError::InvalidArgument("dimension does not exist"));
        }
        self.cell_sizes[dimension] = size;
        Ok(())
    }

    /// Cell containing `point`, with the grid anchored at zero. Truncated
    /// quotients that would collapse small negative coordinates onto cell 0
    /// are pushed down one cell, so −0.4/1.0 lands in cell −1.
    pub fn hyper_box(&self, point: &[f64]) -> HyperBox {
        let mut hyper_box = HyperBox::zeroed(self.cell_sizes.len());
        for index in (0..self.cell_sizes.len()).rev() {
            let cell = (point[index] / self.cell_sizes[index]) as i64;
            hyper_box[index] = if cell == 0 && point[index] < 0.0 {
                cell - 1
            } else {
                cell
            };
        }
        hyper_box
    }

    /// Cell containing `point` relative to `origin`, the lowest point the
    /// grid covers; quotients are non-negative by construction.
    pub fn hyper_box_from_origin(&self, point: &[f64], origin: &[f64]) -> HyperBox {
        let mut hyper_box = HyperBox::zeroed(self.cell_sizes.len());
        for index in (0..self.cell_sizes.len()).rev() {
            hyper_box[index] = ((point[index] - origin[index]) / self.cell_sizes[index]) as i64;
        }
        hyper_box
    }

    /// Point range of a cell: `low = origin + c·size`, `up = low + size`.
    pub fn hyper_box_bounds(&self, hyper_box: &HyperBox, origin: &[f64], bounds: &mut GridBounds) {
        if bounds.dimension_count() != self.cell_sizes.len() {
            *bounds = GridBounds::new(self.cell_sizes.len());
        }
        for index in (0..self.cell_sizes.len()).rev() {
            let low = origin[index] + hyper_box[index] as f64 * self.cell_sizes[index];
            bounds.lower_mut()[index] = low;
            bounds.upper_mut()[index] = low + self.cell_sizes[index];
        }
    }
}
