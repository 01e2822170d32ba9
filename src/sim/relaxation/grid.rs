use ndarray::{Array2, ArrayView2, s};
use serde::{Deserialize, Serialize};

use super::error::RelaxationError;

/// Smallest side length that still leaves one interior cell.
pub const MIN_SIDE: usize = 3;

/// Fixed temperatures assigned to the four edges of a trap.
///
/// Left and right columns are written first, then the top and bottom rows,
/// so the four corner cells carry the top/bottom values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConditions {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl BoundaryConditions {
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Same temperature on every edge.
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }
}

impl Default for BoundaryConditions {
    /// Warm lid over a frozen trap.
    fn default() -> Self {
        Self::new(40.0, -237.15, -237.15, -237.15)
    }
}

/// Temperature field of a trap, stored as `(height, width)`.
///
/// The outer ring of cells holds Dirichlet values. Step functions only ever
/// write to the interior `[1..height-1, 1..width-1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cells: Array2<f64>,
}

impl Grid {
    /// Create a trap with a zero interior and the given edges.
    pub fn new(
        width: usize,
        height: usize,
        boundary: BoundaryConditions,
    ) -> Result<Self, RelaxationError> {
        Self::with_interior(width, height, boundary, 0.0)
    }

    /// Create a trap with every interior cell set to `initial`.
    pub fn with_interior(
        width: usize,
        height: usize,
        boundary: BoundaryConditions,
        initial: f64,
    ) -> Result<Self, RelaxationError> {
        if width < MIN_SIDE || height < MIN_SIDE {
            return Err(RelaxationError::InvalidDimension { width, height });
        }

        let mut cells = Array2::from_elem((height, width), initial);
        cells.column_mut(0).fill(boundary.left);
        cells.column_mut(width - 1).fill(boundary.right);
        cells.row_mut(0).fill(boundary.top);
        cells.row_mut(height - 1).fill(boundary.bottom);

        Ok(Self { cells })
    }

    /// Wrap an existing `(height, width)` array. Any shape is accepted,
    /// including ones without interior cells.
    pub fn from_array(cells: Array2<f64>) -> Self {
        Self { cells }
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    /// `(height, width)`.
    pub fn dim(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// True when there is no interior cell to update.
    pub fn is_degenerate(&self) -> bool {
        self.width() < MIN_SIDE || self.height() < MIN_SIDE
    }

    /// Number of interior cells.
    pub fn interior_len(&self) -> usize {
        if self.is_degenerate() {
            0
        } else {
            (self.width() - 2) * (self.height() - 2)
        }
    }

    pub fn get(&self, y: usize, x: usize) -> Option<f64> {
        self.cells.get((y, x)).copied()
    }

    pub fn cells(&self) -> ArrayView2<'_, f64> {
        self.cells.view()
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Array2<f64> {
        &mut self.cells
    }

    /// View of the interior cells, or `None` for a degenerate grid.
    pub fn interior(&self) -> Option<ArrayView2<'_, f64>> {
        if self.is_degenerate() {
            return None;
        }
        Some(self.cells.slice(s![1..-1, 1..-1]))
    }

    /// Copy of every boundary cell, walked clockwise from the top-left corner.
    pub fn boundary_values(&self) -> Vec<f64> {
        let (h, w) = self.dim();
        if h == 0 || w == 0 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(2 * (h + w));
        out.extend(self.cells.row(0).iter().copied());
        for y in 1..h {
            out.push(self.cells[[y, w - 1]]);
        }
        if h > 1 {
            out.extend(self.cells.row(h - 1).iter().rev().skip(1).copied());
        }
        if w > 1 {
            for y in (1..h.saturating_sub(1)).rev() {
                out.push(self.cells[[y, 0]]);
            }
        }
        out
    }

    pub fn into_array(self) -> Array2<f64> {
        self.cells
    }
}
