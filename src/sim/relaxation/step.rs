use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView2, Axis, Zip, s};
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::error::RelaxationError;
use super::grid::Grid;

/// One relaxation pass over the interior of a [`Grid`].
///
/// Implementations differ only in the order cells are visited and in which
/// neighbor values they read; all of them leave the boundary ring untouched
/// and return the summed absolute change of the pass.
pub trait StepFunction {
    /// Short scheme name used in logs and result records.
    fn name(&self) -> &'static str;

    /// Relax every interior cell once and return the delta.
    ///
    /// A grid without interior cells yields `0.0`.
    fn step(&mut self, grid: &mut Grid, omega: f64) -> f64;
}

impl<S: StepFunction + ?Sized> StepFunction for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn step(&mut self, grid: &mut Grid, omega: f64) -> f64 {
        (**self).step(grid, omega)
    }
}

/// Weighted average of the four neighbors and the cell itself.
#[inline]
pub fn relax_cell(omega: f64, up: f64, down: f64, left: f64, right: f64, current: f64) -> f64 {
    (omega / 4.0) * (up + down + left + right) + (1.0 - omega) * current
}

/// Single Jacobi pass with a throwaway scratch layer.
pub fn step(grid: &mut Grid, omega: f64) -> f64 {
    JacobiStep::new().step(grid, omega)
}

/// Jacobi update built from shifted slices of the grid.
///
/// The new interior goes into a scratch layer first and is committed in one
/// assignment, so no cell sees a neighbor value from the same pass.
#[derive(Debug, Clone)]
pub struct JacobiStep {
    scratch: Array2<f64>,
}

impl JacobiStep {
    pub fn new() -> Self {
        Self {
            scratch: Array2::zeros((0, 0)),
        }
    }
}

impl Default for JacobiStep {
    fn default() -> Self {
        Self::new()
    }
}

impl StepFunction for JacobiStep {
    fn name(&self) -> &'static str {
        "jacobi"
    }

    fn step(&mut self, grid: &mut Grid, omega: f64) -> f64 {
        if grid.is_degenerate() {
            return 0.0;
        }
        ensure_scratch(&mut self.scratch, grid);

        let cells = grid.cells();
        let mut delta = 0.0;
        Zip::from(&mut self.scratch)
            .and(cells.slice(s![..-2, 1..-1]))
            .and(cells.slice(s![2.., 1..-1]))
            .and(cells.slice(s![1..-1, ..-2]))
            .and(cells.slice(s![1..-1, 2..]))
            .and(cells.slice(s![1..-1, 1..-1]))
            .for_each(|new, &up, &down, &left, &right, &current| {
                *new = relax_cell(omega, up, down, left, right, current);
                delta += (*new - current).abs();
            });

        commit(grid.cells_mut(), &self.scratch, None);
        delta
    }
}

/// Jacobi update with interior rows computed on the rayon pool.
///
/// Per-row deltas are sum-reduced at the end of the pass. Because the
/// reduction order depends on scheduling, the delta can differ from
/// [`JacobiStep`] in the last bits; the committed cells do not.
#[derive(Debug)]
pub struct ParallelJacobiStep {
    scratch: Array2<f64>,
    pool: Option<ThreadPool>,
}

impl ParallelJacobiStep {
    /// Use the global rayon pool.
    pub fn new() -> Self {
        Self {
            scratch: Array2::zeros((0, 0)),
            pool: None,
        }
    }

    /// Use a dedicated pool of `num_threads` workers.
    pub fn with_threads(num_threads: usize) -> Result<Self, RelaxationError> {
        Ok(Self {
            scratch: Array2::zeros((0, 0)),
            pool: Some(ThreadPoolBuilder::new().num_threads(num_threads).build()?),
        })
    }

    pub fn num_threads(&self) -> usize {
        pool_threads(self.pool.as_ref())
    }
}

impl Default for ParallelJacobiStep {
    fn default() -> Self {
        Self::new()
    }
}

impl StepFunction for ParallelJacobiStep {
    fn name(&self) -> &'static str {
        "parallel-jacobi"
    }

    fn step(&mut self, grid: &mut Grid, omega: f64) -> f64 {
        if grid.is_degenerate() {
            return 0.0;
        }
        ensure_scratch(&mut self.scratch, grid);

        let cells = grid.cells();
        let scratch = &mut self.scratch;
        let delta = in_pool(self.pool.as_ref(), || {
            relax_rows_into(cells, scratch, omega, None)
        });

        commit(grid.cells_mut(), &self.scratch, None);
        delta
    }
}

/// Two-phase (red-black) ordering.
///
/// Cells with even `x + y` ("red") are relaxed first from the current grid,
/// then the odd ("black") cells are relaxed reading the updated red values.
/// No cell in a phase neighbors another cell of the same phase, so each phase
/// is computed in parallel rows without read/write hazards. The returned
/// delta is the sum over both phases.
#[derive(Debug)]
pub struct RedBlackStep {
    scratch: Array2<f64>,
    pool: Option<ThreadPool>,
}

impl RedBlackStep {
    pub fn new() -> Self {
        Self {
            scratch: Array2::zeros((0, 0)),
            pool: None,
        }
    }

    pub fn with_threads(num_threads: usize) -> Result<Self, RelaxationError> {
        Ok(Self {
            scratch: Array2::zeros((0, 0)),
            pool: Some(ThreadPoolBuilder::new().num_threads(num_threads).build()?),
        })
    }

    pub fn num_threads(&self) -> usize {
        pool_threads(self.pool.as_ref())
    }
}

impl Default for RedBlackStep {
    fn default() -> Self {
        Self::new()
    }
}

impl StepFunction for RedBlackStep {
    fn name(&self) -> &'static str {
        "red-black"
    }

    fn step(&mut self, grid: &mut Grid, omega: f64) -> f64 {
        if grid.is_degenerate() {
            return 0.0;
        }
        ensure_scratch(&mut self.scratch, grid);

        let mut delta = 0.0;
        for parity in [0, 1] {
            let cells = grid.cells();
            let scratch = &mut self.scratch;
            delta += in_pool(self.pool.as_ref(), || {
                relax_rows_into(cells, scratch, omega, Some(parity))
            });
            commit(grid.cells_mut(), &self.scratch, Some(parity));
        }
        delta
    }
}

/// In-place sweep, row by row.
///
/// Each cell reads neighbors that were already updated earlier in the same
/// sweep (up and left), so this is Gauss-Seidel rather than Jacobi. It needs
/// no scratch memory and usually converges in fewer steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussSeidelStep;

impl StepFunction for GaussSeidelStep {
    fn name(&self) -> &'static str {
        "gauss-seidel"
    }

    fn step(&mut self, grid: &mut Grid, omega: f64) -> f64 {
        if grid.is_degenerate() {
            return 0.0;
        }
        let (h, w) = grid.dim();
        let cells = grid.cells_mut();

        let mut delta = 0.0;
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let current = cells[[y, x]];
                let new = relax_cell(
                    omega,
                    cells[[y - 1, x]],
                    cells[[y + 1, x]],
                    cells[[y, x - 1]],
                    cells[[y, x + 1]],
                    current,
                );
                cells[[y, x]] = new;
                delta += (new - current).abs();
            }
        }
        delta
    }
}

fn ensure_scratch(scratch: &mut Array2<f64>, grid: &Grid) {
    let (h, w) = grid.dim();
    let shape = (h - 2, w - 2);
    if scratch.dim() != shape {
        *scratch = Array2::zeros(shape);
    }
}

fn pool_threads(pool: Option<&ThreadPool>) -> usize {
    pool.map_or_else(rayon::current_num_threads, ThreadPool::current_num_threads)
}

fn in_pool<R, F>(pool: Option<&ThreadPool>, op: F) -> R
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// Compute new values for interior cells into `scratch` (interior-shaped),
/// one rayon task per row, reading only from `cells`.
///
/// With `parity = Some(p)` only cells where `(x + y) % 2 == p` are computed.
fn relax_rows_into(
    cells: ArrayView2<'_, f64>,
    scratch: &mut Array2<f64>,
    omega: f64,
    parity: Option<usize>,
) -> f64 {
    scratch
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .map(|(i, mut row)| {
            let y = i + 1;
            let mut delta = 0.0;
            for (j, new) in row.iter_mut().enumerate() {
                let x = j + 1;
                if parity.is_some_and(|p| (x + y) % 2 != p) {
                    continue;
                }
                let current = cells[[y, x]];
                *new = relax_cell(
                    omega,
                    cells[[y - 1, x]],
                    cells[[y + 1, x]],
                    cells[[y, x - 1]],
                    cells[[y, x + 1]],
                    current,
                );
                delta += (*new - current).abs();
            }
            delta
        })
        .sum()
}

/// Copy the scratch layer into the grid interior, optionally only one color.
fn commit(cells: &mut Array2<f64>, scratch: &Array2<f64>, parity: Option<usize>) {
    let mut interior = cells.slice_mut(s![1..-1, 1..-1]);
    match parity {
        None => interior.assign(scratch),
        Some(p) => {
            Zip::indexed(interior)
                .and(scratch)
                .for_each(|(i, j), cell, &new| {
                    if (i + 1 + j + 1) % 2 == p {
                        *cell = new;
                    }
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::relaxation::grid::BoundaryConditions;

    fn frost_5x5() -> Grid {
        Grid::new(5, 5, BoundaryConditions::new(40.0, -237.15, -237.15, -237.15)).unwrap()
    }

    fn strategies() -> Vec<Box<dyn StepFunction>> {
        vec![
            Box::new(JacobiStep::new()),
            Box::new(ParallelJacobiStep::new()),
            Box::new(RedBlackStep::new()),
            Box::new(GaussSeidelStep),
        ]
    }

    #[test]
    fn test_relax_cell_formula() {
        let v = relax_cell(0.8, 40.0, 0.0, -237.15, 0.0, 0.0);
        assert!((v - 0.2 * (40.0 - 237.15)).abs() < 1e-12, "v={v}");
        // omega = 1 is the plain neighbor average.
        assert_eq!(relax_cell(1.0, 1.0, 2.0, 3.0, 4.0, 100.0), 2.5);
    }

    #[test]
    fn test_jacobi_first_step_on_frost_trap() {
        let mut grid = frost_5x5();
        let delta = step(&mut grid, 0.8);

        let expected = [
            [-39.43, 8.0, -39.43],
            [-47.43, 0.0, -47.43],
            [-94.86, -47.43, -94.86],
        ];
        for (i, row) in expected.iter().enumerate() {
            for (j, &e) in row.iter().enumerate() {
                let got = grid.get(i + 1, j + 1).unwrap();
                assert!((got - e).abs() < 1e-9, "cell ({}, {}): {got} != {e}", i + 1, j + 1);
            }
        }

        let expected_delta: f64 = expected.iter().flatten().map(|v: &f64| v.abs()).sum();
        assert!((expected_delta - 418.87).abs() < 1e-9);
        assert!((delta - expected_delta).abs() < 1e-9, "delta={delta}");
    }

    #[test]
    fn test_zero_omega_is_identity() {
        for mut s in strategies() {
            let mut grid = frost_5x5();
            let before = grid.clone();
            let delta = s.step(&mut grid, 0.0);
            assert_eq!(delta, 0.0, "{}", s.name());
            assert_eq!(grid, before, "{}", s.name());
        }
    }

    #[test]
    fn test_equilibrium_grid_has_zero_delta() {
        for mut s in strategies() {
            let mut grid =
                Grid::with_interior(6, 4, BoundaryConditions::uniform(12.5), 12.5).unwrap();
            let delta = s.step(&mut grid, 0.5);
            assert_eq!(delta, 0.0, "{}", s.name());
        }
    }

    #[test]
    fn test_degenerate_grid_returns_zero() {
        for mut s in strategies() {
            for shape in [(2, 5), (5, 2), (2, 2), (0, 0)] {
                let mut grid = Grid::from_array(Array2::from_elem(shape, 3.0));
                let before = grid.clone();
                assert_eq!(s.step(&mut grid, 0.8), 0.0, "{} {:?}", s.name(), shape);
                assert_eq!(grid, before);
            }
        }
    }

    #[test]
    fn test_parallel_jacobi_matches_serial() {
        let mut serial = Grid::new(17, 11, BoundaryConditions::default()).unwrap();
        let mut parallel = serial.clone();
        let mut js = JacobiStep::new();
        let mut ps = ParallelJacobiStep::with_threads(3).unwrap();
        assert_eq!(ps.num_threads(), 3);

        for _ in 0..25 {
            let d0 = js.step(&mut serial, 0.8);
            let d1 = ps.step(&mut parallel, 0.8);
            assert!((d0 - d1).abs() < 1e-9 * d0.max(1.0), "{d0} vs {d1}");
        }
        for (a, b) in serial.cells().iter().zip(parallel.cells().iter()) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn test_red_black_second_phase_reads_first_phase() {
        let mut grid = frost_5x5();
        let mut rb = RedBlackStep::new();
        rb.step(&mut grid, 0.8);

        // Red cell (1,1) only sees the boundary.
        let red = grid.get(1, 1).unwrap();
        assert!((red - (-39.43)).abs() < 1e-9, "red={red}");

        // Black cell (1,2) sees the fresh red neighbors (1,1), (1,3) and (2,2).
        let black = grid.get(1, 2).unwrap();
        let expected = 0.2 * (40.0 + -39.43 + -39.43 + 0.0);
        assert!((black - expected).abs() < 1e-9, "black={black}");
    }

    #[test]
    fn test_gauss_seidel_reads_updated_neighbors() {
        let mut grid = frost_5x5();
        GaussSeidelStep.step(&mut grid, 0.8);

        // (1,2) is visited after (1,1) and sees its new value on the left.
        let expected = 0.2 * (40.0 + -39.43);
        let got = grid.get(1, 2).unwrap();
        assert!((got - expected).abs() < 1e-9, "got={got}");
    }

    #[test]
    fn test_scratch_follows_grid_shape() {
        let mut js = JacobiStep::new();
        let mut small = frost_5x5();
        let mut large = Grid::new(9, 7, BoundaryConditions::default()).unwrap();
        js.step(&mut small, 0.8);
        js.step(&mut large, 0.8);
        js.step(&mut small, 0.8);
        assert_eq!(small.dim(), (5, 5));
        assert_eq!(large.dim(), (7, 9));
    }
}
