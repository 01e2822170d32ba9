use super::grid::Grid;

/// Hook notified while a solver runs.
///
/// Chosen once when the solver is built. All methods default to no-ops.
pub trait Observer {
    /// Called once with the freshly created grid, before the first step.
    fn start(&mut self, _grid: &Grid) {}

    /// Called after each step. `iteration` counts from zero.
    fn observe(&mut self, _iteration: usize, _delta: f64, _grid: &Grid) {}

    /// Called once with the final grid and the number of steps taken.
    fn finish(&mut self, _iterations: usize, _grid: &Grid) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// What a [`PeriodicObserver`] is showing the sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    Start,
    Step { iteration: usize, delta: f64 },
    Finish { iterations: usize },
}

/// Hands the grid to a sink at start, every `frequency` steps and at finish.
///
/// Steps `0, frequency, 2 * frequency, ...` are reported.
pub struct PeriodicObserver<F>
where
    F: FnMut(Frame, &Grid),
{
    frequency: usize,
    sink: F,
}

impl<F> PeriodicObserver<F>
where
    F: FnMut(Frame, &Grid),
{
    /// A `frequency` of zero is treated as one.
    pub fn new(frequency: usize, sink: F) -> Self {
        Self {
            frequency: frequency.max(1),
            sink,
        }
    }

    pub fn frequency(&self) -> usize {
        self.frequency
    }
}

impl<F> Observer for PeriodicObserver<F>
where
    F: FnMut(Frame, &Grid),
{
    fn start(&mut self, grid: &Grid) {
        (self.sink)(Frame::Start, grid);
    }

    fn observe(&mut self, iteration: usize, delta: f64, grid: &Grid) {
        if iteration % self.frequency == 0 {
            (self.sink)(Frame::Step { iteration, delta }, grid);
        }
    }

    fn finish(&mut self, iterations: usize, grid: &Grid) {
        (self.sink)(Frame::Finish { iterations }, grid);
    }
}
