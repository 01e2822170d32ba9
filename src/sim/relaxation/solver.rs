use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::sim::framework::context::{RunContext, StepProfile};

use super::error::RelaxationError;
use super::grid::{BoundaryConditions, Grid};
use super::observer::{NullObserver, Observer};
use super::step::{JacobiStep, StepFunction};

/// Default relaxation weight.
pub const DEFAULT_OMEGA: f64 = 0.8;
/// Epsilon per grid cell used when no fixed threshold is given.
pub const DEFAULT_EPSILON_PER_CELL: f64 = 0.001;
/// Hard stop applied unless the caller opts into unbounded runs.
pub const DEFAULT_MAX_ITERATIONS: usize = 1_000_000;

/// Convergence threshold on the per-step delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Epsilon {
    /// `factor * width * height`.
    ScaledBySize(f64),
    /// Same threshold for every grid size.
    Fixed(f64),
}

impl Epsilon {
    pub fn resolve(&self, width: usize, height: usize) -> f64 {
        match *self {
            Epsilon::ScaledBySize(factor) => factor * width as f64 * height as f64,
            Epsilon::Fixed(value) => value,
        }
    }
}

impl Default for Epsilon {
    fn default() -> Self {
        Epsilon::ScaledBySize(DEFAULT_EPSILON_PER_CELL)
    }
}

/// Upper bound on the number of steps in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterationLimit {
    Bounded(usize),
    /// Run until the threshold is met, however long that takes.
    Unbounded,
}

impl IterationLimit {
    /// True when another step may be taken after `done` steps.
    pub fn allows(&self, done: usize) -> bool {
        match *self {
            IterationLimit::Bounded(max) => done < max,
            IterationLimit::Unbounded => true,
        }
    }
}

impl Default for IterationLimit {
    fn default() -> Self {
        IterationLimit::Bounded(DEFAULT_MAX_ITERATIONS)
    }
}

/// Parameters of a relaxation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Relaxation weight. Values outside `(0, 2)` are accepted but may not
    /// converge.
    pub omega: f64,
    pub epsilon: Epsilon,
    pub max_iterations: IterationLimit,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self {
            omega: DEFAULT_OMEGA,
            epsilon: Epsilon::default(),
            max_iterations: IterationLimit::default(),
        }
    }

    pub fn with_omega(mut self, omega: f64) -> Self {
        self.omega = omega;
        self
    }

    pub fn with_epsilon(mut self, epsilon: Epsilon) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = IterationLimit::Bounded(max_iterations);
        self
    }

    /// Remove the iteration cap.
    pub fn unbounded(mut self) -> Self {
        self.max_iterations = IterationLimit::Unbounded;
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// The last delta was at or below epsilon.
    Converged,
    /// The iteration cap was reached first.
    NotConverged,
}

/// Result of [`RelaxationSolver::solve`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub grid: Grid,
    /// Number of steps taken.
    pub iterations: usize,
    /// Delta of the last step, `None` when no step was taken.
    pub final_delta: Option<f64>,
    /// Threshold the run was checked against.
    pub epsilon: f64,
    pub status: ConvergenceStatus,
    /// Wall time of the stepping loop.
    pub elapsed: Duration,
    pub profile: StepProfile,
}

impl RunOutcome {
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

/// Drives a [`StepFunction`] until the trap settles.
///
/// ```text
/// Grid ──► step() ──► delta <= epsilon? ──► RunOutcome
///             ▲              │ no
///             └──────────────┘ (until max_iterations)
/// ```
pub struct RelaxationSolver<'a> {
    config: SolverConfig,
    stepper: Box<dyn StepFunction + 'a>,
    observer: Box<dyn Observer + 'a>,
}

impl<'a> RelaxationSolver<'a> {
    /// Jacobi stepping, no observer.
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            stepper: Box::new(JacobiStep::new()),
            observer: Box::new(NullObserver),
        }
    }

    pub fn with_step<S: StepFunction + 'a>(mut self, stepper: S) -> Self {
        self.stepper = Box::new(stepper);
        self
    }

    pub fn with_observer<O: Observer + 'a>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Name of the step scheme in use.
    pub fn scheme(&self) -> &'static str {
        self.stepper.name()
    }

    /// Create a `width × height` trap and relax it.
    pub fn run(
        &mut self,
        width: usize,
        height: usize,
        boundary: BoundaryConditions,
        ctx: RunContext,
    ) -> Result<RunOutcome, RelaxationError> {
        let grid = Grid::new(width, height, boundary)?;
        Ok(self.solve(grid, ctx))
    }

    /// Relax an existing grid until its delta drops to epsilon or the
    /// iteration cap is hit.
    pub fn solve(&mut self, mut grid: Grid, mut ctx: RunContext) -> RunOutcome {
        let omega = self.config.omega;
        let epsilon = self.config.epsilon.resolve(grid.width(), grid.height());

        if !(omega > 0.0 && omega < 2.0) {
            log::warn!(
                "[{}] omega {omega} is outside (0, 2); the run may not converge",
                ctx.label()
            );
        }
        log::info!(
            "[{}] relaxing {}x{} trap with {} (omega {omega}, epsilon {epsilon})",
            ctx.label(),
            grid.width(),
            grid.height(),
            self.stepper.name(),
        );

        self.observer.start(&grid);

        let started = Instant::now();
        let mut iterations = 0;
        let mut final_delta = None;
        let mut status = ConvergenceStatus::NotConverged;
        while self.config.max_iterations.allows(iterations) {
            let t0 = Instant::now();
            let delta = self.stepper.step(&mut grid, omega);
            ctx.record_step(iterations, delta, t0.elapsed());
            self.observer.observe(iterations, delta, &grid);

            iterations += 1;
            final_delta = Some(delta);
            if delta <= epsilon {
                status = ConvergenceStatus::Converged;
                break;
            }
        }
        let elapsed = started.elapsed();

        self.observer.finish(iterations, &grid);

        match status {
            ConvergenceStatus::Converged => log::info!(
                "[{}] converged after {iterations} steps in {:.3} s (delta {:?})",
                ctx.label(),
                elapsed.as_secs_f64(),
                final_delta,
            ),
            ConvergenceStatus::NotConverged => log::warn!(
                "[{}] stopped after {iterations} steps without converging (delta {:?}, epsilon {epsilon})",
                ctx.label(),
                final_delta,
            ),
        }

        RunOutcome {
            grid,
            iterations,
            final_delta,
            epsilon,
            status,
            elapsed,
            profile: ctx.into_profile(),
        }
    }
}

/// Create a trap and relax it with Jacobi steps.
pub fn run(
    width: usize,
    height: usize,
    boundary: BoundaryConditions,
    omega: f64,
    epsilon: Epsilon,
    max_iterations: IterationLimit,
) -> Result<RunOutcome, RelaxationError> {
    let config = SolverConfig {
        omega,
        epsilon,
        max_iterations,
    };
    RelaxationSolver::new(config).run(width, height, boundary, RunContext::new("jacobi"))
}
