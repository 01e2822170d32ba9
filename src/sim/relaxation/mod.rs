//! FrostTrap relaxation solver.
//!
//! A rectangular trap of temperatures with fixed edges is relaxed cell by
//! cell until the summed change of one pass drops to a threshold.
//!
//! # Architecture
//!
//! ```text
//! BoundaryConditions ──► Grid::new() ──► RelaxationSolver ──► RunOutcome
//!                                          │         │
//!                                 StepFunction   Observer
//! ```
//!
//! The step strategies share one update rule,
//! `new = omega/4 * (up + down + left + right) + (1 - omega) * current`,
//! and differ in which neighbor values each cell reads.

pub mod error;
pub mod grid;
pub mod observer;
pub mod solver;
pub mod step;

pub use error::RelaxationError;
pub use grid::{BoundaryConditions, Grid};
pub use observer::{Frame, NullObserver, Observer, PeriodicObserver};
pub use solver::{
    ConvergenceStatus, Epsilon, IterationLimit, RelaxationSolver, RunOutcome, SolverConfig, run,
};
pub use step::{
    GaussSeidelStep, JacobiStep, ParallelJacobiStep, RedBlackStep, StepFunction, relax_cell, step,
};
