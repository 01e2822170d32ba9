pub mod io;
pub mod logging;
pub mod sim;

// Prelude
pub use sim::framework::{RunContext, StepProfile};
pub use sim::relaxation::{
    BoundaryConditions, ConvergenceStatus, Epsilon, Grid, IterationLimit, RelaxationError,
    RelaxationSolver, RunOutcome, SolverConfig, StepFunction,
};
