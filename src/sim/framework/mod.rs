//! Run-scoped support shared by solvers.

pub mod context;

pub use context::{RunContext, StepProfile};
