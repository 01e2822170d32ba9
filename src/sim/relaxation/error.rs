use thiserror::Error;

/// Errors raised while setting up a relaxation run.
///
/// Running out of iterations is not an error; see
/// [`ConvergenceStatus`](super::solver::ConvergenceStatus).
#[derive(Error, Debug)]
pub enum RelaxationError {
    /// The grid has no interior cell ring.
    #[error("invalid grid dimension {width}x{height}: both sides must be at least 3")]
    InvalidDimension { width: usize, height: usize },

    /// A dedicated worker pool could not be started.
    #[error("failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
