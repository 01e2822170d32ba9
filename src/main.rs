use anyhow::Result;
use frosttrap::io::{RunRecord, append_interior, append_record};
use frosttrap::logging::init_logging;
use frosttrap::sim::relaxation::{
    Frame, GaussSeidelStep, JacobiStep, PeriodicObserver, RedBlackStep, StepFunction,
};
use frosttrap::{BoundaryConditions, Grid, RelaxationSolver, RunContext, SolverConfig};
use std::path::Path;

const WIDTH: usize = 100;
const HEIGHT: usize = 100;
const DUMP_EVERY: usize = 100;

fn main() -> Result<()> {
    init_logging(None);

    let config = SolverConfig::new();
    let results = Path::new("results.json");

    solve_and_record("simple", GaussSeidelStep, config, results, None)?;
    solve_and_record("dbuf", JacobiStep::new(), config, results, None)?;
    solve_and_record(
        "rb",
        RedBlackStep::new(),
        config,
        results,
        Some(Path::new("frosttrap.data")),
    )?;

    Ok(())
}

fn solve_and_record<S: StepFunction + 'static>(
    label: &str,
    stepper: S,
    config: SolverConfig,
    results: &Path,
    dump: Option<&Path>,
) -> Result<()> {
    let ctx = RunContext::new(label).with_verbose(true).with_report_every(1000);
    let mut solver = RelaxationSolver::new(config).with_step(stepper);

    if let Some(path) = dump {
        let sink = move |frame: Frame, grid: &Grid| {
            if let Err(e) = append_interior(path, grid) {
                log::warn!("Skipping dump of {frame:?}: {e:#}");
            }
        };
        solver = solver.with_observer(PeriodicObserver::new(DUMP_EVERY, sink));
    }

    let outcome = solver.run(WIDTH, HEIGHT, BoundaryConditions::default(), ctx)?;
    println!(
        "{label}: {} iterations, final delta {:?}, {:.3} s",
        outcome.iterations,
        outcome.final_delta,
        outcome.elapsed.as_secs_f64()
    );

    append_record(results, &RunRecord::from_outcome(label, &config, &outcome))?;
    Ok(())
}
