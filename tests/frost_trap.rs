use frosttrap::sim::relaxation::{
    GaussSeidelStep, JacobiStep, ParallelJacobiStep, RedBlackStep, StepFunction,
};
use frosttrap::{
    BoundaryConditions, ConvergenceStatus, Epsilon, Grid, IterationLimit, RelaxationSolver,
    RunContext, SolverConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn frost_boundary() -> BoundaryConditions {
    BoundaryConditions::new(40.0, -237.15, -237.15, -237.15)
}

fn random_trap(width: usize, height: usize, seed: u64) -> Grid {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cells = Grid::new(width, height, frost_boundary()).unwrap().into_array();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            cells[[y, x]] = rng.gen_range(-300.0..60.0);
        }
    }
    Grid::from_array(cells)
}

fn solve_with<S: StepFunction>(stepper: S, omega: f64, epsilon: f64) -> Grid {
    let config = SolverConfig::new()
        .with_omega(omega)
        .with_epsilon(Epsilon::Fixed(epsilon))
        .with_max_iterations(200_000);
    let out = RelaxationSolver::new(config)
        .with_step(stepper)
        .run(12, 9, frost_boundary(), RunContext::new("steady"))
        .unwrap();
    assert_eq!(out.status, ConvergenceStatus::Converged, "{:?}", out.final_delta);
    out.grid
}

fn assert_fields_close(a: &Grid, b: &Grid, tol: f64) {
    assert_eq!(a.dim(), b.dim());
    for ((pos, va), vb) in a.cells().indexed_iter().zip(b.cells().iter()) {
        assert!((va - vb).abs() < tol, "cell {pos:?}: {va} vs {vb}");
    }
}

#[test]
fn test_boundary_is_bit_identical_after_many_steps() {
    let strategies: Vec<Box<dyn StepFunction>> = vec![
        Box::new(JacobiStep::new()),
        Box::new(ParallelJacobiStep::new()),
        Box::new(RedBlackStep::new()),
        Box::new(GaussSeidelStep),
    ];

    for (seed, mut stepper) in strategies.into_iter().enumerate() {
        let mut grid = random_trap(23, 17, seed as u64);
        let before: Vec<u64> = grid.boundary_values().iter().map(|v| v.to_bits()).collect();

        for _ in 0..200 {
            stepper.step(&mut grid, 1.3);
        }

        let after: Vec<u64> = grid.boundary_values().iter().map(|v| v.to_bits()).collect();
        assert_eq!(before, after, "{} mutated the boundary", stepper.name());
    }
}

#[test]
fn test_first_step_on_5x5_reference_trap() {
    let mut grid = Grid::new(5, 5, frost_boundary()).unwrap();
    let delta = frosttrap::sim::relaxation::step(&mut grid, 0.8);

    let corner = (0.8 / 4.0) * (40.0 + 0.0 + -237.15 + 0.0) + 0.2 * 0.0;
    assert!((grid.get(1, 1).unwrap() - corner).abs() < 1e-12);
    assert!(delta > 0.0);
    assert!((delta - 418.87).abs() < 1e-9, "delta={delta}");

    // Same input, same answer.
    let mut again = Grid::new(5, 5, frost_boundary()).unwrap();
    assert_eq!(frosttrap::sim::relaxation::step(&mut again, 0.8), delta);
}

#[test]
fn test_5x5_reference_trap_converges() {
    let out = frosttrap::sim::relaxation::run(
        5,
        5,
        frost_boundary(),
        0.8,
        Epsilon::default(),
        IterationLimit::Bounded(1_000),
    )
    .unwrap();

    assert!((out.epsilon - 0.025).abs() < 1e-15);
    assert!(out.converged());
    assert!(out.final_delta.unwrap() <= 0.025);
}

#[test]
fn test_red_black_and_jacobi_reach_same_steady_state() {
    let jacobi = solve_with(JacobiStep::new(), 0.8, 1e-10);
    let red_black = solve_with(RedBlackStep::new(), 0.8, 1e-10);
    assert_fields_close(&jacobi, &red_black, 1e-6);
}

#[test]
fn test_gauss_seidel_and_parallel_jacobi_reach_same_steady_state() {
    let jacobi = solve_with(JacobiStep::new(), 1.0, 1e-10);
    let parallel = solve_with(ParallelJacobiStep::with_threads(2).unwrap(), 1.0, 1e-10);
    let gauss_seidel = solve_with(GaussSeidelStep, 1.0, 1e-10);
    assert_fields_close(&jacobi, &parallel, 1e-6);
    assert_fields_close(&jacobi, &gauss_seidel, 1e-6);
}

#[test]
fn test_over_relaxed_sweeps_terminate_within_cap() {
    for omega in [0.3, 1.0, 1.5, 1.9] {
        for stepper in [
            Box::new(RedBlackStep::new()) as Box<dyn StepFunction>,
            Box::new(GaussSeidelStep),
        ] {
            let name = stepper.name();
            let config = SolverConfig::new()
                .with_omega(omega)
                .with_max_iterations(50_000);
            let mut solver = RelaxationSolver::new(config).with_step(stepper);
            let out = solver
                .run(20, 20, frost_boundary(), RunContext::new(name))
                .unwrap();
            assert!(out.converged(), "{name} omega={omega}");
            assert!(out.final_delta.unwrap() <= out.epsilon);
            assert!(out.iterations <= 50_000);
        }
    }
}

#[test]
fn test_steady_state_is_bounded_by_edges() {
    let grid = solve_with(RedBlackStep::new(), 1.5, 1e-8);
    for &v in grid.interior().unwrap().iter() {
        assert!((-237.15..=40.0).contains(&v), "{v}");
    }
}
