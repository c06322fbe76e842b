//! Minimal single-run demonstration of the search loop on a hand-built
//! instance. Not an instance-file CLI or a multi-experiment harness —
//! those are out of scope for this crate.

use pdptw_alns::config::Config;
use pdptw_alns::models::{Interval, Matrix, ProblemBuilder, TimeCost};
use pdptw_alns::solver::{run_experiment, AdaptiveOperator, Budget, Context};

fn toy_instance() -> pdptw_alns::models::Problem {
    let tc = |time, cost| TimeCost { time, cost };
    let mut travel = Matrix::init(tc(0, 0), 5, 5);
    for from in 0..5 {
        for to in 0..5 {
            if from != to {
                let distance = (from as i64 - to as i64).abs() * 2 + 1;
                travel.set(from, to, tc(distance, distance));
            }
        }
    }

    let mut builder = ProblemBuilder::new(5);
    builder.add_vehicle(
        0,
        0,
        20,
        vec![0, 1],
        travel,
        vec![(tc(1, 1), tc(1, 1)), (tc(1, 1), tc(1, 1))],
    );
    builder.add_call(1, 2, 5, 1000, Interval::new(0, 200), Interval::new(0, 400));
    builder.add_call(3, 4, 5, 1000, Interval::new(0, 200), Interval::new(0, 400));
    builder.build().expect("toy instance is well-formed")
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_module_path(false)
        .init();

    let problem = toy_instance();
    let ctx = Context::new(problem, Config::default());
    let mut operator = AdaptiveOperator::new();

    log::info!("starting search");
    let result = run_experiment(&ctx, &mut operator, Budget::Iterations(2_000));

    log::info!(
        "best cost {} found at iteration {} of {}",
        result.best_cost,
        result.iter_found,
        result.total_iterations
    );
}
