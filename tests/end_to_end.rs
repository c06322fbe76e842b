use pdptw_alns::config::Config;
use pdptw_alns::models::{Interval, Matrix, ProblemBuilder, TimeCost};
use pdptw_alns::solver::{run_experiment, AdaptiveOperator, Budget, Context, Solution};

/// Three vehicles, five calls, all windows loose enough that every call
/// can be served by any vehicle. Exercises the full ruin/recreate loop
/// end to end with a fixed seed.
fn small_instance() -> pdptw_alns::models::Problem {
    let num_calls = 5;
    let nodes = num_calls * 2 + 1;
    let tc = |time, cost| TimeCost { time, cost };

    let mut travel = Matrix::init(tc(0, 0), nodes, nodes);
    for from in 0..nodes {
        for to in 0..nodes {
            if from != to {
                let distance = (from as i64 - to as i64).abs() * 2 + 1;
                travel.set(from, to, tc(distance, distance));
            }
        }
    }

    let mut builder = ProblemBuilder::new(nodes);
    for vehicle in 0..3 {
        builder.add_vehicle(
            0,
            0,
            10 + vehicle as i64 * 5,
            (0..num_calls).collect(),
            travel.clone(),
            vec![(tc(1, 1), tc(1, 1)); num_calls],
        );
    }
    for call in 0..num_calls {
        let origin = call * 2 + 1;
        let destination = call * 2 + 2;
        builder.add_call(
            origin,
            destination,
            2,
            800,
            Interval::new(0, 200),
            Interval::new(0, 400),
        );
    }
    builder.build().expect("small instance is well-formed")
}

#[test]
fn search_improves_on_or_matches_the_all_outsourced_baseline() {
    let problem = small_instance();
    let mut baseline = Solution::initial(&problem);
    let baseline_cost = baseline.cost(&problem);
    assert_eq!(baseline_cost, 800 * 5);

    let ctx = Context::new(problem, Config::default());
    let mut operator = AdaptiveOperator::new();

    let result = run_experiment(&ctx, &mut operator, Budget::Iterations(500));

    assert!(result.best_cost <= baseline_cost);
    result
        .best_solution
        .debug_assert_consistent(&ctx.problem)
        .expect("final solution must be internally consistent");
}

#[test]
fn same_seed_reproduces_the_same_outcome() {
    let run_once = || {
        let mut config = Config::default();
        config.seed = 99;
        let ctx = Context::new(small_instance(), config);
        let mut operator = AdaptiveOperator::new();
        run_experiment(&ctx, &mut operator, Budget::Iterations(300))
    };

    let first = run_once();
    let second = run_once();
    assert_eq!(first.best_cost, second.best_cost);
    assert_eq!(first.total_iterations, second.total_iterations);
}
