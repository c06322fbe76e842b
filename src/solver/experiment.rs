use std::time::Duration;

use crate::solver::acceptance::Acceptance;
use crate::solver::budget::{Budget, BudgetTracker};
use crate::solver::context::Context;
use crate::solver::history::SearchHistory;
use crate::solver::operator::AdaptiveOperator;
use crate::solver::solution::Solution;

/// Outcome of a single `run_experiment` call.
pub struct ExperimentResult {
    pub best_solution: Solution,
    pub best_cost: i64,
    pub iter_found: u64,
    pub time_found: Duration,
    pub total_iterations: u64,
}

/// Runs the adaptive large neighborhood search to exhaustion of `budget`,
/// starting from the all-outsourced solution. One iteration: pick a
/// (ruin, recreate) operator, apply it to a copy of the current
/// solution, accept or reject the result by simulated annealing, and
/// reward the operator for what happened.
pub fn run_experiment(
    ctx: &Context,
    operator: &mut AdaptiveOperator,
    budget: Budget,
) -> ExperimentResult {
    let problem = &ctx.problem;
    let random = &ctx.random;
    let config = ctx.config.borrow();

    let mut tracker = BudgetTracker::new(budget);
    let mut acceptance = Acceptance::new(
        config.warmup_fraction,
        config.exploration_probability,
        config.final_temperature,
        config.escape_after_iterations,
    );
    let mut history = SearchHistory::new(std::time::Instant::now());

    let mut current = Solution::initial(problem);
    let mut current_cost = current.cost(problem);

    let mut best = current.clone();
    let mut best_cost = current_cost;
    let mut iter_found = 0u64;
    let mut time_found = Duration::ZERO;

    history.add(problem, &best, best_cost);

    while !tracker.exhausted() {
        tracker.record_iteration();

        let op_index = operator.select(random);
        let mut candidate = current.clone();
        operator.apply(op_index, problem, &mut candidate, random, &config);
        let candidate_cost = candidate.cost(problem);

        let elapsed_fraction = tracker.elapsed_fraction();
        let accepted =
            acceptance.accept(elapsed_fraction, candidate_cost, current_cost, random);

        let mut found_new_best = false;
        let reward = if candidate_cost < best_cost {
            best = candidate.clone();
            best_cost = candidate_cost;
            iter_found = tracker.iterations();
            time_found = tracker.elapsed();
            found_new_best = true;
            history.add(problem, &best, best_cost);
            config.reward_best
        } else if accepted && candidate_cost < current_cost {
            config.reward_better
        } else if accepted {
            config.reward_diverse
        } else {
            config.reward_reject
        };
        operator.reward(op_index, reward);

        if accepted {
            current = candidate;
            current_cost = candidate_cost;
        }

        acceptance.note_iteration(found_new_best);
        if acceptance.should_escape() {
            history.add_message(format!(
                "escaping to best known solution after {} non-improving iterations",
                config.escape_after_iterations
            ));
            current = best.clone();
            current_cost = best_cost;
            acceptance.reset_escape_counter();
        }

        operator.end_iteration(config.reweight_segment, config.reweight_decay);

        if config.log_interval > 0 && tracker.iterations() % config.log_interval == 0 {
            log::info!(
                "iteration {} temperature {:.3} best_cost {}",
                tracker.iterations(),
                acceptance.temperature(),
                best_cost
            );
        }
    }

    ExperimentResult {
        best_solution: best,
        best_cost,
        iter_found,
        time_found,
        total_iterations: tracker.iterations(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{Interval, Matrix, Problem, ProblemBuilder, TimeCost};

    fn small_problem() -> Problem {
        let tc = |time, cost| TimeCost { time, cost };
        let mut travel = Matrix::init(tc(0, 0), 4, 4);
        for from in 0..4 {
            for to in 0..4 {
                if from != to {
                    travel.set(from, to, tc(5, 5));
                }
            }
        }

        let mut builder = ProblemBuilder::new(4);
        builder.add_vehicle(
            0,
            0,
            20,
            vec![0, 1],
            travel,
            vec![(tc(1, 1), tc(1, 1)), (tc(1, 1), tc(1, 1))],
        );
        builder.add_call(1, 2, 5, 1000, Interval::new(0, 1000), Interval::new(0, 1000));
        builder.add_call(2, 3, 5, 1000, Interval::new(0, 1000), Interval::new(0, 1000));
        builder.build().unwrap()
    }

    #[test]
    fn run_experiment_never_ends_worse_than_the_initial_solution() {
        let problem = small_problem();
        let initial_cost = Solution::initial(&problem).cost(&problem);

        let mut config = Config::default();
        config.seed = 7;
        let ctx = Context::new(problem, config);
        let mut operator = AdaptiveOperator::new();

        let result = run_experiment(&ctx, &mut operator, Budget::Iterations(200));

        assert!(result.best_cost <= initial_cost);
        assert_eq!(result.total_iterations, 200);
        result
            .best_solution
            .debug_assert_consistent(&ctx.problem)
            .unwrap();
    }
}
