use crate::config::Config;
use crate::models::Problem;
use crate::solver::insertion::feasible_insertions;
use crate::solver::solution::Solution;
use crate::utils::Random;

/// Repeatedly places the single cheapest (call, position) pair across every
/// still-unassigned call, re-evaluating all of them after each placement
/// since inserting one call changes the insertion cost of the others on the
/// same vehicle. Once no pending call has any feasible insertion left,
/// every remaining call is outsourced (insertions only get harder to find
/// as a route fills up, never easier, so none of them will become feasible
/// later in this pass).
pub fn greedy_recreate(problem: &Problem, solution: &mut Solution) {
    let mut pending = solution.unassigned_calls();

    while !pending.is_empty() {
        let mut best: Option<(i64, usize, usize, usize, usize)> = None;

        for (index, &call) in pending.iter().enumerate() {
            let options = feasible_insertions(problem, solution, call, true);
            if let Some(option) = options.first() {
                let better = best.map_or(true, |(best_cost, ..)| option.delta_cost < best_cost);
                if better {
                    best = Some((
                        option.delta_cost,
                        index,
                        option.vehicle,
                        option.pickup_pos,
                        option.delivery_pos,
                    ));
                }
            }
        }

        match best {
            Some((_, index, vehicle, pickup_pos, delivery_pos)) => {
                let call = pending.remove(index);
                solution.insert(problem, call, vehicle, pickup_pos, delivery_pos);
            }
            None => {
                for call in pending.drain(..) {
                    solution.outsource(problem, call);
                }
            }
        }
    }
}

/// Inserts calls in the order of largest "regret": the gap between a
/// call's best and k-th best insertion cost. Calls with few good options
/// left are placed first, before later insertions close those options
/// off; ties break on the lowest best insertion cost.
pub fn regret_recreate(problem: &Problem, solution: &mut Solution, k: usize) {
    let mut pending = solution.unassigned_calls();

    while !pending.is_empty() {
        let mut best_choice: Option<(f64, i64, usize, usize, usize, i64)> = None;

        for (index, &call) in pending.iter().enumerate() {
            let options = feasible_insertions(problem, solution, call, true);

            // No feasible placement at all: outsourcing is the only
            // option, and it takes priority over every other call.
            let candidate = if options.is_empty() {
                (f64::INFINITY, i64::MIN, index, 0, 0, 0i64)
            } else {
                let best_cost = options[0].delta_cost;
                let kth_cost = options
                    .get(k - 1)
                    .unwrap_or_else(|| options.last().unwrap())
                    .delta_cost;
                let regret = (kth_cost - best_cost) as f64;
                (
                    regret,
                    best_cost,
                    index,
                    options[0].vehicle,
                    options[0].pickup_pos,
                    options[0].delivery_pos as i64,
                )
            };

            let take = match &best_choice {
                None => true,
                Some((best_regret, best_best_cost, ..)) => {
                    candidate.0 > *best_regret
                        || (candidate.0 == *best_regret && candidate.1 < *best_best_cost)
                }
            };
            if take {
                best_choice = Some(candidate);
            }
        }

        let (regret, _, index, vehicle, pickup_pos, delivery_pos) =
            best_choice.expect("pending is non-empty so a choice was recorded");
        let call = pending.remove(index);
        if regret.is_infinite() {
            solution.outsource(problem, call);
        } else {
            solution.insert(problem, call, vehicle, pickup_pos, delivery_pos as usize);
        }
    }
}

/// Inserts calls in a random order, each at a uniformly random feasible
/// position rather than the cheapest one. Falls back to outsourcing.
pub fn random_recreate(
    problem: &Problem,
    solution: &mut Solution,
    random: &Random,
    _config: &Config,
) {
    let mut pending = solution.unassigned_calls();
    random.shuffle(&mut pending);

    for call in pending {
        let options = feasible_insertions(problem, solution, call, false);
        if options.is_empty() {
            solution.outsource(problem, call);
        } else {
            let choice = &options[random.range_usize(0, options.len())];
            solution.insert(problem, call, choice.vehicle, choice.pickup_pos, choice.delivery_pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interval, Matrix, ProblemBuilder, TimeCost};

    fn problem_with_calls(n: usize) -> Problem {
        let tc = |time, cost| TimeCost { time, cost };
        let mut travel = Matrix::init(tc(0, 0), 3, 3);
        travel.set(0, 1, tc(5, 5));
        travel.set(1, 0, tc(5, 5));
        travel.set(0, 2, tc(5, 5));
        travel.set(2, 0, tc(5, 5));
        travel.set(1, 2, tc(3, 3));
        travel.set(2, 1, tc(3, 3));

        let mut builder = ProblemBuilder::new(3);
        builder.add_vehicle(
            0,
            0,
            100,
            (0..n).collect(),
            travel,
            vec![(tc(1, 1), tc(1, 1)); n],
        );
        for _ in 0..n {
            builder.add_call(1, 2, 5, 1000, Interval::new(0, 1000), Interval::new(0, 1000));
        }
        builder.build().unwrap()
    }

    #[test]
    fn greedy_recreate_places_every_call() {
        let problem = problem_with_calls(3);
        let mut solution = Solution::initial(&problem);
        for call in 0..3 {
            solution.remove(&problem, call);
        }
        greedy_recreate(&problem, &mut solution);
        assert!(solution.unassigned_calls().is_empty());
        solution.debug_assert_consistent(&problem).unwrap();
    }

    #[test]
    fn regret_recreate_places_every_call() {
        let problem = problem_with_calls(3);
        let mut solution = Solution::initial(&problem);
        for call in 0..3 {
            solution.remove(&problem, call);
        }
        regret_recreate(&problem, &mut solution, 2);
        assert!(solution.unassigned_calls().is_empty());
        solution.debug_assert_consistent(&problem).unwrap();
    }
}
