use crate::models::Problem;
use crate::solver::solution::{CallLocation, Solution};
use crate::utils::Random;

fn placed_calls(problem: &Problem, solution: &Solution) -> Vec<usize> {
    (0..problem.num_calls())
        .filter(|&call| !matches!(solution.location(call), CallLocation::Removed))
        .collect()
}

/// Removes `count` calls chosen uniformly at random (Floyd's algorithm,
/// so no call can be picked twice) from wherever they currently sit.
pub fn random_removal(
    problem: &Problem,
    solution: &mut Solution,
    random: &Random,
    count: usize,
) -> Vec<usize> {
    let candidates = placed_calls(problem, solution);
    let count = count.min(candidates.len());
    let picks = random.floyd_sample(candidates.len(), count);
    let removed: Vec<usize> = picks.into_iter().map(|index| candidates[index]).collect();
    for &call in &removed {
        solution.remove(problem, call);
    }
    removed
}

/// Removes the `count` routed calls whose removal saves the most cost on
/// their vehicle, i.e. the calls that are currently most expensive to
/// serve. Outsourced calls are left alone: there is no routing cost to
/// save by un-outsourcing them.
///
/// Picks one call at a time and recomputes every remaining candidate's
/// delta against the solution as it stands after each removal, rather than
/// scoring everything once up front: removing a call changes its vehicle's
/// remaining route, so a delta computed before an earlier removal on the
/// same vehicle can be stale by the time its turn comes.
pub fn costly_removal(problem: &Problem, solution: &mut Solution, count: usize) -> Vec<usize> {
    let mut removed = Vec::new();

    for _ in 0..count {
        let mut best: Option<(i64, usize)> = None;

        for call in 0..problem.num_calls() {
            if let CallLocation::Routed {
                vehicle,
                pickup_pos,
                delivery_pos,
            } = solution.location(call)
            {
                let with_call = solution.vehicle_cost(problem, vehicle);
                let mut without_call = solution.routes[vehicle].clone();
                without_call.remove(delivery_pos.max(pickup_pos));
                without_call.remove(delivery_pos.min(pickup_pos));
                let without_cost =
                    crate::solver::solution::cost_for_insertion(problem, vehicle, &without_call);
                let delta = with_call - without_cost;

                let better = best.map_or(true, |(best_delta, _)| delta > best_delta);
                if better {
                    best = Some((delta, call));
                }
            }
        }

        match best {
            Some((_, call)) => {
                solution.remove(problem, call);
                removed.push(call);
            }
            None => break,
        }
    }

    removed
}

/// Picks a random seed call and removes it along with its `count - 1`
/// most related neighbors (spatially and temporally close calls, per
/// the problem's precomputed relatedness table).
pub fn similar_removal(
    problem: &Problem,
    solution: &mut Solution,
    random: &Random,
    count: usize,
) -> Vec<usize> {
    let candidates = placed_calls(problem, solution);
    if candidates.is_empty() {
        return Vec::new();
    }
    let seed = candidates[random.range_usize(0, candidates.len())];

    let mut removed = vec![seed];
    for &neighbor in &problem.calls[seed].similarities {
        if removed.len() >= count {
            break;
        }
        if !matches!(solution.location(neighbor), CallLocation::Removed) {
            removed.push(neighbor);
        }
    }

    for &call in &removed {
        solution.remove(problem, call);
    }
    removed
}
