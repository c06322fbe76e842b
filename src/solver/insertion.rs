use crate::models::Problem;
use crate::solver::solution::{FailureReason, Solution, Stop};

/// A feasible place to splice a call's pickup and delivery stops into a
/// vehicle's route, and the resulting change in that vehicle's cost.
#[derive(Copy, Clone, Debug)]
pub struct InsertionOption {
    pub vehicle: usize,
    pub pickup_pos: usize,
    pub delivery_pos: usize,
    pub delta_cost: i64,
}

/// All feasible insertions of `call` into any vehicle compatible with it.
/// Infeasible splices are pruned as soon as the failure reason makes
/// every later delivery position for the same pickup position equally
/// hopeless, rather than simulating each one to find out.
pub fn feasible_insertions(
    problem: &Problem,
    solution: &mut Solution,
    call: usize,
    sorted: bool,
) -> Vec<InsertionOption> {
    let mut options = Vec::new();

    'vehicle: for &vehicle in problem.possible_vehicles(call) {
        let base_route = solution.routes[vehicle].clone();
        let base_cost = solution.vehicle_cost(problem, vehicle);
        let n = base_route.len();

        for pickup_pos in 0..=n {
            let mut with_pickup = base_route.clone();
            with_pickup.insert(pickup_pos, Stop::Pickup(call));

            for delivery_pos in (pickup_pos + 1)..=with_pickup.len() {
                let mut candidate = with_pickup.clone();
                candidate.insert(delivery_pos, Stop::Delivery(call));

                match crate::solver::solution::simulate_for_insertion(problem, vehicle, &candidate)
                {
                    None => {
                        let cost =
                            crate::solver::solution::cost_for_insertion(problem, vehicle, &candidate);
                        options.push(InsertionOption {
                            vehicle,
                            pickup_pos,
                            delivery_pos,
                            delta_cost: cost - base_cost,
                        });
                    }
                    Some((pos, FailureReason::Capacity)) if pos >= pickup_pos => break,
                    // Pickup itself missed its window: arrival times are
                    // monotone non-decreasing, so every later pickup_pos on
                    // this vehicle arrives even later. Abandon the vehicle.
                    Some((pos, FailureReason::TimeWindow)) if pos == pickup_pos => break 'vehicle,
                    Some((pos, FailureReason::TimeWindow)) if pos == delivery_pos => break,
                    _ => continue,
                }
            }
        }
    }

    if sorted {
        options.sort_by_key(|option| option.delta_cost);
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interval, Matrix, ProblemBuilder, TimeCost};

    fn simple_problem() -> Problem {
        let tc = |time, cost| TimeCost { time, cost };
        let mut travel = Matrix::init(tc(0, 0), 3, 3);
        travel.set(0, 1, tc(5, 5));
        travel.set(1, 0, tc(5, 5));
        travel.set(0, 2, tc(5, 5));
        travel.set(2, 0, tc(5, 5));
        travel.set(1, 2, tc(3, 3));
        travel.set(2, 1, tc(3, 3));

        let mut builder = ProblemBuilder::new(3);
        builder.add_vehicle(0, 0, 10, vec![0], travel, vec![(tc(1, 1), tc(1, 1))]);
        builder.add_call(1, 2, 5, 1000, Interval::new(0, 100), Interval::new(0, 100));
        builder.build().unwrap()
    }

    #[test]
    fn finds_at_least_one_feasible_insertion() {
        let problem = simple_problem();
        let mut solution = Solution::initial(&problem);
        solution.remove(&problem, 0);
        let options = feasible_insertions(&problem, &mut solution, 0, true);
        assert!(!options.is_empty());
        assert_eq!(options[0].vehicle, 0);
    }

    #[test]
    fn tight_pickup_window_rules_out_every_insertion() {
        let problem = {
            let tc = |time, cost| TimeCost { time, cost };
            let mut travel = Matrix::init(tc(0, 0), 3, 3);
            travel.set(0, 1, tc(50, 50));
            travel.set(1, 0, tc(50, 50));
            travel.set(0, 2, tc(50, 50));
            travel.set(2, 0, tc(50, 50));
            travel.set(1, 2, tc(3, 3));
            travel.set(2, 1, tc(3, 3));

            let mut builder = ProblemBuilder::new(3);
            builder.add_vehicle(0, 0, 10, vec![0], travel, vec![(tc(1, 1), tc(1, 1))]);
            // Pickup window closes before the vehicle could possibly arrive.
            builder.add_call(1, 2, 5, 1000, Interval::new(0, 1), Interval::new(0, 100));
            builder.build().unwrap()
        };
        let mut solution = Solution::initial(&problem);
        solution.remove(&problem, 0);
        let options = feasible_insertions(&problem, &mut solution, 0, true);
        assert!(options.is_empty());
    }
}
