use crate::error::{Error, Result};
use crate::models::Problem;

/// A single stop along a vehicle's route. Calls are routed as a pickup
/// stop followed later by a delivery stop; the outsource vehicle only
/// ever holds pickup stops, standing in for "not transported".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stop {
    Pickup(usize),
    Delivery(usize),
}

impl Stop {
    pub fn call(self) -> usize {
        match self {
            Stop::Pickup(call) | Stop::Delivery(call) => call,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallLocation {
    Routed {
        vehicle: usize,
        pickup_pos: usize,
        delivery_pos: usize,
    },
    Outsourced {
        pos: usize,
    },
    /// Pulled out of every route by a ruin heuristic, awaiting a
    /// recreate heuristic to place it again.
    Removed,
}

#[derive(Copy, Clone, Debug)]
struct TraceStep {
    node: usize,
    time: i64,
    load: i64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    Incompatible,
    Capacity,
    TimeWindow,
}

/// Result of walking a vehicle's route: the running (node, time, load)
/// after each stop, the accumulated travel+service cost, and the first
/// position (if any) at which the route breaks feasibility.
struct Simulation {
    trace: Vec<TraceStep>,
    cost: i64,
    failure: Option<(usize, FailureReason)>,
}

fn simulate(problem: &Problem, vehicle: usize, route: &[Stop]) -> Simulation {
    let v = &problem.vehicles[vehicle];
    let mut node = v.home_node;
    let mut time = v.start_time;
    let mut load = 0i64;
    let mut cost = 0i64;
    let mut trace = Vec::with_capacity(route.len());
    let mut failure = None;

    for (pos, stop) in route.iter().enumerate() {
        let call_id = stop.call();
        let call = &problem.calls[call_id];

        if failure.is_none() && !problem.compatible(vehicle, call_id) {
            failure = Some((pos, FailureReason::Incompatible));
        }

        let (to_node, delta, window, service) = match stop {
            Stop::Pickup(_) => (
                call.origin_node,
                call.size,
                call.pickup_window,
                v.service[call_id].0,
            ),
            Stop::Delivery(_) => (
                call.destination_node,
                -call.size,
                call.delivery_window,
                v.service[call_id].1,
            ),
        };

        let travel = v.travel.get(node, to_node);
        let arrival = time + travel.time;
        cost += travel.cost;

        let start_of_service = arrival.max(window.lo);
        if failure.is_none() && start_of_service > window.hi {
            failure = Some((pos, FailureReason::TimeWindow));
        }

        time = start_of_service + service.time;
        cost += service.cost;
        load += delta;
        if failure.is_none() && load > v.capacity {
            failure = Some((pos, FailureReason::Capacity));
        }

        node = to_node;
        trace.push(TraceStep { node, time, load });
    }

    Simulation {
        trace,
        cost,
        failure,
    }
}

/// Feasibility check for a candidate route, used by the insertion engine
/// on routes that are not yet (and may never be) part of a `Solution`.
pub(crate) fn simulate_for_insertion(
    problem: &Problem,
    vehicle: usize,
    route: &[Stop],
) -> Option<(usize, FailureReason)> {
    simulate(problem, vehicle, route).failure
}

pub(crate) fn cost_for_insertion(problem: &Problem, vehicle: usize, route: &[Stop]) -> i64 {
    simulate(problem, vehicle, route).cost
}

/// A complete assignment of calls to vehicles (including the dummy
/// outsource vehicle), with lazily recomputed, cached feasibility and
/// cost per vehicle.
#[derive(Clone, Debug)]
pub struct Solution {
    /// `routes[v]` for `v < V` is a real vehicle's stop sequence;
    /// `routes[V]` is the outsource vehicle's list of pickup-only stops.
    pub routes: Vec<Vec<Stop>>,
    call_location: Vec<CallLocation>,
    vehicle_cost: Vec<Option<i64>>,
    vehicle_feasible: Vec<Option<bool>>,
}

impl Solution {
    /// The solution with every call outsourced: always feasible, and the
    /// natural starting point before any ruin/recreate iteration.
    pub fn initial(problem: &Problem) -> Self {
        let outsource = problem.outsource_vehicle();
        let mut routes = vec![Vec::new(); outsource + 1];
        routes[outsource] = (0..problem.num_calls()).map(Stop::Pickup).collect();

        let call_location = (0..problem.num_calls())
            .map(|pos| CallLocation::Outsourced { pos })
            .collect();

        Self {
            routes,
            call_location,
            vehicle_cost: vec![None; outsource + 1],
            vehicle_feasible: vec![None; outsource + 1],
        }
    }

    pub fn location(&self, call: usize) -> CallLocation {
        self.call_location[call]
    }

    pub fn unassigned_calls(&self) -> Vec<usize> {
        self.call_location
            .iter()
            .enumerate()
            .filter(|(_, loc)| matches!(loc, CallLocation::Removed))
            .map(|(call, _)| call)
            .collect()
    }

    pub fn outsourced_calls(&self, problem: &Problem) -> Vec<usize> {
        self.routes[problem.outsource_vehicle()]
            .iter()
            .map(|stop| stop.call())
            .collect()
    }

    fn invalidate(&mut self, vehicle: usize) {
        self.vehicle_cost[vehicle] = None;
        self.vehicle_feasible[vehicle] = None;
    }

    fn ensure(&mut self, problem: &Problem, vehicle: usize) {
        if self.vehicle_cost[vehicle].is_some() {
            return;
        }
        if vehicle == problem.outsource_vehicle() {
            let cost: i64 = self.routes[vehicle]
                .iter()
                .map(|stop| problem.calls[stop.call()].cost_of_not_transporting)
                .sum();
            self.vehicle_cost[vehicle] = Some(cost);
            self.vehicle_feasible[vehicle] = Some(true);
        } else {
            let sim = simulate(problem, vehicle, &self.routes[vehicle]);
            self.vehicle_cost[vehicle] = Some(sim.cost);
            self.vehicle_feasible[vehicle] = Some(sim.failure.is_none());
        }
    }

    /// Recheck feasibility of `vehicle`'s route, returning the first
    /// failing position (if any) and why. Does not touch the cost cache.
    pub fn check_feasibility(
        &self,
        problem: &Problem,
        vehicle: usize,
    ) -> Option<(usize, FailureReason)> {
        if vehicle == problem.outsource_vehicle() {
            return None;
        }
        simulate(problem, vehicle, &self.routes[vehicle]).failure
    }

    pub fn vehicle_feasible(&mut self, problem: &Problem, vehicle: usize) -> bool {
        self.ensure(problem, vehicle);
        self.vehicle_feasible[vehicle].unwrap()
    }

    pub fn is_feasible(&mut self, problem: &Problem) -> bool {
        (0..self.routes.len()).all(|vehicle| self.vehicle_feasible(problem, vehicle))
    }

    pub fn vehicle_cost(&mut self, problem: &Problem, vehicle: usize) -> i64 {
        self.ensure(problem, vehicle);
        self.vehicle_cost[vehicle].unwrap()
    }

    pub fn cost(&mut self, problem: &Problem) -> i64 {
        (0..self.routes.len())
            .map(|vehicle| self.vehicle_cost(problem, vehicle))
            .sum()
    }

    /// Returns the (node, time, load) after each stop of `vehicle`'s
    /// route, recomputed fresh. The insertion engine reuses the prefix
    /// of this trace up to the point it is splicing into.
    pub fn vehicle_trace(&self, problem: &Problem, vehicle: usize) -> Vec<(usize, i64, i64)> {
        simulate(problem, vehicle, &self.routes[vehicle])
            .trace
            .into_iter()
            .map(|step| (step.node, step.time, step.load))
            .collect()
    }

    /// Recomputes `call_location` for every stop currently on `vehicle`'s
    /// route. Called after any splice; routes are short enough (one
    /// vehicle's calls, not the whole instance) that this is cheaper than
    /// bookkeeping shifted indices by hand and far less error-prone.
    fn reindex_route(&mut self, vehicle: usize) {
        let mut pickup_pos_of = std::collections::HashMap::new();
        for (pos, stop) in self.routes[vehicle].iter().enumerate() {
            if let Stop::Pickup(call) = stop {
                pickup_pos_of.insert(*call, pos);
            }
        }
        for (pos, stop) in self.routes[vehicle].iter().enumerate() {
            if let Stop::Delivery(call) = stop {
                let pickup_pos = pickup_pos_of[call];
                self.call_location[*call] = CallLocation::Routed {
                    vehicle,
                    pickup_pos,
                    delivery_pos: pos,
                };
            }
        }
    }

    fn reindex_outsource(&mut self, outsource: usize) {
        for (pos, stop) in self.routes[outsource].iter().enumerate() {
            self.call_location[stop.call()] = CallLocation::Outsourced { pos };
        }
    }

    /// Pulls `call` out of whichever route holds it and marks it
    /// `Removed`. A no-op (returns false) if the call is already removed.
    pub fn remove(&mut self, problem: &Problem, call: usize) -> bool {
        match self.call_location[call] {
            CallLocation::Removed => false,
            CallLocation::Outsourced { pos } => {
                let outsource = problem.outsource_vehicle();
                self.routes[outsource].remove(pos);
                self.call_location[call] = CallLocation::Removed;
                self.reindex_outsource(outsource);
                self.invalidate(outsource);
                true
            }
            CallLocation::Routed {
                vehicle,
                pickup_pos,
                delivery_pos,
            } => {
                // Remove the later position first so the earlier index
                // stays valid.
                let (first, second) = if pickup_pos < delivery_pos {
                    (delivery_pos, pickup_pos)
                } else {
                    (pickup_pos, delivery_pos)
                };
                self.routes[vehicle].remove(first);
                self.routes[vehicle].remove(second);
                self.call_location[call] = CallLocation::Removed;
                self.reindex_route(vehicle);
                self.invalidate(vehicle);
                true
            }
        }
    }

    /// Inserts a currently-`Removed` call into a real vehicle's route at
    /// the given pickup/delivery positions (indices into the route as it
    /// is *before* insertion; `pickup_pos <= delivery_pos`).
    pub fn insert(
        &mut self,
        problem: &Problem,
        call: usize,
        vehicle: usize,
        pickup_pos: usize,
        delivery_pos: usize,
    ) {
        debug_assert!(matches!(self.call_location[call], CallLocation::Removed));
        debug_assert_ne!(vehicle, problem.outsource_vehicle());
        debug_assert!(pickup_pos <= delivery_pos);

        self.routes[vehicle].insert(pickup_pos, Stop::Pickup(call));
        self.routes[vehicle].insert(delivery_pos + 1, Stop::Delivery(call));
        self.reindex_route(vehicle);
        self.invalidate(vehicle);
    }

    /// Moves a currently-`Removed` call onto the outsource vehicle.
    pub fn outsource(&mut self, problem: &Problem, call: usize) {
        debug_assert!(matches!(self.call_location[call], CallLocation::Removed));
        let outsource = problem.outsource_vehicle();
        self.routes[outsource].push(Stop::Pickup(call));
        self.reindex_outsource(outsource);
        self.invalidate(outsource);
    }

    /// Flat integer encoding: one line of call ids per real vehicle
    /// (duplicated pickup/delivery in route order), terminated by `0`,
    /// followed by the outsourced calls.
    pub fn to_wire(&self, problem: &Problem) -> Vec<i64> {
        let mut wire = Vec::new();
        for vehicle in 0..problem.num_vehicles() {
            for stop in &self.routes[vehicle] {
                wire.push(stop.call() as i64 + 1);
            }
            wire.push(0);
        }
        for call in self.outsourced_calls(problem) {
            wire.push(call as i64 + 1);
        }
        wire
    }

    pub fn from_wire(problem: &Problem, wire: &[i64]) -> Result<Self> {
        let mut solution = Solution::initial(problem);
        for call in 0..problem.num_calls() {
            solution.remove(problem, call);
        }

        let mut vehicle = 0usize;
        let mut pending_pickup: Vec<Option<usize>> = vec![None; problem.num_calls()];
        for &entry in wire.iter() {
            if entry == 0 {
                vehicle += 1;
                continue;
            }
            let call = (entry - 1) as usize;
            if call >= problem.num_calls() {
                return Err(Error::InvalidSolution(format!(
                    "wire format references unknown call {}",
                    call
                )));
            }
            if vehicle >= problem.num_vehicles() {
                solution.outsource(problem, call);
                continue;
            }
            match pending_pickup[call] {
                None => {
                    pending_pickup[call] = Some(solution.routes[vehicle].len());
                    solution.routes[vehicle].push(Stop::Pickup(call));
                }
                Some(pickup_pos) => {
                    let delivery_pos = solution.routes[vehicle].len();
                    solution.routes[vehicle].push(Stop::Delivery(call));
                    solution.call_location[call] = CallLocation::Routed {
                        vehicle,
                        pickup_pos,
                        delivery_pos,
                    };
                }
            }
        }
        for vehicle in 0..=problem.outsource_vehicle() {
            solution.invalidate(vehicle);
        }
        solution.debug_assert_consistent(problem)?;
        Ok(solution)
    }

    /// Cross-checks every call's cached location against the routes
    /// themselves. Intended for tests and for periodic verification
    /// around ruin/recreate, not for the search's hot path.
    pub fn debug_assert_consistent(&self, problem: &Problem) -> Result<()> {
        for (vehicle, route) in self.routes.iter().enumerate() {
            let mut seen_pickup = std::collections::HashMap::new();
            for (pos, stop) in route.iter().enumerate() {
                let call = stop.call();
                if vehicle != problem.outsource_vehicle() && !problem.compatible(vehicle, call) {
                    return Err(Error::InvalidSolution(format!(
                        "call {} is routed on incompatible vehicle {}",
                        call, vehicle
                    )));
                }
                match stop {
                    Stop::Pickup(_) => {
                        seen_pickup.insert(call, pos);
                    }
                    Stop::Delivery(_) => {
                        let pickup_pos = seen_pickup.get(&call).copied().ok_or_else(|| {
                            Error::InvalidSolution(format!(
                                "call {} delivered before pickup on vehicle {}",
                                call, vehicle
                            ))
                        })?;
                        let expected = CallLocation::Routed {
                            vehicle,
                            pickup_pos,
                            delivery_pos: pos,
                        };
                        if self.call_location[call] != expected {
                            return Err(Error::InvalidSolution(format!(
                                "call {} location cache disagrees with route contents",
                                call
                            )));
                        }
                    }
                }
            }
            if vehicle == problem.outsource_vehicle() {
                for (pos, stop) in route.iter().enumerate() {
                    let call = stop.call();
                    if self.call_location[call] != (CallLocation::Outsourced { pos }) {
                        return Err(Error::InvalidSolution(format!(
                            "outsourced call {} location cache disagrees with route contents",
                            call
                        )));
                    }
                }
            }
        }

        let mut placed = vec![false; problem.num_calls()];
        for vehicle in 0..self.routes.len() {
            for stop in &self.routes[vehicle] {
                placed[stop.call()] = true;
            }
        }
        for call in 0..problem.num_calls() {
            let removed = matches!(self.call_location[call], CallLocation::Removed);
            if placed[call] == removed {
                return Err(Error::InvalidSolution(format!(
                    "call {} placement does not match its cached location",
                    call
                )));
            }
        }

        Ok(())
    }
}
