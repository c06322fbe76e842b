use std::collections::HashSet;

use ahash::RandomState;

use crate::error::{Error, Result};
use crate::models::Matrix;

/// Travel time and cost between two nodes, or load/unload time and cost
/// for a call at one of its endpoints.
#[derive(Copy, Clone, Debug, Default)]
pub struct TimeCost {
    pub time: i64,
    pub cost: i64,
}

/// Inclusive time window `[lo, hi]`.
#[derive(Copy, Clone, Debug)]
pub struct Interval {
    pub lo: i64,
    pub hi: i64,
}

impl Interval {
    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, time: i64) -> bool {
        time >= self.lo && time <= self.hi
    }

    /// Length of the symmetric difference between two intervals, used as
    /// the temporal term of the relatedness score.
    fn symmetric_difference_length(&self, other: &Interval) -> i64 {
        let union_lo = self.lo.min(other.lo);
        let union_hi = self.hi.max(other.hi);
        let union_len = union_hi - union_lo;

        let inter_lo = self.lo.max(other.lo);
        let inter_hi = self.hi.min(other.hi);
        let inter_len = if inter_hi >= inter_lo {
            inter_hi - inter_lo
        } else {
            0
        };

        union_len - inter_len
    }
}

#[derive(Clone, Debug)]
pub struct Vehicle {
    pub home_node: usize,
    pub start_time: i64,
    pub capacity: i64,
    /// Calls this vehicle is compatible with.
    pub possible_calls: Vec<usize>,
    possible_calls_set: HashSet<usize, RandomState>,
    /// `N x N` travel (time, cost) table between nodes.
    pub travel: Matrix<TimeCost>,
    /// Per-call (load, unload) (time, cost) at origin/destination, indexed by call id.
    pub service: Vec<(TimeCost, TimeCost)>,
}

impl Vehicle {
    pub fn serves(&self, call: usize) -> bool {
        self.possible_calls_set.contains(&call)
    }
}

#[derive(Clone, Debug)]
pub struct Call {
    pub origin_node: usize,
    pub destination_node: usize,
    pub size: i64,
    pub cost_of_not_transporting: i64,
    pub pickup_window: Interval,
    pub delivery_window: Interval,
    /// Real vehicles this call is compatible with (the dummy outsource
    /// vehicle is always compatible and is never listed here).
    pub possible_vehicles: Vec<usize>,
    possible_vehicles_set: HashSet<usize, RandomState>,
    /// Other calls sorted by ascending relatedness (most related first).
    pub similarities: Vec<usize>,
}

impl Call {
    pub fn allows(&self, vehicle: usize) -> bool {
        self.possible_vehicles_set.contains(&vehicle)
    }
}

#[derive(Debug)]
pub struct Problem {
    pub num_nodes: usize,
    pub vehicles: Vec<Vehicle>,
    pub calls: Vec<Call>,
}

impl Problem {
    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn num_calls(&self) -> usize {
        self.calls.len()
    }

    /// Index of the dummy outsource vehicle: pinned at `V` (spec's `V+1`
    /// under 1-based numbering), never "the last vehicle" relabeled.
    pub fn outsource_vehicle(&self) -> usize {
        self.vehicles.len()
    }

    /// Real vehicles compatible with `call`. The outsource vehicle is
    /// always an option and is not included here.
    pub fn possible_vehicles(&self, call: usize) -> &[usize] {
        &self.calls[call].possible_vehicles
    }

    pub fn compatible(&self, vehicle: usize, call: usize) -> bool {
        if vehicle == self.outsource_vehicle() {
            true
        } else {
            self.vehicles[vehicle].serves(call) && self.calls[call].allows(vehicle)
        }
    }
}

/// Accumulates raw instance data and validates + precomputes the
/// relatedness table on `build()`. Populated either by an external parser
/// or directly by tests; this crate does not parse the on-disk instance
/// text format itself.
#[derive(Debug)]
pub struct ProblemBuilder {
    num_nodes: usize,
    vehicles: Vec<Vehicle>,
    calls: Vec<Call>,
}

impl ProblemBuilder {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            vehicles: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn add_vehicle(
        &mut self,
        home_node: usize,
        start_time: i64,
        capacity: i64,
        possible_calls: Vec<usize>,
        travel: Matrix<TimeCost>,
        service: Vec<(TimeCost, TimeCost)>,
    ) -> &mut Self {
        let possible_calls_set = possible_calls.iter().copied().collect();
        self.vehicles.push(Vehicle {
            home_node,
            start_time,
            capacity,
            possible_calls,
            possible_calls_set,
            travel,
            service,
        });
        self
    }

    pub fn add_call(
        &mut self,
        origin_node: usize,
        destination_node: usize,
        size: i64,
        cost_of_not_transporting: i64,
        pickup_window: Interval,
        delivery_window: Interval,
    ) -> &mut Self {
        self.calls.push(Call {
            origin_node,
            destination_node,
            size,
            cost_of_not_transporting,
            pickup_window,
            delivery_window,
            possible_vehicles: Vec::new(),
            possible_vehicles_set: HashSet::default(),
            similarities: Vec::new(),
        });
        self
    }

    fn validate(&self) -> Result<()> {
        for (index, vehicle) in self.vehicles.iter().enumerate() {
            if vehicle.capacity < 0 {
                return Err(Error::MalformedProblem(format!(
                    "vehicle {} has negative capacity {}",
                    index, vehicle.capacity
                )));
            }
            if vehicle.home_node >= self.num_nodes {
                return Err(Error::MalformedProblem(format!(
                    "vehicle {} home node {} out of range",
                    index, vehicle.home_node
                )));
            }
            for &call in vehicle.possible_calls.iter() {
                if call >= self.calls.len() {
                    return Err(Error::MalformedProblem(format!(
                        "vehicle {} references unknown call {}",
                        index, call
                    )));
                }
            }
        }

        for (index, call) in self.calls.iter().enumerate() {
            if call.size < 0 {
                return Err(Error::MalformedProblem(format!(
                    "call {} has negative size {}",
                    index, call.size
                )));
            }
            if call.origin_node >= self.num_nodes || call.destination_node >= self.num_nodes {
                return Err(Error::MalformedProblem(format!(
                    "call {} references an out-of-range node",
                    index
                )));
            }
            if call.pickup_window.lo > call.pickup_window.hi {
                return Err(Error::MalformedProblem(format!(
                    "call {} has an empty pickup window",
                    index
                )));
            }
            if call.delivery_window.lo > call.delivery_window.hi {
                return Err(Error::MalformedProblem(format!(
                    "call {} has an empty delivery window",
                    index
                )));
            }
            if call.delivery_window.hi < call.pickup_window.lo {
                return Err(Error::MalformedProblem(format!(
                    "call {} delivery window ends before its pickup window can even open",
                    index
                )));
            }
        }

        let mut seen_pairs = HashSet::new();
        for (vehicle_index, vehicle) in self.vehicles.iter().enumerate() {
            for &call in vehicle.possible_calls.iter() {
                if !seen_pairs.insert((vehicle_index, call)) {
                    return Err(Error::MalformedProblem(format!(
                        "call {} listed twice for vehicle {}",
                        call, vehicle_index
                    )));
                }
            }
        }

        Ok(())
    }

    /// Average travel cost between every pair of nodes, averaged over all
    /// real vehicles' cost matrices. Used only to build the relatedness
    /// table; the feasibility/cost algorithms use each vehicle's own
    /// matrix directly.
    fn average_cost_matrix(&self) -> Matrix<f64> {
        let n = self.num_nodes;
        let mut average = Matrix::init(0f64, n, n);
        if self.vehicles.is_empty() {
            return average;
        }
        for from in 0..n {
            for to in 0..n {
                let total: i64 = self
                    .vehicles
                    .iter()
                    .map(|vehicle| vehicle.travel.get(from, to).cost)
                    .sum();
                average.set(from, to, total as f64 / self.vehicles.len() as f64);
            }
        }
        average
    }

    fn relatedness(&self, average_cost: &Matrix<f64>, a: usize, b: usize) -> f64 {
        let call_a = &self.calls[a];
        let call_b = &self.calls[b];

        let spatial = average_cost.get(call_a.origin_node, call_b.origin_node)
            + average_cost.get(call_a.destination_node, call_b.destination_node);

        let temporal = call_a
            .pickup_window
            .symmetric_difference_length(&call_b.pickup_window) as f64;

        spatial + temporal
    }

    pub fn build(mut self) -> Result<Problem> {
        self.validate()?;

        // Invert vehicle -> calls into call -> vehicles.
        for (vehicle_index, vehicle) in self.vehicles.iter().enumerate() {
            for &call in vehicle.possible_calls.iter() {
                self.calls[call].possible_vehicles.push(vehicle_index);
            }
        }
        for call in self.calls.iter_mut() {
            call.possible_vehicles_set = call.possible_vehicles.iter().copied().collect();
        }

        let average_cost = self.average_cost_matrix();
        let num_calls = self.calls.len();
        for call in 0..num_calls {
            let mut scored: Vec<(f64, usize)> = (0..num_calls)
                .filter(|&other| other != call)
                .map(|other| (self.relatedness(&average_cost, call, other), other))
                .collect();
            scored.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("relatedness scores are finite"));
            self.calls[call].similarities = scored.into_iter().map(|(_, other)| other).collect();
        }

        Ok(Problem {
            num_nodes: self.num_nodes,
            vehicles: self.vehicles,
            calls: self.calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_travel(n: usize, time: i64, cost: i64) -> Matrix<TimeCost> {
        Matrix::init(TimeCost { time, cost }, n, n)
    }

    #[test]
    fn rejects_negative_capacity() {
        let mut builder = ProblemBuilder::new(2);
        builder.add_vehicle(
            0,
            0,
            -1,
            vec![],
            flat_travel(2, 1, 1),
            vec![(TimeCost::default(), TimeCost::default())],
        );
        assert!(matches!(builder.build(), Err(Error::MalformedProblem(_))));
    }

    #[test]
    fn rejects_inverted_pickup_window() {
        let mut builder = ProblemBuilder::new(2);
        builder.add_call(0, 1, 1, 10, Interval::new(10, 5), Interval::new(0, 100));
        assert!(matches!(builder.build(), Err(Error::MalformedProblem(_))));
    }

    #[test]
    fn rejects_delivery_window_that_cannot_follow_pickup_window() {
        let mut builder = ProblemBuilder::new(2);
        builder.add_call(0, 1, 1, 10, Interval::new(100, 200), Interval::new(0, 50));
        assert!(matches!(builder.build(), Err(Error::MalformedProblem(_))));
    }

    #[test]
    fn outsource_vehicle_is_pinned_at_v() {
        let mut builder = ProblemBuilder::new(2);
        builder.add_vehicle(
            0,
            0,
            10,
            vec![0],
            flat_travel(2, 1, 1),
            vec![(TimeCost::default(), TimeCost::default())],
        );
        builder.add_call(0, 1, 1, 10, Interval::new(0, 100), Interval::new(0, 100));
        let problem = builder.build().unwrap();
        assert_eq!(problem.outsource_vehicle(), 1);
        assert_eq!(problem.num_vehicles(), 1);
    }

    #[test]
    fn relatedness_sorts_more_similar_calls_first() {
        let mut builder = ProblemBuilder::new(4);
        builder.add_vehicle(
            0,
            0,
            100,
            vec![0, 1, 2],
            flat_travel(4, 1, 1),
            vec![
                (TimeCost::default(), TimeCost::default()),
                (TimeCost::default(), TimeCost::default()),
                (TimeCost::default(), TimeCost::default()),
            ],
        );
        // Call 0 and 1 share windows and nodes; call 2 is far away in time.
        builder.add_call(0, 1, 1, 10, Interval::new(0, 10), Interval::new(0, 10));
        builder.add_call(0, 1, 1, 10, Interval::new(0, 10), Interval::new(0, 10));
        builder.add_call(0, 1, 1, 10, Interval::new(1000, 1010), Interval::new(0, 10));
        let problem = builder.build().unwrap();
        assert_eq!(problem.calls[0].similarities[0], 1);
    }
}
