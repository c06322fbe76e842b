use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::models::Problem;
use crate::solver::solution::Solution;

#[derive(Debug, Deserialize, Serialize)]
pub struct HistoricSolution {
    pub routes: Vec<i64>,
    pub cost: i64,
}

impl HistoricSolution {
    fn from_solution(problem: &Problem, solution: &Solution) -> Self {
        Self {
            routes: solution.to_wire(problem),
            cost: solution.clone().cost(problem),
        }
    }
}

#[derive(Debug)]
pub struct HistoryEntry {
    pub solution: HistoricSolution,
    pub timestamp: Duration,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HistoryMessage {
    pub timestamp: Duration,
    pub message: String,
}

impl fmt::Display for HistoryMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Time: {:?}, {}", self.timestamp, self.message)
    }
}

/// Log of best-so-far solutions found during a search, mirroring the
/// teacher's search history but over PDPTW solutions instead of GA
/// individuals. Only the most recent solution keeps its route detail;
/// earlier entries are trimmed to just their cost, matching the
/// teacher's "keep only json for the last found solution" policy.
#[derive(Debug)]
pub struct SearchHistory {
    history: Vec<HistoryEntry>,
    pub best_cost: i64,
    pub start_time: Instant,
    pub messages: Vec<HistoryMessage>,
}

impl SearchHistory {
    pub fn new(start_time: Instant) -> Self {
        Self {
            history: Vec::new(),
            best_cost: i64::MAX,
            start_time,
            messages: Vec::new(),
        }
    }

    fn remove_previous_data(&mut self) {
        if let Some(last) = self.history.last_mut() {
            last.solution.routes = Vec::new();
        }
    }

    pub fn add(&mut self, problem: &Problem, solution: &Solution, cost: i64) {
        self.best_cost = cost;
        let timestamp = self.start_time.elapsed();
        let history_entry = HistoryEntry {
            solution: HistoricSolution::from_solution(problem, solution),
            timestamp,
        };

        let new_best_message = HistoryMessage {
            message: format!("New best: {}", self.best_cost),
            timestamp,
        };
        log::info!("{}", new_best_message);

        self.remove_previous_data();
        self.history.push(history_entry);
    }

    pub fn add_message(&mut self, message: String) {
        let history_message = HistoryMessage {
            message,
            timestamp: self.start_time.elapsed(),
        };
        log::info!(
            "Time: {:?}, {}",
            history_message.timestamp,
            history_message.message
        );
        self.messages.push(history_message);
    }

    pub fn entries(&self) -> &Vec<HistoryEntry> {
        &self.history
    }

    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }
}
