use crate::config::Config;
use crate::models::Problem;
use crate::solver::recreate::{greedy_recreate, random_recreate, regret_recreate};
use crate::solver::ruin::{costly_removal, random_removal, similar_removal};
use crate::solver::solution::Solution;
use crate::utils::Random;

#[derive(Copy, Clone, Debug)]
pub enum RuinKind {
    Random,
    Costly,
    Similar,
}

#[derive(Copy, Clone, Debug)]
pub enum RecreateKind {
    Greedy,
    Regret,
    Random,
}

/// One (ruin, recreate) pair tracked by the adaptive selector, with its
/// roulette-wheel weight and its running score/usage for the current
/// reweighting segment.
struct WeightedOperator {
    ruin: RuinKind,
    recreate: RecreateKind,
    weight: f64,
    segment_score: f64,
    segment_uses: u64,
}

/// Selects among ruin/recreate pairs by roulette-wheel sampling of their
/// weights, and periodically reweights them from how well each one has
/// performed over the last `reweight_segment` iterations.
///
/// Grounded on the teacher's weighted local-search move selection, but
/// the reweighting rule itself follows the standard ALNS segmented
/// update `w_i <- (1-r)*w_i + r*(s_i/max(n_i,1))`.
pub struct AdaptiveOperator {
    operators: Vec<WeightedOperator>,
    iterations_in_segment: u64,
}

impl AdaptiveOperator {
    pub fn new() -> Self {
        let mut operators = Vec::new();
        for &ruin in &[RuinKind::Random, RuinKind::Costly, RuinKind::Similar] {
            for &recreate in &[RecreateKind::Greedy, RecreateKind::Regret, RecreateKind::Random] {
                operators.push(WeightedOperator {
                    ruin,
                    recreate,
                    weight: 1.0,
                    segment_score: 0.0,
                    segment_uses: 0,
                });
            }
        }
        Self {
            operators,
            iterations_in_segment: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn select(&self, random: &Random) -> usize {
        let weights: Vec<f64> = self.operators.iter().map(|op| op.weight).collect();
        random.weighted_index(&weights)
    }

    fn ruin_count(problem: &Problem, solution: &Solution, config: &Config, random: &Random) -> usize {
        let placed = problem.num_calls() - solution.unassigned_calls().len();
        let min_count = (config.ruin_fraction_min * placed as f64).ceil() as usize;
        let max_count = (config.ruin_fraction_max * placed as f64).ceil() as usize;
        let min_count = min_count.max(1).min(placed);
        let max_count = max_count.max(min_count).min(placed);
        min_count + random.range_usize(0, max_count - min_count + 1)
    }

    /// Runs operator `index`'s ruin heuristic followed by its recreate
    /// heuristic on `solution` in place.
    pub fn apply(
        &self,
        index: usize,
        problem: &Problem,
        solution: &mut Solution,
        random: &Random,
        config: &Config,
    ) {
        let op = &self.operators[index];
        let count = Self::ruin_count(problem, solution, config, random);

        match op.ruin {
            RuinKind::Random => {
                random_removal(problem, solution, random, count);
            }
            RuinKind::Costly => {
                costly_removal(problem, solution, count);
            }
            RuinKind::Similar => {
                similar_removal(problem, solution, random, count);
            }
        }

        match op.recreate {
            RecreateKind::Greedy => greedy_recreate(problem, solution),
            RecreateKind::Regret => regret_recreate(problem, solution, config.regret_k),
            RecreateKind::Random => random_recreate(problem, solution, random, config),
        }
    }

    pub fn reward(&mut self, index: usize, reward: f64) {
        let op = &mut self.operators[index];
        op.segment_score += reward;
        op.segment_uses += 1;
    }

    /// Call once per iteration; reweights every `segment_length`
    /// iterations using the decay rate `r`.
    pub fn end_iteration(&mut self, segment_length: u64, decay: f64) {
        self.iterations_in_segment += 1;
        if self.iterations_in_segment < segment_length {
            return;
        }
        for op in self.operators.iter_mut() {
            let average = op.segment_score / op.segment_uses.max(1) as f64;
            op.weight = (1.0 - decay) * op.weight + decay * average;
            op.segment_score = 0.0;
            op.segment_uses = 0;
        }
        self.iterations_in_segment = 0;
    }
}

impl Default for AdaptiveOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reweight_favors_the_operator_with_higher_reward() {
        let mut operator = AdaptiveOperator::new();
        for _ in 0..99 {
            operator.reward(0, 4.0);
            operator.reward(1, 0.0);
            operator.end_iteration(100, 0.8);
        }
        operator.reward(0, 4.0);
        operator.reward(1, 0.0);
        operator.end_iteration(100, 0.8);

        assert!(operator.operators[0].weight > 1.0);
        assert!(operator.operators[1].weight < 1.0);
    }
}
