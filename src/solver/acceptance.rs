use crate::utils::{FloatCompare, Random};

/// Two-phase simulated annealing acceptance controller.
///
/// Grounded on the teacher's `IterationSchedule`/`TemperatureAcceptance`
/// pair (same `new_cost < old_cost - T * ln(U)` accept test, same
/// exponential-decay-by-elapsed-fraction shape), generalized to the
/// warm-up-then-anneal schedule: a warm-up phase always accepts a cheaper
/// candidate, accepts a worsening one with fixed probability
/// `exploration_probability`, and samples the worsening move size with a
/// running mean before any temperature exists; the annealing phase then
/// decays from the temperature that warm-up implies down to a floor
/// temperature.
pub struct Acceptance {
    warmup_fraction: f64,
    exploration_probability: f64,
    final_temperature: f64,
    escape_after_iterations: u64,

    warmup_samples: u64,
    warmup_mean_delta: f64,
    start_temperature: Option<f64>,
    temperature: f64,

    iterations_since_best: u64,
}

impl Acceptance {
    pub fn new(
        warmup_fraction: f64,
        exploration_probability: f64,
        final_temperature: f64,
        escape_after_iterations: u64,
    ) -> Self {
        Self {
            warmup_fraction,
            exploration_probability,
            final_temperature,
            escape_after_iterations,
            warmup_samples: 0,
            warmup_mean_delta: 0.0,
            start_temperature: None,
            temperature: final_temperature,
            iterations_since_best: 0,
        }
    }

    fn in_warmup(&self, elapsed_fraction: f64) -> bool {
        self.start_temperature.is_none() && elapsed_fraction < self.warmup_fraction
    }

    /// Welford's running mean of the worsening move sizes seen so far.
    fn record_warmup_delta(&mut self, delta: f64) {
        if delta <= 0.0 {
            return;
        }
        self.warmup_samples += 1;
        let step = (delta - self.warmup_mean_delta) / self.warmup_samples as f64;
        self.warmup_mean_delta += step;
    }

    fn end_warmup(&mut self) {
        let mean_delta = if self.warmup_samples == 0 {
            // No worsening move was ever proposed during warm-up; fall
            // back to the floor temperature rather than dividing by zero.
            self.final_temperature
        } else {
            -self.warmup_mean_delta / self.exploration_probability.ln()
        };
        self.start_temperature = Some(mean_delta.max(self.final_temperature));
        self.temperature = self.start_temperature.unwrap();
    }

    /// Updates the temperature for the given position in the budget (in
    /// `[0, 1]`) and returns whether `new_cost` should be accepted over
    /// `old_cost`.
    pub fn accept(
        &mut self,
        elapsed_fraction: f64,
        new_cost: i64,
        old_cost: i64,
        random: &Random,
    ) -> bool {
        if self.in_warmup(elapsed_fraction) {
            let delta = (new_cost - old_cost) as f64;
            self.record_warmup_delta(delta);
            return new_cost <= old_cost || random.real() < self.exploration_probability;
        }

        if self.start_temperature.is_none() {
            self.end_warmup();
        }

        let start_temp = self.start_temperature.unwrap();
        let span = (1.0 - self.warmup_fraction).max(f64::EPSILON);
        let progress = ((elapsed_fraction - self.warmup_fraction) / span).clamp(0.0, 1.0);
        self.temperature =
            start_temp * (self.final_temperature / start_temp).powf(progress);

        (new_cost as f64).approx_lt(old_cost as f64 - self.temperature * random.real().ln())
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Call once per iteration with whether this iteration found a new
    /// best solution, to drive the escape/restart signal.
    pub fn note_iteration(&mut self, found_new_best: bool) {
        if found_new_best {
            self.iterations_since_best = 0;
        } else {
            self.iterations_since_best += 1;
        }
    }

    pub fn should_escape(&self) -> bool {
        self.iterations_since_best >= self.escape_after_iterations
    }

    pub fn reset_escape_counter(&mut self) {
        self.iterations_since_best = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_always_accepts_a_cheaper_candidate() {
        let mut acceptance = Acceptance::new(0.5, 0.8, 0.1, 100);
        let random = Random::from_seed(1);
        assert!(acceptance.accept(0.1, 5, 10, &random));
    }

    #[test]
    fn warmup_accepts_worsening_moves_at_the_exploration_rate() {
        let mut acceptance = Acceptance::new(0.5, 0.8, 0.1, 100);
        let random = Random::from_seed(1);
        let trials = 20_000;
        let accepted = (0..trials)
            .filter(|_| acceptance.accept(0.1, 1000, 10, &random))
            .count();
        let rate = accepted as f64 / trials as f64;
        assert!((rate - 0.8).abs() < 0.02);
    }

    #[test]
    fn acceptance_probability_matches_sa_formula() {
        let mut acceptance = Acceptance::new(0.0, 0.8, 0.1, 100);
        // Force the post-warmup temperature to exactly 10.0 by seeding a
        // single warm-up sample whose mean makes start_temperature = 10.
        acceptance.warmup_samples = 1;
        acceptance.warmup_mean_delta = 10.0 * 0.8f64.ln().abs();
        acceptance.end_warmup();
        assert!((acceptance.temperature() - 10.0).abs() < 1e-9);

        let random = Random::from_seed(42);
        let mut accepted = 0;
        let trials = 20_000;
        for _ in 0..trials {
            acceptance.start_temperature = Some(10.0);
            if acceptance.accept(1.0, 15, 10, &random) {
                accepted += 1;
            }
        }
        let rate = accepted as f64 / trials as f64;
        // exp(-5/10) = 0.6065...
        assert!((rate - 0.6065).abs() < 0.02);
    }

    #[test]
    fn escape_triggers_after_configured_non_improving_iterations() {
        let mut acceptance = Acceptance::new(0.1, 0.8, 0.1, 3);
        for _ in 0..3 {
            acceptance.note_iteration(false);
        }
        assert!(acceptance.should_escape());
        acceptance.reset_escape_counter();
        assert!(!acceptance.should_escape());
    }
}
