use serde::{Deserialize, Serialize};

/// Tunable constants for the ALNS search. Defaults follow the values
/// suggested in the design notes; nothing here is load-bearing for
/// correctness, only for search quality.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    // Randomization
    pub deterministic: bool,
    pub seed: u64,

    // Adaptive operator
    pub reward_best: f64,
    pub reward_better: f64,
    pub reward_diverse: f64,
    pub reward_reject: f64,
    pub reweight_decay: f64,
    pub reweight_segment: u64,
    pub ruin_fraction_min: f64,
    pub ruin_fraction_max: f64,
    pub regret_k: usize,

    // Acceptance controller
    pub warmup_fraction: f64,
    pub exploration_probability: f64,
    pub final_temperature: f64,
    pub escape_after_iterations: u64,

    // Ambient
    pub log_interval: u64,
}

impl Config {
    pub fn default() -> Self {
        Self {
            deterministic: true,
            seed: 1,

            reward_best: 4.0,
            reward_better: 2.0,
            reward_diverse: 1.0,
            reward_reject: 0.0,
            reweight_decay: 0.8,
            reweight_segment: 100,
            ruin_fraction_min: 0.05,
            ruin_fraction_max: 0.30,
            regret_k: 3,

            warmup_fraction: 0.01,
            exploration_probability: 0.8,
            final_temperature: 0.1,
            escape_after_iterations: 500,

            log_interval: 1000,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn patch(&mut self, values: &serde_json::Value) {
        let mut config: serde_json::Value =
            serde_json::to_value(&self).expect("Failed to serialize config");
        match values {
            serde_json::Value::Object(values_map) => {
                for (key, value) in values_map.iter() {
                    let root_key = format!("/{}", key);
                    if let Some(config_value) = config.pointer_mut(&root_key) {
                        *config_value = value.clone();
                    }
                }
            }
            _ => panic!("Cannot patch Config as JSON is not an Object"),
        }
        *self = serde_json::from_value(config).expect("Failed to deserialize patched config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_overrides_named_fields_only() {
        let mut config = Config::default();
        config.patch(&serde_json::json!({"seed": 7, "regret_k": 5}));
        assert_eq!(config.seed, 7);
        assert_eq!(config.regret_k, 5);
        assert_eq!(config.reward_best, 4.0);
    }
}
