use fastrand::Rng;
use std::cell::RefCell;

use ahash::RandomState;

#[derive(Debug)]
pub struct Random {
    pub rng: RefCell<Rng>,
    pub seed: Option<u64>,
}

impl Random {
    pub fn new() -> Self {
        Self {
            rng: RefCell::new(Rng::new()),
            seed: None,
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: RefCell::new(Rng::with_seed(seed)),
            seed: Some(seed),
        }
    }

    pub fn shuffle<T>(&self, container: &mut [T]) {
        self.rng.borrow_mut().shuffle(container);
    }

    pub fn real(&self) -> f64 {
        self.rng.borrow_mut().f64() as f64
    }

    // Get random number in range [lower, upper). Upper is not inclusive
    pub fn range_usize(&self, lower: usize, upper: usize) -> usize {
        self.rng.borrow_mut().usize(lower..upper)
    }

    // Sample `number` elements from the vec
    pub fn sample_from_vec<T>(&self, mut vec: Vec<T>, number: usize) -> Vec<T> {
        // The vec must have more elements than are beign sampled
        assert_eq!(true, vec.len() >= number);
        let mut new_vec = Vec::with_capacity(number);

        // Take an element from the vec until `number` elements have been sampled
        while new_vec.len() < number {
            new_vec.push(vec.remove(self.rng.borrow_mut().usize(0..vec.len())));
        }
        new_vec
    }

    // Sample `k` distinct values from `0..n` using Floyd's algorithm.
    pub fn floyd_sample(&self, n: usize, k: usize) -> Vec<usize> {
        use std::collections::HashSet;
        assert!(k <= n, "cannot sample {} distinct values out of {}", k, n);
        let mut sampled: HashSet<usize, RandomState> = HashSet::with_hasher(self.random_state());
        let mut result = Vec::with_capacity(k);
        for i in n - k..n {
            let mut value = self.range_usize(0, i + 1);
            if sampled.contains(&value) {
                value = i;
            }
            sampled.insert(value);
            result.push(value);
        }
        result
    }

    // Pick an index with probability proportional to `weights`.
    // Falls back to a uniform pick over the whole slice if all weights are zero.
    pub fn weighted_index(&self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return self.range_usize(0, weights.len());
        }
        let mut target = self.real() * total;
        for (index, &weight) in weights.iter().enumerate() {
            if target < weight {
                return index;
            }
            target -= weight;
        }
        weights.len() - 1
    }

    pub fn reset(&self) {
        if let Some(seed) = self.seed {
            self.rng.replace(Rng::with_seed(seed));
        } else {
            self.rng.replace(Rng::new());
        }
    }

    pub fn random_state(&self) -> RandomState {
        if let Some(seed) = self.seed {
            RandomState::with_seeds(seed, seed + 123, seed + 321, seed + 1337)
        } else {
            RandomState::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floyd_sample_is_distinct_and_in_range() {
        let random = Random::from_seed(42);
        for _ in 0..50 {
            let sample = random.floyd_sample(20, 7);
            assert_eq!(sample.len(), 7);
            let unique: std::collections::HashSet<_> = sample.iter().collect();
            assert_eq!(unique.len(), 7);
            assert!(sample.iter().all(|&v| v < 20));
        }
    }

    #[test]
    fn floyd_sample_full_range() {
        let random = Random::from_seed(1);
        let mut sample = random.floyd_sample(5, 5);
        sample.sort();
        assert_eq!(sample, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn weighted_index_prefers_larger_weight() {
        let random = Random::from_seed(7);
        let mut counts = [0usize; 2];
        for _ in 0..1000 {
            counts[random.weighted_index(&[9.0, 1.0])] += 1;
        }
        assert!(counts[0] > counts[1]);
    }

    #[test]
    fn weighted_index_falls_back_to_uniform_on_zero_weights() {
        let random = Random::from_seed(3);
        let index = random.weighted_index(&[0.0, 0.0, 0.0]);
        assert!(index < 3);
    }

    #[test]
    fn same_seed_reproduces_sequence() {
        let a = Random::from_seed(99);
        let b = Random::from_seed(99);
        for _ in 0..10 {
            assert_eq!(a.range_usize(0, 1000), b.range_usize(0, 1000));
        }
    }
}
