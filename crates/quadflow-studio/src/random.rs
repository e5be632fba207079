use std::f32::consts::TAU;

use rand::Rng;

/// Uniform in `[0, 1)`.
#[inline]
pub fn random_factor<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(0.0..1.0)
}

/// Uniform in `[0, 2π)`.
#[inline]
pub fn random_angle<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(0.0..TAU)
}

/// `true` with the given probability; values outside `[0, 1]` saturate.
#[inline]
pub fn check_chance<R: Rng + ?Sized>(rng: &mut R, probability: f32) -> bool {
    rng.gen_bool(f64::from(probability.clamp(0.0, 1.0)))
}

/// Picks values with probability proportional to their weight.
#[derive(Debug, Clone)]
pub struct WeightedRandomizer<T> {
    values: Vec<T>,
    weights: Vec<f32>,
    total_weight: f32,
}

impl<T> WeightedRandomizer<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            weights: Vec::new(),
            total_weight: 0.0,
        }
    }

    /// Adds `value`; non-positive or non-finite weights are rejected.
    pub fn add(&mut self, value: T, weight: f32) -> &mut Self {
        if !(weight.is_finite() && weight > 0.0) {
            log::error!("can't add value to randomizer: invalid weight {weight}");
            return self;
        }
        self.values.push(value);
        self.weights.push(weight);
        self.total_weight += weight;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn weight(&self, index: usize) -> Option<f32> {
        self.weights.get(index).copied()
    }

    /// `None` only when the randomizer is empty.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        match self.values.len() {
            0 => {
                log::error!("weighted randomizer is empty");
                None
            }
            1 => self.values.first(),
            _ => {
                let target = random_factor(rng) * self.total_weight;
                let mut accumulated = 0.0;
                for (value, weight) in self.values.iter().zip(&self.weights) {
                    accumulated += weight;
                    if accumulated > target {
                        return Some(value);
                    }
                }
                self.values.last()
            }
        }
    }
}

impl<T> Default for WeightedRandomizer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn weights_drive_distribution() {
        let mut randomizer = WeightedRandomizer::new();
        randomizer.add('a', 1.0).add('b', 9.0);

        let mut rng = StdRng::seed_from_u64(42);
        let picks = 10_000;
        let b = (0..picks)
            .filter(|_| randomizer.pick(&mut rng) == Some(&'b'))
            .count();

        let ratio = b as f32 / picks as f32;
        assert!((0.85..0.95).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let mut randomizer = WeightedRandomizer::new();
        randomizer.add(1, 0.0).add(2, -1.0).add(3, f32::NAN).add(4, 2.0);
        assert_eq!(randomizer.len(), 1);
        assert_eq!(randomizer.weight(0), Some(2.0));

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(randomizer.pick(&mut rng), Some(&4));
    }

    #[test]
    fn empty_randomizer_picks_nothing() {
        let randomizer: WeightedRandomizer<u8> = WeightedRandomizer::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(randomizer.is_empty());
        assert_eq!(randomizer.pick(&mut rng), None);
    }

    #[test]
    fn helpers_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            assert!((0.0..1.0).contains(&random_factor(&mut rng)));
            assert!((0.0..TAU).contains(&random_angle(&mut rng)));
        }
        assert!(check_chance(&mut rng, 1.5));
        assert!(!check_chance(&mut rng, -0.5));
    }
}
