//! Fixtures and predictable draws shared by the tests.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use rand::distributions::{Distribution, Standard};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

/// Topology description of the cheese shop, equivalent to the built-in one.
pub const CHEESE_SHOP: &str = include_str!("../../topologies/cheese_shop.json");

/// Topology description of the cheese shop with a tasting station, equivalent to the built-in
/// one up to rounding of the relative exit weights.
pub const CHEESE_SHOP_WITH_TASTING_STATION: &str =
    include_str!("../../topologies/cheese_shop_tasting.json");

/// This distribution produces values `k / steps` for `k` between 0 and `steps - 1` by requesting
/// the `next_u32` from the random number generator and applying `mod steps` operation on it.
///
/// This is meant for testing, e.g., together with `rand::rngs::mock::StepRng` it produces
/// evenly spaced draws in a predictable order.
pub struct GridDistribution {
    steps: u32,
}

impl GridDistribution {
    /// Constructs a new distribution with `steps` points in `[0, 1)`.
    ///
    /// # Panics
    ///
    /// Panics if `steps` is zero.
    #[must_use]
    pub fn new(steps: u32) -> Self {
        assert!(steps > 0, "grid must have at least one step");
        Self { steps }
    }
}

impl Distribution<f64> for GridDistribution {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        f64::from(rng.next_u32() % self.steps) / f64::from(self.steps)
    }
}

/// Returns `0, 1/steps, 2/steps, ...` wrapping around after `steps` values, `n` values in total.
#[must_use]
pub fn grid_draws(steps: u32, n: usize) -> Vec<f64> {
    let mut rng = rand::rngs::mock::StepRng::new(0, 1);
    GridDistribution::new(steps)
        .sample_iter(&mut rng)
        .take(n)
        .collect()
}

/// Returns `n` uniform draws from a ChaCha generator seeded with `seed`.
#[must_use]
pub fn uniform_draws(seed: u64, n: usize) -> Vec<f64> {
    Standard
        .sample_iter(ChaChaRng::seed_from_u64(seed))
        .take(n)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_grid_draws() {
        assert_eq!(grid_draws(4, 6), vec![0.0, 0.25, 0.5, 0.75, 0.0, 0.25]);
    }

    #[test]
    fn test_uniform_draws() {
        let draws = uniform_draws(3, 1000);
        assert_eq!(draws.len(), 1000);
        assert!(draws.iter().all(|d| (0.0..1.0).contains(d)));
        assert_eq!(draws, uniform_draws(3, 1000));
    }
}
