//! Sources of uniform draws and the exponential variate derived from them.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaChaRng;

/// Inverse-transform sample of the exponential distribution with the given `rate`,
/// computed from a `draw` uniform in `[0, 1)`.
///
/// ```
/// # use qnsim::exponential;
/// assert_eq!(exponential(2.0, 0.0), 0.0);
/// assert!((exponential(1.0, 0.5) - std::f64::consts::LN_2).abs() < 1e-12);
/// ```
#[must_use]
pub fn exponential(rate: f64, draw: f64) -> f64 {
    -(1.0 - draw).ln() / rate
}

/// Produces a sequence of values uniformly distributed in `[0, 1)`.
///
/// The simulation draws from a single source, so two runs are the same only if the source
/// produces the same sequence and it is consumed in the same order.
pub trait UniformSource {
    /// Returns the next draw.
    fn next_uniform(&mut self) -> f64;

    /// Returns an exponential variate with the given `rate`, consuming exactly one draw.
    fn exponential(&mut self, rate: f64) -> f64 {
        exponential(rate, self.next_uniform())
    }
}

/// Adapts any [`RngCore`] to a [`UniformSource`].
pub struct RngSource<R = ChaChaRng>(R);

impl<R: RngCore> RngSource<R> {
    /// Wraps `rng`.
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngSource<ChaChaRng> {
    /// ChaCha generator seeded from the system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self(ChaChaRng::from_entropy())
    }

    /// ChaCha generator seeded with `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self(ChaChaRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> UniformSource for RngSource<R> {
    fn next_uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed list of draws, starting over once it runs out.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySource {
    draws: Vec<f64>,
    position: usize,
}

impl ReplaySource {
    /// Creates a source replaying `draws` in order.
    ///
    /// # Panics
    ///
    /// Panics if `draws` is empty or any of them is outside of `[0, 1)`.
    pub fn new<I: IntoIterator<Item = f64>>(draws: I) -> Self {
        let draws: Vec<f64> = draws.into_iter().collect();
        assert!(!draws.is_empty(), "no draws to replay");
        assert!(
            draws.iter().all(|d| (0.0..1.0).contains(d)),
            "draws must be in [0, 1)"
        );
        Self { draws, position: 0 }
    }

    /// Number of draws taken so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.position
    }
}

impl UniformSource for ReplaySource {
    fn next_uniform(&mut self) -> f64 {
        let draw = self.draws[self.position % self.draws.len()];
        self.position += 1;
        draw
    }
}
