//! Random number helpers shared by all strategies.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Creates the seeded RNG that drives a whole run.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Noise distribution used when perturbing a position.
///
/// All variants are zero-centred with unit scale; callers multiply by the
/// per-dimension step width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Perturbation {
    #[default]
    Normal,
    Laplace,
    Logistic,
}

impl Perturbation {
    /// Draws one unit-scale sample.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Perturbation::Normal => StandardNormal.sample(rng),
            Perturbation::Laplace => {
                let u: f64 = rng.random_range(-0.5..0.5);
                -u.signum() * (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE).ln()
            }
            Perturbation::Logistic => {
                let u: f64 = rng.random_range(f64::EPSILON..1.0);
                (u / (1.0 - u).max(f64::EPSILON)).ln()
            }
        }
    }
}

/// Draws a standard normal sample.
pub(crate) fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}
