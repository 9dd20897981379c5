//! Pseudo-random sources for the angle-search jiggle.
//!
//! The solver takes its randomness as an injected capability so runs can
//! be either fast (a platform PRNG) or byte-for-byte reproducible across
//! implementations (a fixed linear congruential generator, reseeded per
//! tracklet).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed applied before every tracklet in repeatable mode.
pub const REPEATABLE_SEED: u64 = 3;

/// Random source consumed by the solver.
pub trait SolverRng {
    /// Uniform draw in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Restart the stream from `seed`.
    fn reseed(&mut self, seed: u64);
}

const LCG_MULTIPLIER: u64 = 302_875_106_592_253; // 13^13
const LCG_MASK: u64 = (1 << 59) - 1;
const LCG_SCALE: f64 = 1. / (1u64 << 59) as f64;

/// Linear congruential generator `x <- x·13¹³ mod 2⁵⁹`.
///
/// Deliberately primitive: any implementation of the scoring algorithm,
/// in any language, can reproduce this stream exactly, which makes
/// cross-implementation score comparison bit-exact.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Lcg::new(REPEATABLE_SEED)
    }
}

impl SolverRng for Lcg {
    fn next_f64(&mut self) -> f64 {
        // the multiply wraps mod 2⁶⁴; masking to 59 bits is then exact
        self.state = self.state.wrapping_mul(LCG_MULTIPLIER) & LCG_MASK;
        self.state as f64 * LCG_SCALE
    }

    fn reseed(&mut self, seed: u64) {
        self.state = seed;
    }
}

/// Production source backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct PlatformRng {
    rng: StdRng,
}

impl PlatformRng {
    pub fn seeded(seed: u64) -> Self {
        PlatformRng {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed from the wall clock, for runs that do not need repeatability.
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
            .unwrap_or(REPEATABLE_SEED);
        Self::seeded(nanos)
    }
}

impl SolverRng for PlatformRng {
    fn next_f64(&mut self) -> f64 {
        self.rng.random()
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}
