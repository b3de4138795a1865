//! Seeded jitter source for humanization
//!
//! Wraps a `fastrand::Rng` owned by the engine. Draws never touch the
//! thread-local generator, allocate, or lock, so they are safe on the
//! real-time thread. Reseeding is explicit and belongs to the control side.

use std::time::{SystemTime, UNIX_EPOCH};

const FALLBACK_SEED: u64 = 12345;

#[derive(Debug)]
pub struct RandomSource {
    rng: fastrand::Rng,
    seed: u64,
}

impl RandomSource {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            seed,
        }
    }

    /// Seed from the wall clock. Call at engine start, not inside a block.
    pub fn from_clock() -> Self {
        Self::with_seed(clock_seed())
    }

    /// Restart the sequence. Not for the real-time thread's block path.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = fastrand::Rng::with_seed(seed);
        self.seed = seed;
    }

    /// Seed the current sequence started from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in [-1, 1]
    pub fn next_unit_interval(&mut self) -> f64 {
        self.rng.f64() * 2.0 - 1.0
    }

    /// Uniform integer in [-bound, bound]
    pub fn next_bounded_int(&mut self, bound: u16) -> i32 {
        let bound = i32::from(bound);
        self.rng.i32(-bound..=bound)
    }
}

/// Nanoseconds since the epoch, for seeding at startup
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(FALLBACK_SEED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = RandomSource::with_seed(42);
        let mut b = RandomSource::with_seed(42);
        for _ in 0..100 {
            assert_eq!(a.next_unit_interval(), b.next_unit_interval());
            assert_eq!(a.next_bounded_int(10), b.next_bounded_int(10));
        }
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let mut rng = RandomSource::with_seed(7);
        let first: Vec<i32> = (0..16).map(|_| rng.next_bounded_int(10)).collect();
        rng.reseed(7);
        let again: Vec<i32> = (0..16).map(|_| rng.next_bounded_int(10)).collect();
        assert_eq!(first, again);
        assert_eq!(rng.seed(), 7);
    }

    #[test]
    fn test_draws_stay_in_bounds() {
        let mut rng = RandomSource::with_seed(0xDEAD_BEEF);
        for _ in 0..10_000 {
            let u = rng.next_unit_interval();
            assert!((-1.0..=1.0).contains(&u));
            let n = rng.next_bounded_int(10);
            assert!((-10..=10).contains(&n));
        }
    }

    #[test]
    fn test_zero_bound_is_zero() {
        let mut rng = RandomSource::with_seed(1);
        for _ in 0..32 {
            assert_eq!(rng.next_bounded_int(0), 0);
        }
    }

    #[test]
    fn test_bounded_int_reaches_both_ends() {
        let mut rng = RandomSource::with_seed(99);
        let draws: Vec<i32> = (0..5_000).map(|_| rng.next_bounded_int(3)).collect();
        assert!(draws.contains(&-3));
        assert!(draws.contains(&3));
    }
}
