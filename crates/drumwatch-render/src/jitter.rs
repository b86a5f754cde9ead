//! Decorative randomness for the drilling debris.
//!
//! The falling-coke marks under a drum being drilled move with the wall
//! clock and scatter randomly. That motion is cosmetic: it is fed by a
//! [`Jitter`] source that is entirely separate from the instants passed to
//! the phase clock, so nothing here can change a drum's phase or progress.
//! Tests use [`SeededJitter`] to make the debris reproducible.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Source of the debris animation clock and scatter.
pub trait Jitter {
    /// Milliseconds on the clock that drives the fall animation.
    fn millis(&mut self) -> u64;

    /// A value in `lo..=hi`. Returns `lo` when the range is empty.
    fn spread(&mut self, lo: i32, hi: i32) -> i32;
}

/// Production jitter: real wall-clock milliseconds and an OS-seeded RNG.
#[derive(Debug)]
pub struct WallClockJitter {
    rng: SmallRng,
}

impl WallClockJitter {
    /// Create a jitter source seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }
}

impl Default for WallClockJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Jitter for WallClockJitter {
    fn millis(&mut self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }

    fn spread(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }
}

/// Deterministic jitter: a frozen animation clock and a seeded RNG.
#[derive(Debug, Clone)]
pub struct SeededJitter {
    millis: u64,
    rng: SmallRng,
}

impl SeededJitter {
    /// Create a jitter source with a fixed clock reading and seed.
    pub fn new(seed: u64, millis: u64) -> Self {
        Self {
            millis,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Jitter for SeededJitter {
    fn millis(&mut self) -> u64 {
        self.millis
    }

    fn spread(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_jitter_repeats() {
        let mut a = SeededJitter::new(7, 1_000);
        let mut b = SeededJitter::new(7, 1_000);
        let xs: Vec<i32> = (0..16).map(|_| a.spread(-16, 16)).collect();
        let ys: Vec<i32> = (0..16).map(|_| b.spread(-16, 16)).collect();
        assert_eq!(xs, ys);
        assert_eq!(a.millis(), 1_000);
    }

    #[test]
    fn spread_stays_in_range() {
        let mut jitter = SeededJitter::new(42, 0);
        for _ in 0..500 {
            let v = jitter.spread(-16, 16);
            assert!((-16..=16).contains(&v));
        }
    }

    #[test]
    fn empty_range_returns_low_bound() {
        let mut jitter = WallClockJitter::new();
        assert_eq!(jitter.spread(5, 5), 5);
        assert_eq!(jitter.spread(5, -5), 5);
        assert!(jitter.millis() > 0);
    }
}
