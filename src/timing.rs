//! Service-time sources.
//!
//! A service time is a whole number of time units: `max(1, base + jitter)`
//! with jitter drawn uniformly from {-1, 0, +1}. The wall-clock length of one
//! unit is configurable so the same model runs in seconds from the CLI and in
//! milliseconds under test.

use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shortest service time, in units.
pub const MIN_SERVICE_UNITS: u32 = 1;

/// Source of service durations, injected into both schedulers.
pub trait ServiceClock: Send + Sync {
    /// Service time in units for a vehicle whose base time is `base_units`.
    fn service_units(&self, base_units: u32) -> u32;

    /// Wall-clock length of one unit.
    fn unit(&self) -> Duration;

    fn service_time(&self, base_units: u32) -> Duration {
        self.unit() * self.service_units(base_units)
    }
}

/// Apply +/-1 jitter to `base_units`, floored at [`MIN_SERVICE_UNITS`].
pub fn jittered_units<R: Rng + ?Sized>(base_units: u32, rng: &mut R) -> u32 {
    let delta: i64 = rng.gen_range(-1..=1);
    let units = (i64::from(base_units) + delta).max(i64::from(MIN_SERVICE_UNITS));
    u32::try_from(units).unwrap_or(u32::MAX)
}

/// Jittered clock backed by an owned, optionally seeded generator.
#[derive(Debug)]
pub struct JitterClock {
    rng: Mutex<StdRng>,
    unit: Duration,
}

impl JitterClock {
    /// Clock seeded from OS entropy.
    pub fn new(unit: Duration) -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()), unit }
    }

    /// Reproducible clock: the same seed yields the same jitter sequence.
    pub fn seeded(unit: Duration, seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)), unit }
    }
}

impl ServiceClock for JitterClock {
    fn service_units(&self, base_units: u32) -> u32 {
        jittered_units(base_units, &mut *self.rng.lock())
    }

    fn unit(&self) -> Duration {
        self.unit
    }
}

/// Jitter-free clock: every service takes exactly its base time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    unit: Duration,
}

impl FixedClock {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }
}

impl ServiceClock for FixedClock {
    fn service_units(&self, base_units: u32) -> u32 {
        base_units.max(MIN_SERVICE_UNITS)
    }

    fn unit(&self) -> Duration {
        self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_within_one_unit() {
        let clock = JitterClock::seeded(Duration::from_millis(1), 7);
        for base in [1u32, 3, 5] {
            for _ in 0..500 {
                let units = clock.service_units(base);
                let lo = base.saturating_sub(1).max(MIN_SERVICE_UNITS);
                assert!((lo..=base + 1).contains(&units), "base {base} gave {units}");
            }
        }
    }

    #[test]
    fn jitter_reaches_every_value() {
        let clock = JitterClock::seeded(Duration::from_millis(1), 11);
        let seen: std::collections::HashSet<u32> =
            (0..500).map(|_| clock.service_units(5)).collect();
        assert_eq!(seen, [4, 5, 6].into_iter().collect());
    }

    #[test]
    fn base_one_never_drops_below_minimum() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!((0..500).all(|_| jittered_units(1, &mut rng) >= 1));
        assert!((0..500).all(|_| jittered_units(0, &mut rng) >= 1));
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = JitterClock::seeded(Duration::from_millis(1), 42);
        let b = JitterClock::seeded(Duration::from_millis(1), 42);
        let sa: Vec<u32> = (0..50).map(|_| a.service_units(3)).collect();
        let sb: Vec<u32> = (0..50).map(|_| b.service_units(3)).collect();
        assert_eq!(sa, sb);
    }

    #[test]
    fn service_time_scales_by_unit() {
        let clock = FixedClock::new(Duration::from_millis(10));
        assert_eq!(clock.service_time(5), Duration::from_millis(50));
        assert_eq!(clock.service_time(0), Duration::from_millis(10));
    }
}
