//! Fixed-capacity rolling buffer of clock-drift samples.
//!
//! Deliberately exposes only "append" and "mean", no indexing and no
//! iteration, so callers can't reach in and slice the backing storage the
//! way a bare `Vec` would tempt them to.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct DriftRing {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl DriftRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a drift sample (seconds, wall-clock minus parsed
    /// program-date-time), evicting the oldest sample once at capacity.
    pub fn push(&mut self, drift_secs: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(drift_secs);
    }

    /// Mean of the retained samples, or `0.0` if none have been observed
    /// yet (no drift correction to apply).
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bounds_to_capacity() {
        let mut ring = DriftRing::new(4);
        for sample in [1.0, 2.0, 3.0, 4.0, 5.0] {
            ring.push(sample);
        }
        assert_eq!(ring.len(), 4);
        // oldest (1.0) evicted; mean of 2,3,4,5
        assert_eq!(ring.mean(), 3.5);
    }

    #[test]
    fn empty_mean_is_zero() {
        let ring = DriftRing::new(4);
        assert_eq!(ring.mean(), 0.0);
    }

    #[test]
    fn constant_drift_averages_to_itself() {
        let mut ring = DriftRing::new(4);
        for _ in 0..4 {
            ring.push(2.0);
        }
        assert_eq!(ring.mean(), 2.0);
    }

    proptest! {
        #[test]
        fn never_holds_more_than_capacity(capacity in 1usize..32, samples in proptest::collection::vec(-1000.0f64..1000.0, 0..64)) {
            let mut ring = DriftRing::new(capacity);
            for s in &samples {
                ring.push(*s);
            }
            prop_assert!(ring.len() <= capacity);
            prop_assert_eq!(ring.is_empty(), ring.len() == 0);
        }

        #[test]
        fn mean_is_bounded_by_retained_samples(samples in proptest::collection::vec(-50.0f64..50.0, 1..16)) {
            let mut ring = DriftRing::new(samples.len());
            for s in &samples {
                ring.push(*s);
            }
            let lo = samples.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(ring.mean() >= lo - 1e-9 && ring.mean() <= hi + 1e-9);
        }
    }
}
