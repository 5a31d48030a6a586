//! Randomised pauses: throttling before each URL and backoff between attempts.
//!
//! The delay policy is split in two so tests never wait on the wall clock:
//! a [`Sleeper`] performs the pause, and a [`Pacer`] owns the random source
//! that decides how long each pause is.

use crate::config::DelayRange;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Performs a pause of the requested length.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Real wall-clock pauses via `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Draws delays from a seedable random source and hands them to a [`Sleeper`].
#[derive(Debug)]
pub struct Pacer<S = TokioSleeper> {
    rng: fastrand::Rng,
    sleeper: S,
}

impl Pacer<TokioSleeper> {
    /// Wall-clock pacer, optionally seeded for reproducible delay sequences.
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_sleeper(seed, TokioSleeper)
    }
}

impl<S: Sleeper> Pacer<S> {
    pub fn with_sleeper(seed: Option<u64>, sleeper: S) -> Self {
        let rng = match seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };
        Self { rng, sleeper }
    }

    /// Sample a delay from `range`, sleep for it, and return what was slept.
    pub async fn pause(&mut self, range: DelayRange, reason: &str) -> Duration {
        let delay = range.sample(&mut self.rng);
        debug!("Pausing {}ms ({})", delay.as_millis(), reason);
        self.sleeper.sleep(delay).await;
        delay
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSleeper;
    use super::*;

    #[tokio::test]
    async fn pause_records_sampled_delay() {
        let sleeper = RecordingSleeper::default();
        let mut pacer = Pacer::with_sleeper(Some(9), sleeper.clone());

        let d = pacer.pause(DelayRange::from_secs(5, 10), "throttle").await;

        assert!(d >= Duration::from_secs(5) && d <= Duration::from_secs(10));
        assert_eq!(sleeper.recorded(), vec![d]);
    }

    #[tokio::test]
    async fn same_seed_same_sequence() {
        let range = DelayRange::from_secs(2, 5);
        let mut a = Pacer::with_sleeper(Some(1234), RecordingSleeper::default());
        let mut b = Pacer::with_sleeper(Some(1234), RecordingSleeper::default());
        for _ in 0..10 {
            assert_eq!(a.pause(range, "a").await, b.pause(range, "b").await);
        }
    }

    #[tokio::test]
    async fn zero_range_does_not_sleep() {
        let mut pacer = Pacer::new(Some(0));
        let d = pacer.pause(DelayRange::none(), "disabled").await;
        assert_eq!(d, Duration::ZERO);
    }
}
