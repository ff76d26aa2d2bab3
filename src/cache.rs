//! Time-bounded memoization of the generation step.
//!
//! [`GenerationCache`] remembers the last successful result and when it
//! finished. Within the freshness window the cached value is returned and
//! the generator is not called. Failures are never cached. The cache is
//! keyed by recency alone, not by content, and lives only as long as the
//! process.

use chrono::{DateTime, TimeDelta, Utc};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
pub struct GenerationCache<T, C = SystemClock> {
    window: TimeDelta,
    clock: C,
    last: Option<(DateTime<Utc>, T)>,
}

impl<T> GenerationCache<T, SystemClock> {
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, SystemClock)
    }
}

impl<T, C> GenerationCache<T, C> {
    pub fn with_clock(window: Duration, clock: C) -> Self {
        Self {
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            clock,
            last: None,
        }
    }
}

impl<T, C> GenerationCache<T, C>
where
    T: Clone,
    C: Clock,
{
    /// The cached value, if the last success is still inside the window.
    pub fn fresh(&self) -> Option<&T> {
        let (at, value) = self.last.as_ref()?;
        (self.clock.now() - *at < self.window).then_some(value)
    }

    /// Return the cached value while fresh, otherwise run `generate` and cache its success.
    pub async fn get_or_refresh<F, Fut, E>(&mut self, generate: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh() {
            debug!("Reusing generation from memoization window");
            return Ok(value.clone());
        }

        let value = generate().await?;
        let finished = self.clock.now();
        info!(%finished, "Cached fresh generation");
        self.last = Some((finished, value.clone()));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct ManualClock(Rc<Cell<DateTime<Utc>>>);

    impl ManualClock {
        fn start() -> Self {
            Self(Rc::new(Cell::new(
                Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap(),
            )))
        }

        fn advance(&self, secs: i64) {
            self.0.set(self.0.get() + TimeDelta::seconds(secs));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    #[tokio::test]
    async fn test_reuses_within_window() {
        let clock = ManualClock::start();
        let mut cache = GenerationCache::with_clock(Duration::from_secs(3600), clock.clone());
        let calls = Cell::new(0);
        let counter = &calls;
        let run = || async move {
            counter.set(counter.get() + 1);
            Ok::<_, String>(counter.get())
        };

        assert_eq!(cache.get_or_refresh(run).await, Ok(1));
        clock.advance(3599);
        assert_eq!(cache.get_or_refresh(run).await, Ok(1));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_regenerates_after_window() {
        let clock = ManualClock::start();
        let mut cache = GenerationCache::with_clock(Duration::from_secs(3600), clock.clone());
        let calls = Cell::new(0);
        let counter = &calls;
        let run = || async move {
            counter.set(counter.get() + 1);
            Ok::<_, String>(counter.get())
        };

        cache.get_or_refresh(run).await.unwrap();
        clock.advance(3600);
        assert_eq!(cache.get_or_refresh(run).await, Ok(2));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let clock = ManualClock::start();
        let mut cache: GenerationCache<u32, _> =
            GenerationCache::with_clock(Duration::from_secs(3600), clock.clone());

        let failed = cache
            .get_or_refresh(|| async { Err::<u32, _>("offline".to_string()) })
            .await;
        assert!(failed.is_err());
        assert!(cache.fresh().is_none());

        let ok = cache.get_or_refresh(|| async { Ok::<u32, String>(7) }).await;
        assert_eq!(ok, Ok(7));
        assert_eq!(cache.fresh(), Some(&7));
    }

    #[tokio::test]
    async fn test_zero_window_always_regenerates() {
        let mut cache = GenerationCache::new(Duration::ZERO);
        let calls = Cell::new(0);
        let counter = &calls;
        let run = || async move {
            counter.set(counter.get() + 1);
            Ok::<_, String>(())
        };
        cache.get_or_refresh(run).await.unwrap();
        cache.get_or_refresh(run).await.unwrap();
        assert_eq!(calls.get(), 2);
    }
}
