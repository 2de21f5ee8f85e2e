use crate::cache::ExpiringCache;
use crate::feed::{DataPoint, FeedSnapshot};
use crate::forecast::{FORECAST_SENSOR, ScheduleCacheKey, ScheduleForecast};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::watch;

pub const DEFAULT_LAST_CLEANED_DAYS_AGO: u32 = 4;
pub const DEFAULT_SCHEDULE_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct AppState {
    snapshot: Option<FeedSnapshot>,
    snapshot_tx: watch::Sender<Option<FeedSnapshot>>,
    /// Bumped when the forecast sensor's history changes; part of every
    /// forecast cache key.
    revision: u64,
    last_cleaned_days_ago: u32,
    last_cleaned_tx: watch::Sender<u32>,
    schedule_cache: ExpiringCache<ScheduleCacheKey, ScheduleForecast>,
}

impl AppState {
    pub fn new(last_cleaned_days_ago: u32, schedule_cache_ttl: Duration) -> Self {
        let (snapshot_tx, _snapshot_rx) = watch::channel(None);
        let (last_cleaned_tx, _last_cleaned_rx) = watch::channel(last_cleaned_days_ago);
        Self {
            snapshot: None,
            snapshot_tx,
            revision: 0,
            last_cleaned_days_ago,
            last_cleaned_tx,
            schedule_cache: ExpiringCache::new(schedule_cache_ttl),
        }
    }

    pub fn snapshot(&self) -> Option<&FeedSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<FeedSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Store a new snapshot. Cached forecasts are dropped only when the
    /// forecast sensor's history differs from the previous snapshot.
    pub fn set_snapshot(&mut self, snapshot: FeedSnapshot) {
        let previous = self.snapshot.as_ref().map(forecast_history);
        if previous != Some(forecast_history(&snapshot)) {
            self.revision += 1;
            self.schedule_cache.clear();
        }
        self.snapshot = Some(snapshot.clone());
        self.snapshot_tx.send_replace(Some(snapshot));
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_cleaned_days_ago(&self) -> u32 {
        self.last_cleaned_days_ago
    }

    pub fn subscribe_last_cleaned(&self) -> watch::Receiver<u32> {
        self.last_cleaned_tx.subscribe()
    }

    pub fn set_last_cleaned_days_ago(&mut self, days: u32) {
        self.last_cleaned_days_ago = days;
        self.last_cleaned_tx.send_replace(days);
    }

    pub fn cached_schedule(
        &self,
        key: &ScheduleCacheKey,
        now: OffsetDateTime,
    ) -> Option<&ScheduleForecast> {
        self.schedule_cache.get(key, now)
    }

    pub fn cache_schedule(
        &mut self,
        key: ScheduleCacheKey,
        forecast: ScheduleForecast,
        now: OffsetDateTime,
    ) {
        self.schedule_cache.purge_expired(now);
        self.schedule_cache.insert(key, forecast, now);
    }

    pub fn cached_schedule_count(&self) -> usize {
        self.schedule_cache.len()
    }
}

fn forecast_history(snapshot: &FeedSnapshot) -> Option<&[DataPoint]> {
    snapshot
        .sensor(FORECAST_SENSOR)
        .map(|sensor| sensor.history.as_slice())
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_LAST_CLEANED_DAYS_AGO, DEFAULT_SCHEDULE_CACHE_TTL)
    }
}
