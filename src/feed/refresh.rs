use crate::error::AppError;
use crate::feed::{FeedMapping, FeedSnapshot, FeedSource, SensorLevel};
use crate::forecast::clock::{Clock, SystemClock};
use crate::state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// Fetch one document, map it and store the snapshot.
///
/// On a failed fetch the previous snapshot stays in place.
pub fn run_refresh_cycle<S>(
    source: &mut S,
    mapping: &FeedMapping,
    state: &Arc<RwLock<AppState>>,
    clock: &dyn Clock,
) -> Result<FeedSnapshot, AppError>
where
    S: FeedSource + ?Sized,
{
    let document = source.fetch()?;
    let snapshot = mapping.map(&document, clock.now());

    if snapshot.sensors.is_empty() {
        warn!("Feed returned no usable entries");
    }
    for sensor in &snapshot.sensors {
        match sensor.level {
            Some(SensorLevel::Danger) => warn!(
                sensor = sensor.kind.id(),
                value = sensor.current_value,
                "Sensor reading at danger level"
            ),
            None => warn!(sensor = sensor.kind.id(), "Sensor has no current value"),
            _ => {}
        }
    }
    debug!(
        sensors = snapshot.sensors.len(),
        entries = document.feeds.len(),
        "Feed refreshed"
    );

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    guard.set_snapshot(snapshot.clone());
    Ok(snapshot)
}

pub fn spawn_refresh_thread<S>(
    mut source: S,
    mapping: FeedMapping,
    state: Arc<RwLock<AppState>>,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()>
where
    S: FeedSource + Send + 'static,
{
    std::thread::spawn(move || {
        let clock = SystemClock;
        while !stop.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            if let Err(e) = run_refresh_cycle(&mut source, &mapping, &state, &clock) {
                warn!(error = %e, "Feed refresh cycle failed");
            }

            sleep_with_stop(interval, &stop, cycle_start);
        }
    })
}

fn sleep_with_stop(duration: Duration, stop: &AtomicBool, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed >= duration {
        return;
    }
    let remaining = duration - elapsed;
    let step = Duration::from_millis(100);
    let mut slept = Duration::ZERO;

    while slept < remaining {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(step);
        slept += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::SensorKind;
    use crate::feed::mock::{MockFeedBehavior, MockFeedSource, dust_document};
    use crate::forecast::clock::FixedClock;
    use time::OffsetDateTime;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_742_040_000 + seconds).expect("valid timestamp")
    }

    #[test]
    fn refresh_cycle_stores_snapshot() -> Result<(), AppError> {
        let mut source = MockFeedSource::new(vec![MockFeedBehavior::with_document(
            dust_document(at(0), &[10.0, 11.0, 12.0]),
        )]);
        let state = Arc::new(RwLock::new(AppState::default()));

        let snapshot =
            run_refresh_cycle(&mut source, &FeedMapping::default(), &state, &FixedClock(at(5)))?;

        assert_eq!(snapshot.refreshed_at, at(5));
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        let stored = guard.snapshot().expect("snapshot stored");
        let dust = stored.sensor(SensorKind::SmallDust).expect("dust sensor");
        assert_eq!(dust.history_values(), vec![10.0, 11.0, 12.0]);
        assert_eq!(guard.revision(), 1);
        Ok(())
    }

    #[test]
    fn failed_fetch_keeps_previous_snapshot() -> Result<(), AppError> {
        let mut source = MockFeedSource::new(vec![
            MockFeedBehavior::with_document(dust_document(at(0), &[10.0])),
            MockFeedBehavior::fail(),
        ]);
        let state = Arc::new(RwLock::new(AppState::default()));
        let mapping = FeedMapping::default();

        run_refresh_cycle(&mut source, &mapping, &state, &FixedClock(at(1)))?;
        let result = run_refresh_cycle(&mut source, &mapping, &state, &FixedClock(at(2)));

        assert!(matches!(result, Err(AppError::Feed(_))));
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        assert_eq!(guard.snapshot().map(|s| s.refreshed_at), Some(at(1)));
        assert_eq!(guard.revision(), 1);
        Ok(())
    }

    #[test]
    fn refresh_thread_stops_when_flag_is_raised() {
        let source = MockFeedSource::new(vec![MockFeedBehavior::with_document(dust_document(
            at(0),
            &[10.0],
        ))]);
        let state = Arc::new(RwLock::new(AppState::default()));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = spawn_refresh_thread(
            source,
            FeedMapping::default(),
            Arc::clone(&state),
            Duration::from_millis(50),
            Arc::clone(&stop),
        );
        std::thread::sleep(Duration::from_millis(200));
        stop.store(true, Ordering::Relaxed);
        handle.join().expect("refresh thread joins");

        let guard = state.read().expect("state lock");
        assert!(guard.revision() >= 1);
    }
}
