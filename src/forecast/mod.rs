//! Cleaning-schedule forecasting over the latest feed snapshot.

use crate::error::AppError;
use crate::feed::SensorKind;
use crate::state::AppState;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;
use tracing::{debug, info};

pub mod clock;
pub mod regression;
pub mod relative;
pub mod schedule;

use clock::Clock;
use schedule::{PredictionRequest, PredictionResult, predict_cleaning_schedule};

/// Sensor whose history drives the cleaning forecast.
pub const FORECAST_SENSOR: SensorKind = SensorKind::SmallDust;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleCacheKey {
    pub revision: u64,
    pub last_cleaned_days_ago: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleForecast {
    pub prediction: PredictionResult,
    pub last_cleaned_days_ago: u32,
    pub reading_count: usize,
    pub computed_at: OffsetDateTime,
}

/// Forecast from the current snapshot, reusing a cached result when one is
/// still fresh.
///
/// Returns `Ok(None)` when there is no snapshot or it carries no dust sensor.
pub fn forecast_from_state(
    state: &Arc<RwLock<AppState>>,
    last_cleaned_override: Option<u32>,
    clock: &dyn Clock,
) -> Result<Option<ScheduleForecast>, AppError> {
    let now = clock.now();
    let (key, readings) = {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        let Some(dust) = guard
            .snapshot()
            .and_then(|snapshot| snapshot.sensor(FORECAST_SENSOR))
        else {
            return Ok(None);
        };

        let key = ScheduleCacheKey {
            revision: guard.revision(),
            last_cleaned_days_ago: last_cleaned_override
                .unwrap_or_else(|| guard.last_cleaned_days_ago()),
        };
        if let Some(cached) = guard.cached_schedule(&key, now) {
            debug!(
                revision = key.revision,
                last_cleaned_days_ago = key.last_cleaned_days_ago,
                "Returning cached cleaning forecast"
            );
            return Ok(Some(cached.clone()));
        }
        (key, dust.history_values())
    };

    let request = PredictionRequest {
        readings,
        last_cleaned_days_ago: key.last_cleaned_days_ago,
    };
    let prediction = predict_cleaning_schedule(&request, clock);
    info!(
        readings = request.readings.len(),
        last_cleaned_days_ago = key.last_cleaned_days_ago,
        remaining_days = prediction.remaining_days,
        air_quality = %prediction.air_quality,
        accumulation_rate = prediction.accumulation_rate,
        "Computed cleaning forecast"
    );

    let forecast = ScheduleForecast {
        prediction,
        last_cleaned_days_ago: key.last_cleaned_days_ago,
        reading_count: request.readings.len(),
        computed_at: now,
    };

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    // A refresh may have landed meanwhile; don't cache under a stale revision.
    if guard.revision() == key.revision {
        guard.cache_schedule(key, forecast.clone(), now);
    }
    Ok(Some(forecast))
}
