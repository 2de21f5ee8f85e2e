use crate::api::responses::{
    DataPointResponse, ErrorCode, ErrorResponse, HealthStatus, HealthSuccessResponse,
    LastCleanedUpdate, ScheduleQuery, ScheduleSuccessResponse, SensorResponse,
    SensorsSuccessResponse,
};
use crate::feed::{FeedSnapshot, SensorSnapshot};
use crate::forecast::clock::{Clock, SystemClock};
use crate::forecast::{ScheduleForecast, forecast_from_state};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

/// JSON body with an explicit status, or an error body.
pub enum ApiResponse<T> {
    Success { status: StatusCode, body: T },
    Error { status: StatusCode, body: ErrorResponse },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success { status, body } => (status, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub enum LastCleanedResponse {
    Updated,
    Error { status: StatusCode, body: ErrorResponse },
}

impl IntoResponse for LastCleanedResponse {
    fn into_response(self) -> Response {
        match self {
            LastCleanedResponse::Updated => StatusCode::NO_CONTENT.into_response(),
            LastCleanedResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_health(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_health_response(state, &SystemClock)
}

pub async fn get_sensors(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_sensors_response(state, &SystemClock)
}

pub async fn get_cleaning_schedule(
    State(state): State<Arc<RwLock<AppState>>>,
    Query(query): Query<ScheduleQuery>,
) -> impl IntoResponse {
    build_schedule_response(state, query.last_cleaned_days_ago, &SystemClock)
}

pub async fn put_last_cleaned(
    State(state): State<Arc<RwLock<AppState>>>,
    Json(update): Json<LastCleanedUpdate>,
) -> impl IntoResponse {
    build_last_cleaned_response(state, update, &SystemClock)
}

fn build_health_response(
    state: Arc<RwLock<AppState>>,
    clock: &dyn Clock,
) -> ApiResponse<HealthSuccessResponse> {
    let now = clock.now();
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return internal_error("/api/health", "state lock poisoned while reading snapshot", now);
        }
    };
    let status = derive_health_status(guard.snapshot());
    let refreshed_at = guard.snapshot().map(|snapshot| snapshot.refreshed_at);
    drop(guard);

    let refreshed_at = match refreshed_at.map(format_timestamp).transpose() {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/health", "timestamp formatting failure", now),
    };
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/health", "timestamp formatting failure", now),
    };

    let status_code = match status {
        HealthStatus::Ko => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
    };

    ApiResponse::Success {
        status: status_code,
        body: HealthSuccessResponse {
            status,
            refreshed_at,
            timestamp,
        },
    }
}

fn derive_health_status(snapshot: Option<&FeedSnapshot>) -> HealthStatus {
    let Some(snapshot) = snapshot else {
        return HealthStatus::Ko;
    };
    let reporting = snapshot
        .sensors
        .iter()
        .filter(|sensor| sensor.current_value.is_some())
        .count();

    if reporting == 0 {
        HealthStatus::Ko
    } else if reporting < snapshot.sensors.len() {
        HealthStatus::Degraded
    } else {
        HealthStatus::Ok
    }
}

fn build_sensors_response(
    state: Arc<RwLock<AppState>>,
    clock: &dyn Clock,
) -> ApiResponse<SensorsSuccessResponse> {
    let now = clock.now();
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return internal_error("/api/sensors", "state lock poisoned while reading snapshot", now);
        }
    };
    let Some(snapshot) = guard.snapshot().cloned() else {
        drop(guard);
        return no_data_response("/api/sensors", "No sensor data available", now);
    };
    drop(guard);

    let mut sensors = Vec::with_capacity(snapshot.sensors.len());
    for sensor in &snapshot.sensors {
        match map_sensor(sensor) {
            Ok(mapped) => sensors.push(mapped),
            Err(_) => return internal_error("/api/sensors", "timestamp formatting failure", now),
        }
    }

    let (refreshed_at, timestamp) =
        match (format_timestamp(snapshot.refreshed_at), format_timestamp(now)) {
            (Ok(refreshed_at), Ok(timestamp)) => (refreshed_at, timestamp),
            _ => return internal_error("/api/sensors", "timestamp formatting failure", now),
        };

    ApiResponse::Success {
        status: StatusCode::OK,
        body: SensorsSuccessResponse {
            sensors,
            refreshed_at,
            timestamp,
        },
    }
}

fn map_sensor(sensor: &SensorSnapshot) -> Result<SensorResponse, TimestampError> {
    let history = sensor
        .history
        .iter()
        .map(|point| {
            Ok(DataPointResponse {
                time: format_timestamp(point.timestamp)?,
                value: point.value,
            })
        })
        .collect::<Result<Vec<_>, TimestampError>>()?;

    Ok(SensorResponse {
        id: sensor.kind.id().to_string(),
        name: sensor.name.clone(),
        unit: sensor.unit.to_string(),
        current_value: sensor.current_value,
        status: sensor.level,
        history,
    })
}

fn build_schedule_response(
    state: Arc<RwLock<AppState>>,
    last_cleaned_override: Option<u32>,
    clock: &dyn Clock,
) -> ApiResponse<ScheduleSuccessResponse> {
    let now = clock.now();
    match forecast_from_state(&state, last_cleaned_override, clock) {
        Ok(Some(forecast)) => schedule_success(forecast, now),
        Ok(None) => no_data_response(
            "/api/cleaning-schedule",
            "No dust readings available for a cleaning forecast",
            now,
        ),
        Err(err) => internal_error("/api/cleaning-schedule", &err.to_string(), now),
    }
}

fn schedule_success(
    forecast: ScheduleForecast,
    now: OffsetDateTime,
) -> ApiResponse<ScheduleSuccessResponse> {
    let timestamp = match format_timestamp(forecast.computed_at) {
        Ok(formatted) => formatted,
        Err(_) => {
            return internal_error("/api/cleaning-schedule", "timestamp formatting failure", now);
        }
    };
    let urgency = forecast.prediction.urgency();
    let prediction = forecast.prediction;

    ApiResponse::Success {
        status: StatusCode::OK,
        body: ScheduleSuccessResponse {
            remaining_days: prediction.remaining_days,
            air_quality: prediction.air_quality,
            dust_accumulation_percent: prediction.dust_accumulation_percent,
            recommendation: prediction.recommendation,
            urgency,
            last_cleaned: prediction.last_cleaned,
            last_cleaned_days_ago: forecast.last_cleaned_days_ago,
            accumulation_rate: prediction.accumulation_rate,
            reading_count: forecast.reading_count,
            timestamp,
        },
    }
}

fn build_last_cleaned_response(
    state: Arc<RwLock<AppState>>,
    update: LastCleanedUpdate,
    clock: &dyn Clock,
) -> LastCleanedResponse {
    let Ok(mut guard) = state.write() else {
        let body = internal_error_body(
            "/api/cleaning-schedule/last-cleaned",
            "state lock poisoned while updating last cleaned",
            clock.now(),
        );
        return LastCleanedResponse::Error {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body,
        };
    };
    guard.set_last_cleaned_days_ago(update.last_cleaned_days_ago);
    drop(guard);

    info!(
        last_cleaned_days_ago = update.last_cleaned_days_ago,
        "Last cleaning updated"
    );
    LastCleanedResponse::Updated
}

fn no_data_response<T>(route: &str, message: &str, now: OffsetDateTime) -> ApiResponse<T> {
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Error {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: ErrorResponse {
                error_code: ErrorCode::NoData,
                error_message: message.to_string(),
                timestamp,
            },
        },
        Err(_) => internal_error(route, "timestamp formatting failure", now),
    }
}

fn internal_error<T>(route: &str, message: &str, now: OffsetDateTime) -> ApiResponse<T> {
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: internal_error_body(route, message, now),
    }
}

fn internal_error_body(route: &str, message: &str, now: OffsetDateTime) -> ErrorResponse {
    error!(route = route, message = message, "Internal error while handling request");
    let timestamp = format_timestamp(now).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format error timestamp");
        FALLBACK_TIMESTAMP.to_string()
    });
    ErrorResponse {
        error_code: ErrorCode::InternalError,
        error_message: INTERNAL_ERROR_MESSAGE.to_string(),
        timestamp,
    }
}

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, TimestampError> {
    timestamp.format(&Rfc3339).map_err(TimestampError::Format)
}
