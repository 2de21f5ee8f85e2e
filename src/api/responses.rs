use crate::feed::SensorLevel;
use crate::forecast::schedule::{AirQuality, Urgency};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoData,
    InternalError,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Ko,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SensorsSuccessResponse {
    pub sensors: Vec<SensorResponse>,
    pub refreshed_at: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SensorResponse {
    pub id: String,
    pub name: String,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SensorLevel>,
    pub history: Vec<DataPointResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DataPointResponse {
    pub time: String,
    pub value: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleSuccessResponse {
    pub remaining_days: u32,
    pub air_quality: AirQuality,
    pub dust_accumulation_percent: f64,
    pub recommendation: String,
    pub urgency: Urgency,
    pub last_cleaned: String,
    pub last_cleaned_days_ago: u32,
    pub accumulation_rate: f64,
    pub reading_count: usize,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub last_cleaned_days_ago: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LastCleanedUpdate {
    pub last_cleaned_days_ago: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_response_uses_screaming_snake_case_code() {
        let response = ErrorResponse {
            error_code: ErrorCode::NoData,
            error_message: "no forecast available".to_string(),
            timestamp: "2025-03-15T12:32:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize error response");
        assert_eq!(
            value,
            json!({
                "error_code": "NO_DATA",
                "error_message": "no forecast available",
                "timestamp": "2025-03-15T12:32:00Z"
            })
        );
    }

    #[test]
    fn health_response_omits_refreshed_at_when_none() {
        let response = HealthSuccessResponse {
            status: HealthStatus::Ko,
            refreshed_at: None,
            timestamp: "2025-03-15T12:33:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize health response");
        assert_eq!(
            value,
            json!({
                "status": "ko",
                "timestamp": "2025-03-15T12:33:00Z"
            })
        );
    }

    #[test]
    fn sensor_response_omits_missing_value_and_status() {
        let response = SensorResponse {
            id: "humidity".to_string(),
            name: "Humidity".to_string(),
            unit: "%".to_string(),
            current_value: None,
            status: None,
            history: vec![DataPointResponse {
                time: "2025-03-15T11:00:00Z".to_string(),
                value: 58.2,
            }],
        };

        let value = serde_json::to_value(response).expect("serialize sensor response");
        assert_eq!(
            value,
            json!({
                "id": "humidity",
                "name": "Humidity",
                "unit": "%",
                "history": [{ "time": "2025-03-15T11:00:00Z", "value": 58.2 }]
            })
        );
    }

    #[test]
    fn schedule_response_serializes_enums() {
        let response = ScheduleSuccessResponse {
            remaining_days: 10,
            air_quality: AirQuality::Moderate,
            dust_accumulation_percent: 66.7,
            recommendation: "Continue monitoring. Next routine cleaning in 10 days.".to_string(),
            urgency: Urgency::Routine,
            last_cleaned: "4 days ago".to_string(),
            last_cleaned_days_ago: 4,
            accumulation_rate: 0.0,
            reading_count: 1,
            timestamp: "2025-03-15T12:00:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize schedule response");
        assert_eq!(value["air_quality"], "Moderate");
        assert_eq!(value["urgency"], "routine");
        assert_eq!(value["dust_accumulation_percent"], 66.7);
        assert_eq!(value["last_cleaned"], "4 days ago");
    }
}
