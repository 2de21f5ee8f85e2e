//! Cleaning-schedule prediction from a dust-reading series.
//!
//! The trend of the series gives an accumulation rate; the rate, the latest
//! reading and the days since the last cleaning give the forecast. The
//! prediction is total: any series, including an empty one, yields a
//! complete result.

use crate::forecast::clock::Clock;
use crate::forecast::regression::linear_fit;
use crate::forecast::relative::days_ago;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default cleaning cadence when accumulation is negligible.
pub const BASELINE_CLEANING_DAYS: u32 = 14;
/// Concentration (µg/m³) at which cleaning becomes mandatory.
pub const DUST_THRESHOLD: f64 = 45.0;
/// Readings arrive roughly hourly.
pub const SAMPLES_PER_DAY: f64 = 24.0;
/// Daily rates at or below this are treated as flat.
pub const NEGLIGIBLE_DAILY_RATE: f64 = 0.1;
/// Upper bound on the daily rate so it survives rounding.
const MAX_DAILY_RATE: f64 = f64::MAX / 10.0;

const URGENT_MAX_DAYS: u32 = 3;
const SOON_MAX_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub readings: Vec<f64>,
    pub last_cleaned_days_ago: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirQuality {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl AirQuality {
    /// Classify the current dust level as a percentage of the threshold.
    pub fn from_percent(percent: f64) -> Self {
        if percent < 25.0 {
            AirQuality::Excellent
        } else if percent < 50.0 {
            AirQuality::Good
        } else if percent < 75.0 {
            AirQuality::Moderate
        } else {
            AirQuality::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AirQuality::Excellent => "Excellent",
            AirQuality::Good => "Good",
            AirQuality::Moderate => "Moderate",
            AirQuality::Poor => "Poor",
        }
    }
}

impl fmt::Display for AirQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Immediate,
    Soon,
    Routine,
}

impl Urgency {
    pub fn from_remaining_days(remaining_days: u32) -> Self {
        if remaining_days <= URGENT_MAX_DAYS {
            Urgency::Immediate
        } else if remaining_days <= SOON_MAX_DAYS {
            Urgency::Soon
        } else {
            Urgency::Routine
        }
    }

    pub fn recommendation(self, remaining_days: u32) -> String {
        match self {
            Urgency::Immediate => format!(
                "Immediate cleaning recommended. High dust levels predicted within {remaining_days} days."
            ),
            Urgency::Soon => format!(
                "Schedule cleaning soon. Next routine cleaning recommended in {remaining_days} days."
            ),
            Urgency::Routine => {
                format!("Continue monitoring. Next routine cleaning in {remaining_days} days.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub remaining_days: u32,
    pub air_quality: AirQuality,
    pub dust_accumulation_percent: f64,
    pub recommendation: String,
    pub last_cleaned: String,
    pub accumulation_rate: f64,
}

impl PredictionResult {
    pub fn urgency(&self) -> Urgency {
        Urgency::from_remaining_days(self.remaining_days)
    }
}

pub fn predict_cleaning_schedule(
    request: &PredictionRequest,
    clock: &dyn Clock,
) -> PredictionResult {
    let fit = linear_fit(&request.readings);
    let daily_rate = (fit.slope * SAMPLES_PER_DAY).clamp(0.0, MAX_DAILY_RATE);

    let current_level = request
        .readings
        .last()
        .copied()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0);

    let remaining_days = if daily_rate <= NEGLIGIBLE_DAILY_RATE {
        BASELINE_CLEANING_DAYS.saturating_sub(request.last_cleaned_days_ago)
    } else {
        days_until_threshold(current_level, daily_rate)
    };

    let dust_accumulation_percent = (current_level / DUST_THRESHOLD * 100.0).clamp(0.0, 100.0);
    let air_quality = AirQuality::from_percent(dust_accumulation_percent);
    let recommendation = Urgency::from_remaining_days(remaining_days).recommendation(remaining_days);
    let last_cleaned = days_ago(request.last_cleaned_days_ago, clock.now());

    PredictionResult {
        remaining_days,
        air_quality,
        dust_accumulation_percent: round_to_tenth(dust_accumulation_percent),
        recommendation,
        last_cleaned,
        accumulation_rate: round_to_tenth(daily_rate),
    }
}

fn days_until_threshold(current_level: f64, daily_rate: f64) -> u32 {
    let days = ((DUST_THRESHOLD - current_level) / daily_rate).floor();
    // Saturating cast; already past the threshold means clean now.
    days.max(0.0) as u32
}

fn round_to_tenth(value: f64) -> f64 {
    let scaled = value * 10.0;
    if scaled.is_finite() {
        scaled.round() / 10.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::clock::FixedClock;
    use time::OffsetDateTime;

    fn clock() -> FixedClock {
        FixedClock(OffsetDateTime::from_unix_timestamp(1_742_040_000).expect("valid timestamp"))
    }

    fn predict(readings: &[f64], last_cleaned_days_ago: u32) -> PredictionResult {
        let request = PredictionRequest {
            readings: readings.to_vec(),
            last_cleaned_days_ago,
        };
        predict_cleaning_schedule(&request, &clock())
    }

    #[test]
    fn steep_rise_near_threshold_needs_immediate_cleaning() {
        let result = predict(&[10.0, 20.0, 30.0, 40.0], 0);

        assert_eq!(result.accumulation_rate, 240.0);
        assert_eq!(result.remaining_days, 0);
        assert_eq!(result.dust_accumulation_percent, 88.9);
        assert_eq!(result.air_quality, AirQuality::Poor);
        assert_eq!(result.urgency(), Urgency::Immediate);
        assert_eq!(result.last_cleaned, "less than a minute ago");
    }

    #[test]
    fn empty_series_overdue_resolves_to_immediate_bucket() {
        let result = predict(&[], 20);

        assert_eq!(result.remaining_days, 0);
        assert_eq!(result.dust_accumulation_percent, 0.0);
        assert_eq!(result.air_quality, AirQuality::Excellent);
        assert_eq!(result.accumulation_rate, 0.0);
        assert_eq!(
            result.recommendation,
            "Immediate cleaning recommended. High dust levels predicted within 0 days."
        );
        assert_eq!(result.last_cleaned, "20 days ago");
    }

    #[test]
    fn single_reading_uses_baseline_cadence() {
        let result = predict(&[30.0], 4);

        assert_eq!(result.remaining_days, 10);
        assert_eq!(result.dust_accumulation_percent, 66.7);
        assert_eq!(result.air_quality, AirQuality::Moderate);
        assert_eq!(result.urgency(), Urgency::Routine);
        assert_eq!(
            result.recommendation,
            "Continue monitoring. Next routine cleaning in 10 days."
        );
        assert_eq!(result.last_cleaned, "4 days ago");
    }

    #[test]
    fn flat_series_at_threshold_uses_baseline_cadence() {
        for days in [0, 3, 9, 14, 30] {
            let result = predict(&[45.0, 45.0, 45.0], days);

            assert_eq!(result.remaining_days, BASELINE_CLEANING_DAYS.saturating_sub(days));
            assert_eq!(result.dust_accumulation_percent, 100.0);
            assert_eq!(result.air_quality, AirQuality::Poor);
        }
    }

    #[test]
    fn empty_series_follows_baseline_for_any_elapsed_days() {
        for days in 0..=40 {
            let result = predict(&[], days);

            assert_eq!(result.remaining_days, 14u32.saturating_sub(days));
            assert_eq!(result.dust_accumulation_percent, 0.0);
            assert_eq!(result.air_quality, AirQuality::Excellent);
        }
    }

    #[test]
    fn slow_rise_projects_days_until_threshold() {
        // 0.25 per hour -> 6 per day; (45 - 20.75) / 6 = 4.04 -> 4 days
        let readings: Vec<f64> = (0..4).map(|i| 20.0 + 0.25 * i as f64).collect();

        let result = predict(&readings, 2);

        assert_eq!(result.accumulation_rate, 6.0);
        assert_eq!(result.remaining_days, 4);
        assert_eq!(result.urgency(), Urgency::Soon);
        assert_eq!(
            result.recommendation,
            "Schedule cleaning soon. Next routine cleaning recommended in 4 days."
        );
    }

    #[test]
    fn trend_branch_ignores_elapsed_days() {
        let readings = [5.0, 5.05, 5.1, 5.15];

        let fresh = predict(&readings, 0);
        let stale = predict(&readings, 13);

        // 0.05 per hour -> 1.2 per day; (45 - 5.15) / 1.2 = 33.2
        assert_eq!(fresh.remaining_days, 33);
        assert_eq!(stale.remaining_days, 33);
    }

    #[test]
    fn rate_below_cutoff_is_treated_as_flat() {
        // 0.001 per hour -> 0.024 per day
        let readings = [10.0, 10.001, 10.002, 10.003];

        let result = predict(&readings, 5);

        assert_eq!(result.remaining_days, 9);
        assert_eq!(result.accumulation_rate, 0.0);
    }

    #[test]
    fn falling_series_never_reports_negative_rate() {
        let result = predict(&[40.0, 30.0, 20.0, 15.0], 1);

        assert_eq!(result.accumulation_rate, 0.0);
        assert_eq!(result.remaining_days, 13);
        assert_eq!(result.air_quality, AirQuality::Good);
    }

    #[test]
    fn over_threshold_with_rising_trend_is_zero_days() {
        for readings in [vec![44.0, 46.0], vec![50.0, 60.0, 70.0], vec![1.0, 500.0]] {
            let result = predict(&readings, 0);

            assert_eq!(result.remaining_days, 0);
            assert_eq!(result.dust_accumulation_percent, 100.0);
        }
    }

    #[test]
    fn percent_is_clamped_for_negative_levels() {
        let result = predict(&[-5.0], 0);

        assert_eq!(result.dust_accumulation_percent, 0.0);
        assert_eq!(result.air_quality, AirQuality::Excellent);
    }

    #[test]
    fn degenerate_values_still_produce_complete_result() {
        for readings in [
            vec![f64::NAN],
            vec![1.0, f64::NAN],
            vec![f64::INFINITY, 2.0],
            vec![f64::NEG_INFINITY, f64::INFINITY, f64::NAN],
            vec![0.0, 1e306],
            vec![0.0, 1e307],
            vec![0.0, f64::MAX],
        ] {
            let result = predict(&readings, 3);

            assert!(result.dust_accumulation_percent.is_finite());
            assert!((0.0..=100.0).contains(&result.dust_accumulation_percent));
            assert!(result.accumulation_rate.is_finite());
            assert!(result.accumulation_rate >= 0.0);
            assert!(!result.recommendation.is_empty());
            assert_eq!(result.last_cleaned, "3 days ago");
        }
    }

    #[test]
    fn huge_finite_rise_keeps_rate_finite() {
        let result = predict(&[0.0, 1e306], 3);

        assert!(result.accumulation_rate.is_finite());
        assert!(result.accumulation_rate > NEGLIGIBLE_DAILY_RATE);
        assert_eq!(result.remaining_days, 0);
        assert_eq!(result.urgency(), Urgency::Immediate);
        assert_eq!(result.air_quality, AirQuality::Poor);
        assert_eq!(result.dust_accumulation_percent, 100.0);
    }

    #[test]
    fn rounding_leaves_values_too_large_to_scale() {
        assert_eq!(round_to_tenth(f64::MAX), f64::MAX);
        assert_eq!(round_to_tenth(1.26), 1.3);
    }

    #[test]
    fn baseline_branch_is_monotone_in_elapsed_days() {
        let readings = [12.0, 12.0, 12.0];
        let mut previous = u32::MAX;

        for days in 0..=30 {
            let remaining = predict(&readings, days).remaining_days;
            assert!(remaining <= previous);
            previous = remaining;
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let readings = [8.0, 9.5, 11.0, 10.0, 12.5];

        assert_eq!(predict(&readings, 6), predict(&readings, 6));
    }

    #[test]
    fn air_quality_bucket_bounds_are_exclusive_upper() {
        assert_eq!(AirQuality::from_percent(0.0), AirQuality::Excellent);
        assert_eq!(AirQuality::from_percent(24.9), AirQuality::Excellent);
        assert_eq!(AirQuality::from_percent(25.0), AirQuality::Good);
        assert_eq!(AirQuality::from_percent(50.0), AirQuality::Moderate);
        assert_eq!(AirQuality::from_percent(74.9), AirQuality::Moderate);
        assert_eq!(AirQuality::from_percent(75.0), AirQuality::Poor);
    }

    #[test]
    fn urgency_bucket_bounds_are_inclusive() {
        assert_eq!(Urgency::from_remaining_days(0), Urgency::Immediate);
        assert_eq!(Urgency::from_remaining_days(3), Urgency::Immediate);
        assert_eq!(Urgency::from_remaining_days(4), Urgency::Soon);
        assert_eq!(Urgency::from_remaining_days(7), Urgency::Soon);
        assert_eq!(Urgency::from_remaining_days(8), Urgency::Routine);
    }

    #[test]
    fn recommendation_embeds_remaining_days() {
        assert!(Urgency::Soon.recommendation(6).contains('6'));
        assert!(Urgency::Routine.recommendation(12).contains("12"));
    }
}
