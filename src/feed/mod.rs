//! Sensor feed documents and their mapping into sensor snapshots.
//!
//! A feed document is a channel description plus a chronological list of
//! entries, each carrying up to four numeric fields:
//!
//! | field    | sensor              | unit  |
//! |----------|---------------------|-------|
//! | `field1` | temperature         | °C    |
//! | `field2` | humidity            | %     |
//! | `field3` | small dust (PM2.5)  | µg/m³ |
//! | `field4` | large dust (PM10)   | µg/m³ |

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

pub mod file;
pub mod mock;
pub mod refresh;

pub const DEFAULT_MAX_RESULTS: usize = 30;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read feed: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse feed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("feed unavailable: {0}")]
    Unavailable(String),
}

/// Where feed documents come from.
pub trait FeedSource {
    fn fetch(&mut self) -> Result<FeedDocument, FeedError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    #[serde(default)]
    pub channel: ChannelInfo,
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

/// Optional display labels for each field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub field1: Option<String>,
    #[serde(default)]
    pub field2: Option<String>,
    #[serde(default)]
    pub field3: Option<String>,
    #[serde(default)]
    pub field4: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub created_at: String,
    #[serde(default)]
    pub entry_id: Option<u64>,
    #[serde(default)]
    pub field1: Option<FieldValue>,
    #[serde(default)]
    pub field2: Option<FieldValue>,
    #[serde(default)]
    pub field3: Option<FieldValue>,
    #[serde(default)]
    pub field4: Option<FieldValue>,
}

/// Vendors send numbers as strings; some send them bare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(value) => *value,
            FieldValue::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    #[serde(rename = "temp")]
    Temperature,
    Humidity,
    SmallDust,
    LargeDust,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::SmallDust,
        SensorKind::LargeDust,
    ];

    pub fn id(self) -> &'static str {
        match self {
            SensorKind::Temperature => "temp",
            SensorKind::Humidity => "humidity",
            SensorKind::SmallDust => "small_dust",
            SensorKind::LargeDust => "large_dust",
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            SensorKind::Temperature => "Temperature",
            SensorKind::Humidity => "Humidity",
            SensorKind::SmallDust => "Small Dust (PM2.5)",
            SensorKind::LargeDust => "Large Dust (PM10)",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SensorKind::Temperature => "°C",
            SensorKind::Humidity => "%",
            SensorKind::SmallDust | SensorKind::LargeDust => "µg/m³",
        }
    }

    fn field(self, entry: &FeedEntry) -> Option<&FieldValue> {
        match self {
            SensorKind::Temperature => entry.field1.as_ref(),
            SensorKind::Humidity => entry.field2.as_ref(),
            SensorKind::SmallDust => entry.field3.as_ref(),
            SensorKind::LargeDust => entry.field4.as_ref(),
        }
    }

    fn label(self, channel: &ChannelInfo) -> Option<&str> {
        let label = match self {
            SensorKind::Temperature => channel.field1.as_deref(),
            SensorKind::Humidity => channel.field2.as_deref(),
            SensorKind::SmallDust => channel.field3.as_deref(),
            SensorKind::LargeDust => channel.field4.as_deref(),
        };
        label.map(str::trim).filter(|label| !label.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorLevel {
    Normal,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelThresholds {
    pub warning: f64,
    pub danger: f64,
}

impl LevelThresholds {
    pub fn classify(&self, value: f64) -> SensorLevel {
        if value >= self.danger {
            SensorLevel::Danger
        } else if value >= self.warning {
            SensorLevel::Warning
        } else {
            SensorLevel::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorThresholds {
    pub temperature: LevelThresholds,
    pub humidity: LevelThresholds,
    pub dust: LevelThresholds,
}

impl Default for SensorThresholds {
    fn default() -> Self {
        Self {
            temperature: LevelThresholds {
                warning: 25.0,
                danger: 30.0,
            },
            humidity: LevelThresholds {
                warning: 65.0,
                danger: 70.0,
            },
            dust: LevelThresholds {
                warning: 180.0,
                danger: 250.0,
            },
        }
    }
}

impl SensorThresholds {
    pub fn for_kind(&self, kind: SensorKind) -> &LevelThresholds {
        match kind {
            SensorKind::Temperature => &self.temperature,
            SensorKind::Humidity => &self.humidity,
            SensorKind::SmallDust | SensorKind::LargeDust => &self.dust,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub timestamp: OffsetDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    pub kind: SensorKind,
    pub name: String,
    pub unit: &'static str,
    pub current_value: Option<f64>,
    pub level: Option<SensorLevel>,
    /// Chronological; unparseable values are skipped.
    pub history: Vec<DataPoint>,
}

impl SensorSnapshot {
    pub fn history_values(&self) -> Vec<f64> {
        self.history.iter().map(|point| point.value).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub sensors: Vec<SensorSnapshot>,
    pub refreshed_at: OffsetDateTime,
}

impl FeedSnapshot {
    pub fn sensor(&self, kind: SensorKind) -> Option<&SensorSnapshot> {
        self.sensors.iter().find(|sensor| sensor.kind == kind)
    }
}

/// Turns raw feed documents into snapshots.
#[derive(Debug, Clone)]
pub struct FeedMapping {
    pub thresholds: SensorThresholds,
    pub max_results: usize,
}

impl Default for FeedMapping {
    fn default() -> Self {
        Self {
            thresholds: SensorThresholds::default(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl FeedMapping {
    pub fn map(&self, document: &FeedDocument, refreshed_at: OffsetDateTime) -> FeedSnapshot {
        let start = document.feeds.len().saturating_sub(self.max_results);
        let entries = &document.feeds[start..];

        let Some(latest) = entries.last() else {
            return FeedSnapshot {
                sensors: Vec::new(),
                refreshed_at,
            };
        };

        let timestamps: Vec<Option<OffsetDateTime>> = entries
            .iter()
            .map(|entry| OffsetDateTime::parse(entry.created_at.trim(), &Rfc3339).ok())
            .collect();
        let bad_timestamps = timestamps.iter().filter(|ts| ts.is_none()).count();
        if bad_timestamps > 0 {
            warn!(
                count = bad_timestamps,
                "Skipping feed entries with unparseable created_at"
            );
        }

        let mut sensors = Vec::new();
        for kind in SensorKind::ALL {
            if !entries.iter().any(|entry| kind.field(entry).is_some()) {
                continue;
            }

            let history = entries
                .iter()
                .zip(&timestamps)
                .filter_map(|(entry, timestamp)| {
                    Some(DataPoint {
                        timestamp: (*timestamp)?,
                        value: kind.field(entry)?.as_f64()?,
                    })
                })
                .collect();

            let current_value = kind.field(latest).and_then(FieldValue::as_f64);
            let level = current_value.map(|value| self.thresholds.for_kind(kind).classify(value));
            let name = kind
                .label(&document.channel)
                .unwrap_or(kind.default_name())
                .to_string();

            sensors.push(SensorSnapshot {
                kind,
                name,
                unit: kind.unit(),
                current_value,
                level,
                history,
            });
        }

        FeedSnapshot {
            sensors,
            refreshed_at,
        }
    }
}
