use crate::feed::{ChannelInfo, FeedDocument, FeedEntry, FeedError, FeedSource, FieldValue};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone)]
pub enum MockFeedBehavior {
    Document(FeedDocument),
    Fail,
}

impl MockFeedBehavior {
    pub fn with_document(document: FeedDocument) -> Self {
        Self::Document(document)
    }

    pub fn fail() -> Self {
        Self::Fail
    }
}

/// Replays scripted fetch outcomes in order, then empty documents.
pub struct MockFeedSource {
    behaviors: Vec<MockFeedBehavior>,
    next_index: usize,
}

impl MockFeedSource {
    pub fn new(behaviors: Vec<MockFeedBehavior>) -> Self {
        Self {
            behaviors,
            next_index: 0,
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.next_index
    }
}

impl FeedSource for MockFeedSource {
    fn fetch(&mut self) -> Result<FeedDocument, FeedError> {
        let behavior = self.behaviors.get(self.next_index).cloned();
        self.next_index += 1;
        match behavior {
            Some(MockFeedBehavior::Document(document)) => Ok(document),
            Some(MockFeedBehavior::Fail) => {
                Err(FeedError::Unavailable("mock fetch failed".to_string()))
            }
            None => Ok(FeedDocument::default()),
        }
    }
}

/// One row of sensor values: temperature, humidity, small dust, large dust.
pub type FeedRow = [Option<f64>; 4];

/// Build a document with one entry per hour starting at `start`.
pub fn hourly_document(start: OffsetDateTime, rows: &[FeedRow]) -> FeedDocument {
    let feeds = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let created_at = (start + Duration::hours(index as i64))
                .format(&Rfc3339)
                .unwrap_or_default();
            let value = |field: Option<f64>| field.map(|v| FieldValue::Text(v.to_string()));
            FeedEntry {
                created_at,
                entry_id: Some(index as u64 + 1),
                field1: value(row[0]),
                field2: value(row[1]),
                field3: value(row[2]),
                field4: value(row[3]),
            }
        })
        .collect();

    FeedDocument {
        channel: ChannelInfo::default(),
        feeds,
    }
}

/// Convenience for a document carrying only small-dust readings.
pub fn dust_document(start: OffsetDateTime, dust: &[f64]) -> FeedDocument {
    let rows: Vec<FeedRow> = dust
        .iter()
        .map(|value| [Some(21.0), Some(55.0), Some(*value), None])
        .collect();
    hourly_document(start, &rows)
}
