use crate::feed::{FeedDocument, FeedError, FeedSource};
use std::path::PathBuf;

/// Re-reads a feed document from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileFeedSource {
    path: PathBuf,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeedSource for FileFeedSource {
    fn fetch(&mut self) -> Result<FeedDocument, FeedError> {
        let contents = std::fs::read_to_string(&self.path)?;
        let document = serde_json::from_str(&contents)?;
        Ok(document)
    }
}
