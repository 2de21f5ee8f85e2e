use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("feed error: {0}")]
    Feed(#[from] crate::feed::FeedError),
    #[error("state lock poisoned")]
    StateLock,
}
