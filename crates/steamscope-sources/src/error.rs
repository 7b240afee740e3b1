use thiserror::Error;

/// Failure of a single upstream request.
///
/// The pagination driver treats every variant the same way: the session
/// ends and whatever was accumulated so far is kept.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("upstream reported success={0}")]
    Upstream(i64),
    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        SourceError::Other(message.into())
    }

    /// Short label used when grouping failures in summaries.
    pub fn category(&self) -> &'static str {
        match self {
            SourceError::Transport(_) => "transport",
            SourceError::Status(_) => "http_status",
            SourceError::Decode(_) => "decode",
            SourceError::Upstream(_) => "upstream",
            SourceError::Other(_) => "other",
        }
    }
}
