use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("malformed record at position {index}: expected a JSON object, found {found}")]
    MalformedRecord { index: usize, found: &'static str },
    #[error("pagination stalled: cursor {cursor:?} was returned again after {pages} page(s)")]
    PaginationStalled { cursor: String, pages: usize },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Transport(err.to_string())
    }
}
