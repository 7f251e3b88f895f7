use pmolistdiff::DiffError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Not connected to the media service")]
    NotConnected,
    #[error("Unknown parent id: {0}")]
    ParentNotFound(String),
    #[error("MediaBrowserService Error: {0}")]
    Service(String),
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] DiffError),
    #[error("Logging setup failed: {0}")]
    Logging(String),
    #[error("Configuration Error: {0}")]
    Config(#[from] anyhow::Error),
}

impl BrowserError {
    pub fn service(message: &str) -> Self {
        BrowserError::Service(message.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;
