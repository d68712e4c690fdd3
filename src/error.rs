//! Error types for catalog access and configuration

use thiserror::Error;

/// Errors produced while talking to the catalog or loading settings
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Page {page} is out of range (1..={total})")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl From<ureq::Error> for CatalogError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => CatalogError::Status(code),
            other => CatalogError::Transport(other.to_string()),
        }
    }
}

impl CatalogError {
    /// Rejected before any request went out
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            CatalogError::EmptyQuery | CatalogError::PageOutOfRange { .. }
        )
    }
}
