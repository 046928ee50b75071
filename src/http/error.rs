use thiserror::Error;

use crate::audio::error::PlayerError;

/// Failures at the backend HTTP boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Format(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Maps a catalog fetch failure onto the session taxonomy.
    pub fn into_catalog_error(self) -> PlayerError {
        match self {
            Self::Format(msg) => PlayerError::CatalogFormat(msg),
            other => PlayerError::CatalogFetch(other.to_string()),
        }
    }
}
