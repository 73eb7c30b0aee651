use shared::error::ApiException;
use thiserror::Error;

use crate::ResourceKind;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid admin base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend rejected request: {0}")]
    Status(#[from] ApiException),
    #[error("failed to decode {resource} response: {source}")]
    Decode {
        resource: ResourceKind,
        source: serde_json::Error,
    },
}

impl ResourceError {
    /// HTTP status reported by the backend, when the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(err) => Some(err.status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::InvalidBaseUrl { .. } | Self::Decode { .. } => None,
        }
    }
}
