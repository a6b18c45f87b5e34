#![forbid(unsafe_code)]

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::task::model::{Task, TaskPayload};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Remote task storage.
///
/// Mutations resolve once the server has answered; their response bodies carry
/// nothing the caller uses.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, ApiError>;
    async fn create(&self, payload: &TaskPayload) -> Result<(), ApiError>;
    async fn update(&self, id: u64, payload: &TaskPayload) -> Result<(), ApiError>;
    async fn delete(&self, id: u64) -> Result<(), ApiError>;
}
