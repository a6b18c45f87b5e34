#![forbid(unsafe_code)]

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;

use crate::api::{ApiError, TaskApi};
use crate::task::model::{StoredTask, Task, TaskPayload};

/// `TaskApi` over the REST resource at `base_url` (e.g. `http://localhost:4000/tasks`).
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: String,
}

impl HttpTaskApi {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/{id}", self.base_url)
    }

    async fn send_write(
        &self,
        method: Method,
        url: String,
        payload: Option<&TaskPayload>,
    ) -> Result<(), ApiError> {
        tracing::debug!(%method, %url, "sending request");
        let mut req = self.client.request(method.clone(), &url);
        if let Some(payload) = payload {
            req = req.json(payload);
        }
        let resp = req
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%method, %url, status = status.as_u16(), "server rejected request");
        }
        Ok(())
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let rows: Vec<StoredTask> = get_json(&self.client, &self.base_url).await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn create(&self, payload: &TaskPayload) -> Result<(), ApiError> {
        self.send_write(Method::POST, self.base_url.clone(), Some(payload))
            .await
    }

    async fn update(&self, id: u64, payload: &TaskPayload) -> Result<(), ApiError> {
        self.send_write(Method::PUT, self.item_url(id), Some(payload))
            .await
    }

    async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.send_write(Method::DELETE, self.item_url(id), None)
            .await
    }
}

/// GETs `url` and decodes the JSON body into `T`.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, ApiError> {
    tracing::debug!(%url, "sending request");
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|source| ApiError::Transport {
            url: url.to_owned(),
            source,
        })?;
    decode_json(url, resp).await
}

async fn decode_json<T: DeserializeOwned>(url: &str, resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            url: url.to_owned(),
            status: status.as_u16(),
        });
    }
    let body = resp.bytes().await.map_err(|source| ApiError::Transport {
        url: url.to_owned(),
        source,
    })?;
    serde_json::from_slice(&body).map_err(|source| ApiError::Parse {
        url: url.to_owned(),
        source,
    })
}
