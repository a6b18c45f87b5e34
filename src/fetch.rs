#![forbid(unsafe_code)]

//! Generic "GET a URL and watch the result" primitive.
//!
//! A [`Fetch`] issues a request as soon as it is created and again whenever its
//! URL changes. The previous request is cancelled on every URL change and when
//! the `Fetch` is dropped; a cancelled request never writes its result.

use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;
use crate::api::http::get_json;

#[derive(Debug)]
pub struct FetchState<T> {
    pub loading: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            loading: true,
            data: None,
            error: None,
        }
    }
}

pub struct Fetch<T> {
    client: Client,
    url: String,
    state: Arc<watch::Sender<FetchState<T>>>,
    cancel: CancellationToken,
}

impl<T> Fetch<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(FetchState::default());
        let mut fetch = Self {
            client,
            url: url.into(),
            state: Arc::new(tx),
            cancel: CancellationToken::new(),
        };
        fetch.start();
        fetch
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Points the fetch at `url`, re-fetching only if it differs from the current one.
    pub fn set_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if url == self.url {
            return;
        }
        self.url = url;
        self.start();
    }

    #[must_use]
    pub fn state(&self) -> watch::Ref<'_, FetchState<T>> {
        self.state.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// Waits for the current request to finish.
    pub async fn settled(&self) -> watch::Ref<'_, FetchState<T>> {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|s| !s.loading).await;
        self.state.borrow()
    }

    fn start(&mut self) {
        let stale = std::mem::replace(&mut self.cancel, CancellationToken::new());
        // Cancelling under the channel lock orders it against the stale job's write.
        self.state.send_modify(|s| {
            stale.cancel();
            s.loading = true;
        });

        let token = self.cancel.clone();
        let client = self.client.clone();
        let url = self.url.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = token.cancelled() => return,
                res = get_json::<T>(&client, &url) => res,
            };
            state.send_if_modified(|s| {
                if token.is_cancelled() {
                    return false;
                }
                s.loading = false;
                match result {
                    Ok(data) => {
                        s.data = Some(data);
                        s.error = None;
                    }
                    Err(e) => {
                        tracing::debug!(%url, error = %e, "fetch failed");
                        s.error = Some(e);
                    }
                }
                true
            });
        });
    }
}

impl<T> Drop for Fetch<T> {
    fn drop(&mut self) {
        let cancel = &self.cancel;
        self.state.send_if_modified(|_| {
            cancel.cancel();
            false
        });
    }
}
