#![forbid(unsafe_code)]

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::api::{ApiError, TaskApi};
use crate::task::TaskOperations;
use crate::task::model::Task;

/// Owns the canonical task list and mediates every remote operation.
///
/// The list is only ever replaced wholesale by a completed read. Mutations never
/// touch it directly: each successful write is followed by a fresh read, so the
/// server stays the single source of truth. When reads overlap, the one that
/// completes last wins.
pub struct TaskController {
    shared: Shared,
    tracker: TaskTracker,
    mounted: Option<CancellationToken>,
}

#[derive(Clone)]
struct Shared {
    api: Arc<dyn TaskApi>,
    tasks: Arc<watch::Sender<Vec<Task>>>,
}

impl TaskController {
    #[must_use]
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            shared: Shared {
                api,
                tasks: Arc::new(tx),
            },
            tracker: TaskTracker::new(),
            mounted: None,
        }
    }

    /// Issues the initial read, abortable with [`TaskController::unmount`].
    pub fn mount(&mut self) {
        self.unmount();
        let token = CancellationToken::new();
        self.mounted = Some(token.clone());
        self.read(Some(token));
    }

    pub fn unmount(&mut self) {
        if let Some(token) = self.mounted.take() {
            // Cancelled under the channel lock so an in-flight read cannot land afterwards.
            self.shared.tasks.send_if_modified(|_| {
                token.cancel();
                false
            });
        }
    }

    /// Fetches the full list and replaces local state.
    pub fn read(&self, cancel: Option<CancellationToken>) {
        let shared = self.shared.clone();
        self.tracker.spawn(async move { shared.read(cancel).await });
    }

    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.shared.tasks.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.shared.tasks.subscribe()
    }

    /// Waits until every operation spawned so far, refetches included, has finished.
    ///
    /// Takes `&mut self` because the tracker is closed for the duration of the wait.
    pub async fn idle(&mut self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

impl Drop for TaskController {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl TaskOperations for TaskController {
    fn create(&self, task: Task) {
        let shared = self.shared.clone();
        self.tracker.spawn(async move {
            match shared.api.create(&task.payload()).await {
                Ok(()) => shared.read(None).await,
                Err(e) => tracing::error!(error = %e, "create error"),
            }
        });
    }

    fn update(&self, task: Task) {
        let Some(id) = task.id else {
            tracing::error!(title = %task.title, "update error: task has no id");
            return;
        };
        let shared = self.shared.clone();
        self.tracker.spawn(async move {
            match shared.api.update(id, &task.payload()).await {
                Ok(()) => shared.read(None).await,
                Err(e) => tracing::error!(id, error = %e, "update error"),
            }
        });
    }

    /// Absent ids and id 0, which the server never assigns, are ignored.
    fn delete(&self, id: Option<u64>) {
        let Some(id) = id.filter(|&id| id != 0) else {
            return;
        };
        let shared = self.shared.clone();
        self.tracker.spawn(async move {
            match shared.api.delete(id).await {
                Ok(()) => shared.read(None).await,
                Err(e) => tracing::error!(id, error = %e, "delete error"),
            }
        });
    }
}

impl Shared {
    async fn read(&self, cancel: Option<CancellationToken>) {
        let result = match &cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(ApiError::Cancelled),
                res = self.api.list() => res,
            },
            None => self.api.list().await,
        };

        let aborted = || cancel.as_ref().is_some_and(CancellationToken::is_cancelled);

        match result {
            Ok(tasks) => {
                let count = tasks.len();
                // A read that raced its own abort must not land.
                let landed = self.tasks.send_if_modified(|current| {
                    if aborted() {
                        return false;
                    }
                    *current = tasks;
                    true
                });
                if landed {
                    tracing::debug!(count, "fetched tasks");
                }
            }
            Err(e) if e.is_cancelled() || aborted() => {}
            Err(e) => tracing::error!(error = %e, "read error"),
        }
    }
}
