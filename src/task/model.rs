#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// A work item as stored by the remote task API.
///
/// `id` and the timestamps are owned by the server: they are absent on a task
/// that was never persisted and are never sent back on writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A row of the list response. The server assigns `id` to every task it
/// returns, so a row without one fails to decode.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoredTask {
    pub id: u64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl From<StoredTask> for Task {
    fn from(row: StoredTask) -> Self {
        Self {
            id: Some(row.id),
            title: row.title,
            description: row.description,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Body of create and update requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskPayload {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl Task {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn payload(&self) -> TaskPayload {
        TaskPayload {
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
        }
    }

    #[must_use]
    pub fn completed_label(&self) -> &'static str {
        if self.completed { "True" } else { "False" }
    }
}

/// Formats a server timestamp for display. Non-RFC 3339 input is shown as-is.
#[must_use]
pub fn display_timestamp(ts: Option<&str>) -> String {
    let Some(raw) = ts.map(str::trim).filter(|s| !s.is_empty()) else {
        return "-".to_owned();
    };
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]");
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|dt| dt.format(&fmt).ok())
        .unwrap_or_else(|| raw.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_list_items_with_server_fields() {
        let raw = r#"{"id":1,"title":"A","description":"d","completed":false,
            "created_at":"2024-03-01T10:15:00.000Z","updated_at":"2024-03-02T08:00:00Z"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.id, Some(1));
        assert_eq!(task.title, "A");
        assert!(!task.completed);
        assert_eq!(task.created_at.as_deref(), Some("2024-03-01T10:15:00.000Z"));
    }

    #[test]
    fn stored_rows_require_an_id() {
        let err = serde_json::from_str::<StoredTask>(r#"{"title":"A","description":"d"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("missing field `id`"), "{err}");

        let row: StoredTask =
            serde_json::from_str(r#"{"id":3,"title":"A","description":"d"}"#).unwrap();
        let task = Task::from(row);
        assert_eq!(task.id, Some(3));
        assert!(!task.completed);
        assert!(task.created_at.is_none());
    }

    #[test]
    fn completed_defaults_to_false() {
        let task: Task = serde_json::from_str(r#"{"id":2,"title":"t","description":"d"}"#).unwrap();
        assert!(!task.completed);
        assert_eq!(task.completed_label(), "False");
    }

    #[test]
    fn payload_drops_id_and_timestamps() {
        let task = Task {
            id: Some(5),
            title: "Buy milk".to_owned(),
            description: "2%".to_owned(),
            completed: true,
            created_at: Some("2024-01-01T00:00:00Z".to_owned()),
            updated_at: None,
        };
        let value = serde_json::to_value(task.payload()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"title": "Buy milk", "description": "2%", "completed": true})
        );
    }

    #[test]
    fn timestamps_render_for_humans() {
        assert_eq!(
            display_timestamp(Some("2024-03-01T10:15:00.000Z")),
            "2024-03-01 10:15"
        );
        assert_eq!(display_timestamp(Some("yesterday")), "yesterday");
        assert_eq!(display_timestamp(None), "-");
        assert_eq!(display_timestamp(Some("  ")), "-");
    }
}
