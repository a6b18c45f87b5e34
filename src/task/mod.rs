#![forbid(unsafe_code)]

pub mod controller;
pub mod model;

use crate::task::model::Task;

/// Write intents raised by the view layer.
///
/// Every call returns immediately; the outcome is only observable through the
/// next refresh of the task list.
pub trait TaskOperations {
    fn create(&self, task: Task);
    fn update(&self, task: Task);
    fn delete(&self, id: Option<u64>);
}
