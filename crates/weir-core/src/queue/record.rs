//! Task record: one backlog entry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::group::Group;
use crate::domain::ids::TaskId;
use crate::domain::task::{TaskCallback, TaskReport, TaskState};
use crate::ports::Worker;

/// Back-reference from a pending task to its group.
///
/// The group holds member *reports*, never pending records, so there is no
/// ownership cycle; `index` is the member's position in submission order.
pub(crate) struct GroupSlot {
    pub(crate) group: Arc<Group>,
    pub(crate) index: usize,
}

/// A queued unit of work.
///
/// Design:
/// - `params` are opaque caller data; the scheduler never looks inside.
/// - `worker` is resolved at enqueue time (per-task override or the queue
///   default) and fixed thereafter.
/// - The record sits in the backlog until dispatch and is then owned by the
///   completion shim; it is never shared.
pub(crate) struct TaskRecord {
    pub(crate) id: TaskId,
    pub(crate) params: Arc<Value>,
    pub(crate) meta: Option<Arc<Value>>,
    pub(crate) worker: Arc<dyn Worker>,
    pub(crate) callback: Option<TaskCallback>,
    pub(crate) group: Option<GroupSlot>,
    pub(crate) state: TaskState,
    pub(crate) enqueued_at: DateTime<Utc>,
}

impl TaskRecord {
    pub(crate) fn new(params: Arc<Value>, meta: Option<Arc<Value>>, worker: Arc<dyn Worker>) -> Self {
        Self {
            id: TaskId::generate(),
            params,
            meta,
            worker,
            callback: None,
            group: None,
            state: TaskState::Queued,
            enqueued_at: Utc::now(),
        }
    }

    /// Consume the record into its terminal projection.
    pub(crate) fn into_report(self, outcome: Result<Value, String>) -> TaskReport {
        let (state, result, error) = match outcome {
            Ok(value) => (TaskState::Complete, Some(value), None),
            Err(message) => (TaskState::Error, None, Some(message)),
        };
        TaskReport {
            id: self.id,
            state,
            params: Arc::unwrap_or_clone(self.params),
            result,
            error,
            enqueued_at: self.enqueued_at,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::IdentityWorker;
    use serde_json::json;

    fn record(params: Value) -> TaskRecord {
        TaskRecord::new(Arc::new(params), None, Arc::new(IdentityWorker))
    }

    #[test]
    fn new_record_starts_queued() {
        let r = record(json!(1));
        assert_eq!(r.state, TaskState::Queued);
        assert!(r.callback.is_none());
        assert!(r.group.is_none());
    }

    #[test]
    fn report_carries_result_on_success() {
        let r = record(json!({"a": 1}));
        let report = r.into_report(Ok(json!({"sum": 3})));

        assert_eq!(report.state, TaskState::Complete);
        assert_eq!(report.params, json!({"a": 1}));
        assert_eq!(report.result, Some(json!({"sum": 3})));
        assert!(report.error.is_none());
    }

    #[test]
    fn report_carries_error_on_failure() {
        let r = record(json!(1));
        let report = r.into_report(Err("boom".to_string()));

        assert_eq!(report.state, TaskState::Error);
        assert!(report.result.is_none());
        assert_eq!(report.error.as_deref(), Some("boom"));
    }
}
