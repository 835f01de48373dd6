//! Task state machine and the terminal projection of a task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::TaskId;

/// Task state.
///
/// State transitions:
/// - Queued -> Running -> Complete
/// - Queued -> Running -> Error
///
/// Terminal states are final: a task never leaves Complete or Error, even
/// when a worker resolves its completion handle more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting in the backlog.
    Queued,

    /// Dispatched; the worker has not yet reported back.
    Running,

    /// Worker reported success.
    Complete,

    /// Worker reported failure (or dropped its completion handle).
    Error,
}

impl TaskState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Complete | TaskState::Error)
    }
}

/// Task-local result callback (buffer-mode submissions).
pub type TaskCallback = Box<dyn FnOnce(Result<Value, String>) + Send + 'static>;

/// Terminal projection of a task: what result sinks, group payloads, and the
/// `Flushed` event carry.
///
/// Exactly one of `result` / `error` is set, matching `state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub id: TaskId,
    pub state: TaskState,

    /// The caller's submission params, untouched.
    pub params: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub enqueued_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::queued(TaskState::Queued, false)]
    #[case::running(TaskState::Running, false)]
    #[case::complete(TaskState::Complete, true)]
    #[case::error(TaskState::Error, true)]
    fn terminal_states(#[case] state: TaskState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }

    #[test]
    fn state_serializes_as_snake_case() {
        let s = serde_json::to_string(&TaskState::Complete).unwrap();
        assert_eq!(s, "\"complete\"");
    }

    #[test]
    fn report_omits_absent_fields() {
        let now = Utc::now();
        let report = TaskReport {
            id: TaskId::generate(),
            state: TaskState::Error,
            params: serde_json::json!({"a": 1}),
            result: None,
            error: Some("boom".to_string()),
            enqueued_at: now,
            finished_at: now,
        };

        let v: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert!(v.get("result").is_none());
        assert_eq!(v["error"], "boom");
        assert_eq!(v["state"], "error");
    }
}
