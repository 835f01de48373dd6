//! Group: fan-in barrier over a fixed batch of tasks.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::ids::GroupId;
use super::task::TaskReport;

/// Callback fired once every member of a group has reached a terminal state.
pub type GroupCallback = Box<dyn FnOnce(Vec<TaskReport>) + Send + 'static>;

/// Fan-in barrier over a fixed set of tasks submitted in one call.
///
/// Design:
/// - Member slots are indexed by submission order; the order members finish
///   in does not matter.
/// - The callback fires exactly once, when the last member lands, and is
///   spawned onto the runtime rather than run inside that member's own
///   completion stack.
/// - After the callback fires the scheduler holds no further reference; the
///   group is inert and only reports its final counters.
pub struct Group {
    id: GroupId,
    size: usize,
    inner: Mutex<GroupInner>,
}

struct GroupInner {
    slots: Vec<Option<TaskReport>>,
    completed: usize,
    callback: Option<GroupCallback>,
}

impl Group {
    pub(crate) fn new(size: usize, callback: GroupCallback) -> Self {
        Self {
            id: GroupId::generate(),
            size,
            inner: Mutex::new(GroupInner {
                slots: (0..size).map(|_| None).collect(),
                completed: 0,
                callback: Some(callback),
            }),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Number of member tasks, fixed at submission.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Members that have reached a terminal state so far.
    pub fn completed(&self) -> usize {
        self.inner.lock().unwrap().completed
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == self.size
    }

    /// Serializable snapshot of the group's progress.
    pub fn status(&self) -> GroupStatus {
        let completed = self.completed();
        GroupStatus {
            id: self.id,
            size: self.size,
            completed,
            complete: completed == self.size,
        }
    }

    /// Record one member's terminal report.
    ///
    /// Invariant: `completed <= size`. Each member resolves exactly once (the
    /// completion shim guarantees this) and fills a distinct slot, so the
    /// callback fires on exactly one call, with every slot populated.
    pub(crate) fn notify(&self, index: usize, report: TaskReport) {
        let fired = {
            let mut inner = self.inner.lock().unwrap();
            debug_assert!(inner.slots[index].is_none(), "group slot filled twice");
            inner.slots[index] = Some(report);
            inner.completed += 1;

            if inner.completed == self.size {
                let results: Vec<TaskReport> = inner
                    .slots
                    .iter_mut()
                    .map(|slot| slot.take().expect("all slots filled at completion"))
                    .collect();
                inner.callback.take().map(|callback| (callback, results))
            } else {
                None
            }
        };

        if let Some((callback, results)) = fired {
            tokio::spawn(async move { callback(results) });
        }
    }

    /// Groups created from an empty batch have nothing to wait for; fire the
    /// callback immediately (still via the runtime, never inline).
    pub(crate) fn fire_if_empty(&self) {
        if self.size > 0 {
            return;
        }
        let callback = self.inner.lock().unwrap().callback.take();
        if let Some(callback) = callback {
            tokio::spawn(async move { callback(Vec::new()) });
        }
    }
}

/// Serializable view of a group's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStatus {
    pub id: GroupId,
    pub size: usize,
    pub completed: usize,
    pub complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::TaskId;
    use crate::domain::task::TaskState;
    use chrono::Utc;
    use tokio::sync::oneshot;

    fn report(tag: u64) -> TaskReport {
        let now = Utc::now();
        TaskReport {
            id: TaskId::generate(),
            state: TaskState::Complete,
            params: serde_json::json!({ "tag": tag }),
            result: Some(serde_json::json!({ "tag": tag })),
            error: None,
            enqueued_at: now,
            finished_at: now,
        }
    }

    #[tokio::test]
    async fn callback_fires_once_after_last_member() {
        let (tx, rx) = oneshot::channel();
        let group = Group::new(
            3,
            Box::new(move |results| {
                let _ = tx.send(results);
            }),
        );

        // Completion order deliberately differs from submission order.
        group.notify(2, report(2));
        group.notify(0, report(0));
        assert!(!group.is_complete());
        group.notify(1, report(1));

        let results = rx.await.unwrap();
        assert_eq!(results.len(), 3);
        // Payload is in submission order, not completion order.
        for (index, r) in results.iter().enumerate() {
            assert_eq!(r.params["tag"], index as u64);
        }
        assert!(group.is_complete());
        assert_eq!(group.completed(), 3);
    }

    #[tokio::test]
    async fn empty_group_fires_immediately() {
        let (tx, rx) = oneshot::channel();
        let group = Group::new(
            0,
            Box::new(move |results| {
                let _ = tx.send(results);
            }),
        );
        group.fire_if_empty();

        let results = rx.await.unwrap();
        assert!(results.is_empty());
        assert!(group.is_complete());
    }

    #[tokio::test]
    async fn status_reflects_progress() {
        let group = Group::new(2, Box::new(|_| {}));
        group.notify(0, report(0));

        let status = group.status();
        assert_eq!(status.size, 2);
        assert_eq!(status.completed, 1);
        assert!(!status.complete);
    }
}
