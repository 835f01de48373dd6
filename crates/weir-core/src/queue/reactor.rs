//! Dispatch loop and completion shim.
//!
//! The loop is the only code that pops the backlog and raises `running`; the
//! shim is the only code that lowers it. The loop is idempotent, so every
//! trigger (submission, completion, resume) calls it unconditionally: each
//! invocation re-checks the saturation guard, spawns until the concurrency
//! ceiling is reached, and each completion backfills exactly the slot it
//! freed.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::events::QueueEvent;
use crate::domain::ids::TaskId;
use crate::domain::task::TaskState;
use crate::ports::WorkResult;

use super::QueueCore;
use super::record::TaskRecord;
use super::state::QueueState;

/// Run the dispatch loop until saturated, paused, or out of work.
///
/// The caller holds the state lock. Events raised here go into `events` and
/// must be delivered after the lock is released.
pub(crate) fn dispatch(core: &Arc<QueueCore>, state: &mut QueueState, events: &mut Vec<QueueEvent>) {
    loop {
        if state.running >= core.options.concurrency {
            return; // saturated
        }
        if state.paused {
            return;
        }
        let Some(mut record) = state.backlog.pop_front() else {
            // Nothing queued. If nothing is running either, this trigger was
            // the last outstanding piece of work: flush.
            if state.running == 0 && core.options.flushable {
                let results = state.take_results(core.options.cleanup);
                events.push(QueueEvent::Flushed(results));
            }
            return;
        };

        state.running += 1;
        record.state = TaskState::Running;
        state.note_drain(&core.options, events);
        spawn_worker(core, record);
        // Loop again: saturate the ceiling before returning.
    }
}

fn spawn_worker(core: &Arc<QueueCore>, record: TaskRecord) {
    let task_id = record.id;
    let worker = Arc::clone(&record.worker);
    let params = Arc::clone(&record.params);
    let meta = record.meta.clone();
    debug!(task = %task_id, state = ?record.state, "dispatch");
    let done = Completion::new(Arc::clone(core), record);
    tokio::spawn(async move {
        worker.run(params, done, meta).await;
    });
}

/// Completion handle passed to every dispatched worker.
///
/// Clonable, so a worker may hand it to whatever actually finishes the job.
/// Only the first resolution counts; later calls are logged and dropped.
/// If every clone is dropped unresolved (the worker returned early or
/// panicked), the task is failed on the worker's behalf.
#[derive(Clone)]
pub struct Completion {
    shared: Arc<CompletionShared>,
}

struct CompletionShared {
    core: Arc<QueueCore>,
    task_id: TaskId,
    cell: Mutex<Option<TaskRecord>>,
}

impl Completion {
    pub(crate) fn new(core: Arc<QueueCore>, record: TaskRecord) -> Self {
        Self {
            shared: Arc::new(CompletionShared {
                core,
                task_id: record.id,
                cell: Mutex::new(Some(record)),
            }),
        }
    }

    /// Report success.
    pub fn complete(&self, result: Value) {
        self.resolve(Ok(result));
    }

    /// Report failure.
    pub fn fail(&self, error: impl Into<String>) {
        self.resolve(Err(error.into()));
    }

    /// Report the outcome. Only the first call on any clone has an effect.
    pub fn resolve(&self, outcome: WorkResult) {
        let record = self.shared.cell.lock().unwrap().take();
        match record {
            Some(record) => finish(&self.shared.core, record, outcome),
            None => warn!(task = %self.shared.task_id, "completion resolved more than once; ignoring"),
        }
    }
}

impl Drop for CompletionShared {
    fn drop(&mut self) {
        let record = match self.cell.get_mut() {
            Ok(cell) => cell.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(record) = record {
            warn!(task = %self.task_id, "worker dropped completion without resolving");
            finish(
                &self.core,
                record,
                Err("worker dropped completion without resolving".to_string()),
            );
        }
    }
}

/// Terminal bookkeeping for one task.
///
/// Under the state lock: lower `running`, route the report to exactly one
/// sink (group, then global collection, then discard), and backfill the
/// freed slot. Callbacks are spawned only after the lock is released, so
/// scheduler bookkeeping always finishes before anything external observes
/// the completion.
fn finish(core: &Arc<QueueCore>, mut record: TaskRecord, outcome: WorkResult) {
    let callback = record
        .callback
        .take()
        .map(|callback| (callback, outcome.clone()));
    let group = record.group.take();
    let report = record.into_report(outcome);
    debug!(task = %report.id, state = ?report.state, "task finished");

    let mut events = Vec::new();
    let notify = {
        let mut state = core.state.lock().unwrap();
        state.running -= 1;

        let notify = match group {
            Some(slot) => Some((slot, report)),
            None => {
                if core.options.collect {
                    state.results.push(report);
                }
                None
            }
        };

        dispatch(core, &mut state, &mut events);
        notify
    };

    core.deliver(events);
    if let Some((slot, report)) = notify {
        slot.group.notify(slot.index, report);
    }
    if let Some((callback, outcome)) = callback {
        tokio::spawn(async move { callback(outcome) });
    }
}
