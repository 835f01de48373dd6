//! Queue facade: submission, control, and configuration surface.

mod builder;
mod reactor;
mod record;
mod state;

pub use builder::{BuildError, QueueBuilder, QueueOptions};
pub use reactor::Completion;

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use crate::domain::group::Group;
use crate::domain::task::TaskReport;
use crate::impls::{IdentityWorker, NoopEventSink};
use crate::observability::QueueCounts;
use crate::ports::{EventSink, Worker};

use record::{GroupSlot, TaskRecord};
use state::QueueState;

/// Bounded-concurrency task queue with flood/drain backpressure.
///
/// At most `concurrency` tasks run at once; the rest wait in a FIFO backlog.
/// Submission never blocks and is never rejected: the flood threshold is
/// advisory backpressure, reported through the push return value and the
/// `Flooded` event. Callers that ignore both may queue without bound.
///
/// A `Queue` is a cheap handle; clones share one scheduler. Workers and
/// callbacks are spawned onto the ambient Tokio runtime, so the queue must
/// be used from within one.
#[derive(Clone)]
pub struct Queue {
    core: Arc<QueueCore>,
}

/// Shared scheduler internals: immutable configuration plus the single
/// mutex-guarded state object. No two queues share one of these.
pub(crate) struct QueueCore {
    pub(crate) options: QueueOptions,
    pub(crate) default_worker: Arc<dyn Worker>,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) state: Mutex<QueueState>,
}

impl QueueCore {
    /// Deliver events accumulated during a locked section. Called only with
    /// the state lock released, so sink handlers may re-enter the queue.
    pub(crate) fn deliver(&self, events: Vec<crate::domain::QueueEvent>) {
        for event in events {
            self.events.emit(event);
        }
    }
}

/// One submission: items plus the batch-level side channel and an optional
/// worker override shared by every item in the call.
pub struct Batch {
    pub items: Vec<Value>,
    pub meta: Option<Value>,
    pub worker: Option<Arc<dyn Worker>>,
}

impl Batch {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            meta: None,
            worker: None,
        }
    }

    pub fn single(item: Value) -> Self {
        Self::new(vec![item])
    }

    /// Attach the side channel handed read-only to every worker in the call.
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Run every item of this call under `worker` instead of the queue
    /// default.
    pub fn with_worker(mut self, worker: Arc<dyn Worker>) -> Self {
        self.worker = Some(worker);
        self
    }
}

impl From<Value> for Batch {
    fn from(item: Value) -> Self {
        Self::single(item)
    }
}

impl From<Vec<Value>> for Batch {
    fn from(items: Vec<Value>) -> Self {
        Self::new(items)
    }
}

impl Queue {
    /// All-defaults queue: identity worker, events dropped.
    pub fn new() -> Self {
        Self::from_parts(
            QueueOptions::default(),
            Arc::new(IdentityWorker),
            Arc::new(NoopEventSink),
        )
    }

    pub fn builder() -> QueueBuilder {
        QueueBuilder::new()
    }

    pub(crate) fn from_parts(
        options: QueueOptions,
        default_worker: Arc<dyn Worker>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let paused = options.paused;
        Self {
            core: Arc::new(QueueCore {
                options,
                default_worker,
                events,
                state: Mutex::new(QueueState::new(paused)),
            }),
        }
    }

    /// Batch mode: enqueue work whose results aggregate in the result sink
    /// and surface through the `Flushed` event.
    ///
    /// Returns `true` while the post-submission backlog is below the flood
    /// threshold, `false` once it is at/above it.
    pub fn push(&self, batch: impl Into<Batch>) -> bool {
        let Batch {
            items,
            meta,
            worker,
        } = batch.into();
        let records = self.records(items, meta, worker, None);
        self.submit(records)
    }

    /// Batch mode with a fan-in callback: once the last member reaches a
    /// terminal state, `on_complete` is spawned with every member's report
    /// in submission order. Group members bypass the global result sink.
    ///
    /// An empty batch completes immediately with an empty payload.
    pub fn push_group<F>(&self, batch: impl Into<Batch>, on_complete: F) -> Arc<Group>
    where
        F: FnOnce(Vec<TaskReport>) + Send + 'static,
    {
        let Batch {
            items,
            meta,
            worker,
        } = batch.into();
        let group = Arc::new(Group::new(items.len(), Box::new(on_complete)));
        let records = self.records(items, meta, worker, Some(&group));
        group.fire_if_empty();
        self.submit(records);
        group
    }

    /// Buffer mode: enqueue one task and hand its outcome to a task-local
    /// callback. The task still flows through the normal collection sink;
    /// the callback is an independent delivery channel.
    pub fn buffer<F>(&self, params: Value, on_result: F) -> bool
    where
        F: FnOnce(Result<Value, String>) + Send + 'static,
    {
        self.buffer_with(params, None, None, on_result)
    }

    /// Buffer mode with a side channel and a worker override.
    pub fn buffer_with<F>(
        &self,
        params: Value,
        meta: Option<Value>,
        worker: Option<Arc<dyn Worker>>,
        on_result: F,
    ) -> bool
    where
        F: FnOnce(Result<Value, String>) + Send + 'static,
    {
        let worker = worker.unwrap_or_else(|| Arc::clone(&self.core.default_worker));
        let mut record = TaskRecord::new(Arc::new(params), meta.map(Arc::new), worker);
        record.callback = Some(Box::new(on_result));
        self.submit(vec![record])
    }

    /// Flush probe: when the queue is idle (empty backlog, nothing running,
    /// not paused), emit `Flushed` with the accumulated results and return
    /// `true`. Otherwise do nothing and return `false`.
    pub fn flush(&self) -> bool {
        if !self.core.options.flushable {
            return false;
        }
        let mut events = Vec::new();
        let flushed = {
            let mut state = self.core.state.lock().unwrap();
            if state.is_idle() && !state.paused {
                let results = state.take_results(self.core.options.cleanup);
                events.push(crate::domain::QueueEvent::Flushed(results));
                true
            } else {
                false
            }
        };
        self.core.deliver(events);
        flushed
    }

    /// Stop popping new tasks. Running tasks continue to completion.
    pub fn pause(&self) {
        self.core.state.lock().unwrap().paused = true;
    }

    /// Restart dispatch.
    pub fn resume(&self) {
        let mut events = Vec::new();
        {
            let mut state = self.core.state.lock().unwrap();
            state.paused = false;
            reactor::dispatch(&self.core, &mut state, &mut events);
        }
        self.core.deliver(events);
    }

    /// Drop the retained results. Backlog and running tasks are untouched.
    pub fn clear(&self) {
        self.core.state.lock().unwrap().results.clear();
    }

    /// Occupancy snapshot.
    pub fn counts(&self) -> QueueCounts {
        let state = self.core.state.lock().unwrap();
        QueueCounts {
            queued: state.backlog.len(),
            running: state.running,
            collected: state.results.len(),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.core.state.lock().unwrap().paused
    }

    /// Whether the backlog has reached the flood threshold and not yet
    /// drained back down.
    pub fn is_flooded(&self) -> bool {
        self.core.state.lock().unwrap().flooded
    }

    pub fn options(&self) -> &QueueOptions {
        &self.core.options
    }

    fn records(
        &self,
        items: Vec<Value>,
        meta: Option<Value>,
        worker: Option<Arc<dyn Worker>>,
        group: Option<&Arc<Group>>,
    ) -> Vec<TaskRecord> {
        let meta = meta.map(Arc::new);
        let worker = worker.unwrap_or_else(|| Arc::clone(&self.core.default_worker));
        items
            .into_iter()
            .enumerate()
            .map(|(index, params)| {
                let mut record = TaskRecord::new(Arc::new(params), meta.clone(), Arc::clone(&worker));
                if let Some(group) = group {
                    record.group = Some(GroupSlot {
                        group: Arc::clone(group),
                        index,
                    });
                }
                record
            })
            .collect()
    }

    fn submit(&self, records: Vec<TaskRecord>) -> bool {
        let count = records.len();
        let mut events = Vec::new();
        let admitted = {
            let mut state = self.core.state.lock().unwrap();
            let admitted = state.admit(records, &self.core.options, &mut events);
            debug!(enqueued = count, backlog = state.backlog.len(), "submit");
            reactor::dispatch(&self.core, &mut state, &mut events);
            admitted
        };
        self.core.deliver(events);
        admitted
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.core.state.lock().unwrap();
        f.debug_struct("Queue")
            .field("queued", &state.backlog.len())
            .field("running", &state.running)
            .field("paused", &state.paused)
            .field("flooded", &state.flooded)
            .field("collected", &state.results.len())
            .finish()
    }
}
