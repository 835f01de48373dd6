//! Queue construction: options and fail-fast validation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::impls::{IdentityWorker, NoopEventSink};
use crate::ports::{EventSink, Worker};

use super::Queue;

/// Tunables, fixed once the queue is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueOptions {
    /// Start without dispatching; call [`Queue::resume`] to begin.
    pub paused: bool,

    /// Emit `Flushed` when the queue goes idle.
    pub flushable: bool,

    /// Retain completed ungrouped tasks in the result sink.
    pub collect: bool,

    /// Clear the result sink after each `Flushed` emission.
    pub cleanup: bool,

    /// Maximum simultaneously running tasks. Must be at least 1.
    pub concurrency: usize,

    /// Backlog length at/above which `Flooded` fires.
    pub flood: usize,

    /// Backlog length below which `Drained` fires.
    pub drain: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            paused: false,
            flushable: true,
            collect: true,
            cleanup: true,
            concurrency: 1,
            flood: 256,
            drain: 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Builder for [`Queue`].
///
/// Invalid configuration is rejected at `build` time rather than silently
/// clamped, so a queue that exists is a queue that can make progress.
pub struct QueueBuilder {
    options: QueueOptions,
    worker: Arc<dyn Worker>,
    events: Arc<dyn EventSink>,
}

impl QueueBuilder {
    pub(crate) fn new() -> Self {
        Self {
            options: QueueOptions::default(),
            worker: Arc::new(IdentityWorker),
            events: Arc::new(NoopEventSink),
        }
    }

    /// Replace the whole option set (e.g. one deserialized from config).
    pub fn options(mut self, options: QueueOptions) -> Self {
        self.options = options;
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.options.paused = paused;
        self
    }

    pub fn flushable(mut self, flushable: bool) -> Self {
        self.options.flushable = flushable;
        self
    }

    pub fn collect(mut self, collect: bool) -> Self {
        self.options.collect = collect;
        self
    }

    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.options.cleanup = cleanup;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.options.concurrency = concurrency;
        self
    }

    pub fn flood(mut self, flood: usize) -> Self {
        self.options.flood = flood;
        self
    }

    pub fn drain(mut self, drain: usize) -> Self {
        self.options.drain = drain;
        self
    }

    /// Default worker used when a submission carries no override.
    pub fn worker(mut self, worker: Arc<dyn Worker>) -> Self {
        self.worker = worker;
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn build(self) -> Result<Queue, BuildError> {
        if self.options.concurrency == 0 {
            return Err(BuildError::ZeroConcurrency);
        }
        Ok(Queue::from_parts(self.options, self.worker, self.events))
    }
}
