//! weir-core
//!
//! Bounded-concurrency task queue with flood/drain backpressure: callers
//! push units of work, at most `concurrency` run at once, and the queue
//! signals as the backlog rises past the flood threshold or falls back
//! below the drain threshold.
//!
//! # Module map
//! - **domain**: task and group model (ids, states, reports, events)
//! - **ports**: the seams the core depends on (Worker, EventSink)
//! - **impls**: development implementations (IdentityWorker, event sinks)
//! - **queue**: the queue facade, options/builder, and the dispatch loop
//! - **observability**: status views
//!
//! ```ignore
//! let (sink, mut events) = ChannelEventSink::unbounded();
//! let queue = Queue::builder()
//!     .concurrency(4)
//!     .worker(Arc::new(MyWorker))
//!     .event_sink(Arc::new(sink))
//!     .build()?;
//!
//! queue.push(serde_json::json!({"a": 2, "b": 5}));
//! ```

pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use domain::{Group, GroupId, GroupStatus, QueueEvent, TaskId, TaskReport, TaskState};
pub use impls::{ChannelEventSink, IdentityWorker, NoopEventSink};
pub use observability::QueueCounts;
pub use ports::{EventSink, WorkResult, Worker};
pub use queue::{Batch, BuildError, Completion, Queue, QueueBuilder, QueueOptions};
