//! Worker port: the caller-supplied executor for task work.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::queue::Completion;

/// Outcome a worker reports through its [`Completion`] handle.
pub type WorkResult = Result<Value, String>;

/// A unit-of-work executor.
///
/// The scheduler dispatches a task by spawning `run` onto the runtime and
/// never awaits it directly; the worker reports back through `done`, which
/// must eventually be resolved exactly once.
///
/// Workers are untrusted: extra resolutions are discarded, and dropping
/// every clone of `done` without resolving reports the task as failed.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Process `params`, reporting the outcome through `done`.
    ///
    /// `meta` is the batch-level side channel, shared read-only by every
    /// task submitted in the same call.
    async fn run(&self, params: Arc<Value>, done: Completion, meta: Option<Arc<Value>>);
}
