//! Queue lifecycle events.

use serde::{Deserialize, Serialize};

use super::task::TaskReport;

/// Events emitted by the queue as backlog pressure changes.
///
/// Each signal is edge-triggered: it fires on crossing its threshold and
/// fires again only after the backlog has crossed back in the other
/// direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum QueueEvent {
    /// Backlog length reached the flood threshold after a submission.
    Flooded,

    /// Backlog length fell below the drain threshold after a dispatch.
    Drained,

    /// Backlog empty and nothing running: carries the accumulated results.
    Flushed(Vec<TaskReport>),
}
