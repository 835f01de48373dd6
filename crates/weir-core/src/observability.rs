//! Status views.

use serde::{Deserialize, Serialize};

/// Point-in-time occupancy snapshot of a queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Tasks waiting in the backlog.
    pub queued: usize,
    /// Tasks between dispatch and completion.
    pub running: usize,
    /// Completed ungrouped tasks retained in the result sink.
    pub collected: usize,
}
