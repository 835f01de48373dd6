//! EventSink port: where queue events are delivered.

use crate::domain::QueueEvent;

/// Delivery target for [`QueueEvent`]s.
///
/// The core only needs `emit`; subscription and fan-out mechanics live
/// outside it. `emit` is called from scheduler context right after internal
/// bookkeeping (never while the state lock is held), so implementations may
/// call back into the queue, but must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: QueueEvent);
}
