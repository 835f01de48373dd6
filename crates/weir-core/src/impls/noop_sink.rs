//! No-op event sink.

use crate::domain::QueueEvent;
use crate::ports::EventSink;

/// Drops every event. The default when no sink is configured.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: QueueEvent) {}
}
