//! Channel-backed event sink for development and tests.

use tokio::sync::mpsc;

use crate::domain::QueueEvent;
use crate::ports::EventSink;

/// Forwards queue events into an unbounded channel.
///
/// The receiving half is returned from [`ChannelEventSink::unbounded`]; wire
/// it to whatever subscription mechanism the application uses.
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<QueueEvent>,
}

impl ChannelEventSink {
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<QueueEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: QueueEvent) {
        // Send fails only when the receiver is gone; nobody is listening.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_events_in_order() {
        let (sink, mut rx) = ChannelEventSink::unbounded();
        sink.emit(QueueEvent::Flooded);
        sink.emit(QueueEvent::Drained);

        assert!(matches!(rx.recv().await, Some(QueueEvent::Flooded)));
        assert!(matches!(rx.recv().await, Some(QueueEvent::Drained)));
    }

    #[tokio::test]
    async fn emit_without_receiver_is_silent() {
        let (sink, rx) = ChannelEventSink::unbounded();
        drop(rx);
        sink.emit(QueueEvent::Flooded);
    }
}
