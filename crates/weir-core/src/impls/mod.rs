//! Development implementations of the ports.
//!
//! - [`IdentityWorker`]: default work mapper (echoes params).
//! - [`NoopEventSink`]: default sink, drops everything.
//! - [`ChannelEventSink`]: unbounded-channel sink for tests and demos.
//!
//! Production applications supply their own [`crate::ports::Worker`] and
//! [`crate::ports::EventSink`] implementations.

pub mod channel_sink;
pub mod identity;
pub mod noop_sink;

pub use channel_sink::ChannelEventSink;
pub use identity::IdentityWorker;
pub use noop_sink::NoopEventSink;
