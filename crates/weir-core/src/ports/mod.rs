//! Ports: the seams the scheduler core depends on.
//!
//! Concrete implementations live in [`crate::impls`] (development pair) or
//! in the embedding application.

pub mod event_sink;
pub mod worker;

pub use event_sink::EventSink;
pub use worker::{WorkResult, Worker};
