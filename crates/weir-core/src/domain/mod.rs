//! Domain model (ids, task states, groups, events).

pub mod events;
pub mod group;
pub mod ids;
pub mod task;

pub use events::QueueEvent;
pub use group::{Group, GroupCallback, GroupStatus};
pub use ids::{GroupId, TaskId};
pub use task::{TaskCallback, TaskReport, TaskState};
