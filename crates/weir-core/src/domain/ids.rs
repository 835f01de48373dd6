//! Strongly-typed identifiers.
//!
//! ULID-backed, so ids sort by creation time and can be generated without
//! coordination. A phantom marker type keeps the id families distinct at
//! compile time while sharing one implementation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for an id family.
///
/// Provides the prefix used by Display (e.g. "task-", "group-").
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic id type.
///
/// The marker is PhantomData: it costs nothing at runtime but makes it a
/// compile error to pass a `GroupId` where a `TaskId` is expected.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// Mint a fresh id.
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker type for task ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Marker type for group ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {}

impl IdMarker for Group {
    fn prefix() -> &'static str {
        "group-"
    }
}

/// Identifier of a Task (one submitted unit of work).
pub type TaskId = Id<Task>;

/// Identifier of a Group (fan-in barrier over a batch of tasks).
pub type GroupId = Id<Group>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let task = TaskId::generate();
        let group = GroupId::generate();

        assert!(task.to_string().starts_with("task-"));
        assert!(group.to_string().starts_with("group-"));

        // The whole point: you can't accidentally mix these types.
        // (Compile-time property, kept as a comment.)
        // let _: TaskId = group; // <- does not compile
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let id1 = TaskId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = TaskId::generate();

        assert!(id1 < id2);
    }

    #[test]
    fn ids_serialize_as_plain_ulid_strings() {
        let id = TaskId::from_ulid(Ulid::from_string("01ARZ3NDEKTSV4RRFFQ69G5FAV").unwrap());

        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, "\"01ARZ3NDEKTSV4RRFFQ69G5FAV\"");

        let back: TaskId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn phantom_marker_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<TaskId>(), size_of::<Ulid>());
        assert_eq!(size_of::<GroupId>(), size_of::<Ulid>());
    }
}
