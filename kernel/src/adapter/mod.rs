// Adapter Contract
//
// Capabilities a system must expose to take part in a run, either as
// the source or as the destination. Concrete adapters (databases,
// search indexes, files) live outside the core.
//
// This module defines *interfaces only*.

use serde::{Deserialize, Serialize};

/// Identifier of an object, unique per type on each side.
///
/// Source and destination objects are matched by equal IDs only.
pub type ObjectId = i64;

/// Classification attached to each entry of a change queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    New,
    Update,
    Delete,
}

impl Status {
    /// Decode the numeric status used by change-queue tables.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Status::New),
            2 => Some(Status::Update),
            3 => Some(Status::Delete),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Status::New => 1,
            Status::Update => 2,
            Status::Delete => 3,
        }
    }
}

/// A system that can yield its objects of one type, ordered by ID.
///
/// Implementations MUST:
/// - yield objects in strictly ascending ID order
/// - keep an object's ID stable for the duration of a run
/// - fail fast on I/O problems (the core never retries)
pub trait Adapter {
    type Object;

    type Error: std::error::Error + Send + Sync + 'static;

    /// Pull-based sequence over the objects of one type.
    type Cursor: Iterator<Item = Result<Self::Object, Self::Error>>;

    /// Open a sequence over all `object_type` objects, ascending by ID.
    ///
    /// With `change_queue` set, only objects that changed are yielded,
    /// each carrying a [`Status`] (see [`IndexableAdapter`]).
    fn objects_ordered_by_id(
        &mut self,
        object_type: &str,
        change_queue: bool,
    ) -> Result<Self::Cursor, Self::Error>;

    fn id_of(&self, object: &Self::Object) -> ObjectId;
}

/// A source that reports change-queue entries with a status.
pub trait IndexableAdapter: Adapter {
    fn status_of(&self, object: &Self::Object) -> Status;
}

/// The side that receives writes.
pub trait Destination: Adapter {
    /// Create a new (or placeholder) object for `id`.
    fn create_object(&mut self, id: ObjectId, object_type: &str)
        -> Result<Self::Object, Self::Error>;

    fn delete(&mut self, object: Self::Object) -> Result<(), Self::Error>;

    /// Hook invoked with every object a mapping function reported as changed.
    fn updated(&mut self, object: Self::Object) -> Result<(), Self::Error>;

    /// Invoked exactly once per successful run, after all objects were processed.
    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Capability: convert read-only query results into writable objects.
    fn as_updateable(
        &mut self,
    ) -> Option<&mut dyn UpdateableObjectProvider<Self::Object, Self::Error>> {
        None
    }

    /// Capability: per-object progress notification.
    fn as_progress_listener(&mut self) -> Option<&mut dyn ProgressListener> {
        None
    }
}

/// Optional destination capability for systems whose queries return
/// read-only objects.
pub trait UpdateableObjectProvider<T, E> {
    /// Produce the object handed to the mapping function in place of `object`.
    fn prepare_update(&mut self, object: T) -> Result<T, E>;
}

/// Optional destination capability, notified after every processed object.
pub trait ProgressListener {
    fn after_object_processed(&mut self);
}
