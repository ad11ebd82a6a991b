// Content Mapping Kernel
//
// Reconciles the objects of a destination system with those of an
// authoritative source system, either by full synchronization or from
// a change queue.

pub mod adapter;
pub mod adapters;
pub mod indexer;
pub mod mapper;
pub mod synchronizer;
pub mod worker;

#[cfg(test)]
mod testing;

/// Boxed error as carried by [`worker::WorkerError`] and [`mapper::MapError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub use adapter::{
    Adapter, Destination, IndexableAdapter, ObjectId, ProgressListener, Status,
    UpdateableObjectProvider,
};
pub use indexer::Indexer;
pub use mapper::{MapError, MappingResult};
pub use synchronizer::Synchronizer;
pub use worker::{RunLog, WorkerConfig, WorkerError};
