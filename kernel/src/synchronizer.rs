// Full Synchronization
//
// Reconciles the complete destination sequence with the complete source
// sequence by a sorted merge-join on object IDs:
// source ∖ destination → insert, destination ∖ source → delete,
// both → update.

use std::cmp::Ordering;

use crate::adapter::{Adapter, Destination};
use crate::mapper::{MapError, MappingResult};
use crate::worker::{QueueWorker, RunKind, RunLog, WorkerConfig, WorkerError};

/// Synchronizes the objects of one type from a source into a destination.
#[derive(Debug)]
pub struct Synchronizer<S, D> {
    worker: QueueWorker<S, D>,
}

impl<S, D> Synchronizer<S, D>
where
    S: Adapter,
    D: Destination,
{
    pub fn new(source: S, destination: D) -> Self {
        Self::with_config(source, destination, WorkerConfig::default())
    }

    pub fn with_config(source: S, destination: D, config: WorkerConfig) -> Self {
        Self {
            worker: QueueWorker::new(source, destination, config),
        }
    }

    pub fn source(&self) -> &S {
        self.worker.source()
    }

    pub fn destination(&self) -> &D {
        self.worker.destination()
    }

    pub fn into_parts(self) -> (S, D) {
        self.worker.into_parts()
    }

    /// Synchronize all `object_type` objects.
    ///
    /// Both adapters must yield their objects in strictly ascending ID
    /// order. `commit()` is called once, after every object was handled.
    pub fn synchronize<F>(&mut self, object_type: &str, map: F) -> Result<RunLog, WorkerError>
    where
        F: FnMut(&S::Object, D::Object) -> Result<MappingResult<D::Object>, MapError>,
    {
        let mut run = self
            .worker
            .begin(object_type, map, RunKind::Synchronization)?;

        let verify_order = run.verify_order;
        run.rewind_source(false, verify_order)?;
        run.rewind_destination(verify_order)?;

        // 1. Merge while both sides have a current object
        while let (Some(source_id), Some(destination_id)) = (run.source_id(), run.destination_id())
        {
            match destination_id.cmp(&source_id) {
                Ordering::Greater => run.insert()?,
                Ordering::Less => run.delete()?,
                Ordering::Equal => run.update()?,
            }
            run.notify_progress();
        }

        // 2. Source objects the destination has never seen
        while run.source_id().is_some() {
            run.insert()?;
            run.notify_progress();
        }

        // 3. Destination objects that vanished from the source
        while run.destination_id().is_some() {
            run.delete()?;
            run.notify_progress();
        }

        run.finish()
    }
}
