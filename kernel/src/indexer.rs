// Change-Queue Indexing
//
// Applies a source change queue to the destination without scanning
// the destination. Every queue entry carries a status that alone
// decides the operation.

use crate::adapter::{Destination, IndexableAdapter, Status};
use crate::mapper::{MapError, MappingResult};
use crate::worker::{
    Cursor, Operation, QueueWorker, Run, RunKind, RunLog, Side, WorkerConfig, WorkerError,
};

/// Sends queued changes of one type from a source into a destination.
#[derive(Debug)]
pub struct Indexer<S, D> {
    worker: QueueWorker<S, D>,
}

impl<S, D> Indexer<S, D>
where
    S: IndexableAdapter,
    D: Destination,
{
    /// Queue entries are applied as listed; no order check applies.
    pub fn new(source: S, destination: D) -> Self {
        Self {
            worker: QueueWorker::new(source, destination, WorkerConfig::unchecked()),
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

    /// Index the queued `object_type` changes.
    ///
    /// The destination sequence is never read; the queue is trusted to be
    /// authoritative.
    pub fn index<F>(&mut self, object_type: &str, map: F) -> Result<RunLog, WorkerError>
    where
        F: FnMut(&S::Object, D::Object) -> Result<MappingResult<D::Object>, MapError>,
    {
        let mut run = self.worker.begin(object_type, map, RunKind::Indexing)?;

        // A queue may list one object several times
        let verify_order = run.verify_order;
        run.rewind_source(true, verify_order)?;

        while let Some(status) = run.source_status() {
            match status {
                Status::New | Status::Update => run.upsert()?,
                Status::Delete => run.delete_by_id()?,
            }
            run.notify_progress();
        }

        run.finish()
    }
}

impl<'a, S, D, F> Run<'a, S, D, F>
where
    S: IndexableAdapter,
    D: Destination,
    F: FnMut(&S::Object, D::Object) -> Result<MappingResult<D::Object>, MapError>,
{
    fn source_status(&self) -> Option<Status> {
        self.source_queue
            .as_ref()
            .and_then(Cursor::current)
            .map(|object| self.source.status_of(object))
    }

    /// `New` and `Update` entries: map onto a freshly created destination object.
    fn upsert(&mut self) -> Result<(), WorkerError> {
        let Some((id, source_object)) = self.source_queue.as_mut().and_then(Cursor::take) else {
            return Ok(());
        };

        let created = self
            .destination
            .create_object(id, self.object_type)
            .map_err(|err| Side::Destination.error(err))?;

        if let MappingResult::Changed(object) = self.apply_mapping(id, &source_object, created)? {
            self.destination
                .updated(object)
                .map_err(|err| Side::Destination.error(err))?;
        }

        self.advance_source()?;
        self.log.record(Operation::Upserted, id);
        Ok(())
    }

    /// `Delete` entries: delete a placeholder carrying the queued ID.
    fn delete_by_id(&mut self) -> Result<(), WorkerError> {
        let Some((id, _)) = self.source_queue.as_mut().and_then(Cursor::take) else {
            return Ok(());
        };

        let placeholder = self
            .destination
            .create_object(id, self.object_type)
            .map_err(|err| Side::Destination.error(err))?;
        self.destination
            .delete(placeholder)
            .map_err(|err| Side::Destination.error(err))?;

        self.advance_source()?;
        self.log.record(Operation::Deleted, id);
        Ok(())
    }
}
