// Queue Worker
//
// Bookkeeping shared by the Synchronizer and the Indexer: the two
// adapters, the run-scoped context (type, mapping function, cursors,
// log) and the three record operations.

pub mod config;
mod cursor;
pub mod run_log;

use std::fmt;

use crate::adapter::{Adapter, Destination, ObjectId};
use crate::mapper::{MapError, MappingResult};
use crate::BoxError;

pub use config::WorkerConfig;
pub(crate) use cursor::Cursor;
pub use run_log::{Entry, Operation, RunLog, RunStats};

/// Which adapter an error or sequence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl Side {
    pub(crate) fn error<E>(self, err: E) -> WorkerError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self {
            Side::Source => WorkerError::Source(Box::new(err)),
            Side::Destination => WorkerError::Destination(Box::new(err)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Destination => f.write_str("destination"),
        }
    }
}

/// Errors that abort a run.
///
/// Adapter and mapping failures keep the original error as their
/// `source()`. A failed run never reaches `commit()`.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("required parameter `type` is empty")]
    EmptyType,

    #[error("{side} sequence is not ascending: id {current} follows id {previous}")]
    OutOfOrder {
        side: Side,
        previous: ObjectId,
        current: ObjectId,
    },

    #[error("source adapter failed: {0}")]
    Source(#[source] BoxError),

    #[error("destination adapter failed: {0}")]
    Destination(#[source] BoxError),

    #[error("mapping object {id} failed: {source}")]
    Mapping {
        id: ObjectId,
        #[source]
        source: MapError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunKind {
    Synchronization,
    Indexing,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::Synchronization => f.write_str("synchronization"),
            RunKind::Indexing => f.write_str("indexing"),
        }
    }
}

/// Owner of the source and destination adapters.
#[derive(Debug)]
pub struct QueueWorker<S, D> {
    source: S,
    destination: D,
    config: WorkerConfig,
}

impl<S, D> QueueWorker<S, D>
where
    S: Adapter,
    D: Destination,
{
    pub fn new(source: S, destination: D, config: WorkerConfig) -> Self {
        Self {
            source,
            destination,
            config,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    pub fn into_parts(self) -> (S, D) {
        (self.source, self.destination)
    }

    /// Validate the arguments and start a run. Nothing is touched on error.
    pub(crate) fn begin<'a, F>(
        &'a mut self,
        object_type: &'a str,
        map: F,
        kind: RunKind,
    ) -> Result<Run<'a, S, D, F>, WorkerError>
    where
        F: FnMut(&S::Object, D::Object) -> Result<MappingResult<D::Object>, MapError>,
    {
        if object_type.is_empty() {
            return Err(WorkerError::EmptyType);
        }

        let mut log = RunLog::new(object_type);
        tracing::info!(run_id = %log.run_id(), object_type, "start of {kind}");
        log.note(format!("Start of {kind} for {object_type}"));

        Ok(Run {
            source: &mut self.source,
            destination: &mut self.destination,
            verify_order: self.config.verify_order,
            object_type,
            kind,
            map,
            source_queue: None,
            destination_queue: None,
            log,
        })
    }
}

/// State of a single run, dropped when the run ends.
pub(crate) struct Run<'a, S: Adapter, D: Destination, F> {
    pub(crate) source: &'a mut S,
    pub(crate) destination: &'a mut D,
    pub(crate) verify_order: bool,
    pub(crate) object_type: &'a str,
    kind: RunKind,
    map: F,
    pub(crate) source_queue: Option<Cursor<S>>,
    pub(crate) destination_queue: Option<Cursor<D>>,
    pub(crate) log: RunLog,
}

impl<'a, S, D, F> Run<'a, S, D, F>
where
    S: Adapter,
    D: Destination,
    F: FnMut(&S::Object, D::Object) -> Result<MappingResult<D::Object>, MapError>,
{
    pub(crate) fn rewind_source(
        &mut self,
        change_queue: bool,
        verify_order: bool,
    ) -> Result<(), WorkerError> {
        let cursor = Cursor::rewind(
            &mut *self.source,
            self.object_type,
            change_queue,
            Side::Source,
            verify_order,
        )?;
        self.source_queue = Some(cursor);
        Ok(())
    }

    pub(crate) fn rewind_destination(&mut self, verify_order: bool) -> Result<(), WorkerError> {
        let cursor = Cursor::rewind(
            &mut *self.destination,
            self.object_type,
            false,
            Side::Destination,
            verify_order,
        )?;
        self.destination_queue = Some(cursor);
        Ok(())
    }

    pub(crate) fn source_id(&self) -> Option<ObjectId> {
        self.source_queue.as_ref().and_then(Cursor::current_id)
    }

    pub(crate) fn destination_id(&self) -> Option<ObjectId> {
        self.destination_queue.as_ref().and_then(Cursor::current_id)
    }

    pub(crate) fn apply_mapping(
        &mut self,
        id: ObjectId,
        source_object: &S::Object,
        destination_object: D::Object,
    ) -> Result<MappingResult<D::Object>, WorkerError> {
        (self.map)(source_object, destination_object)
            .map_err(|source| WorkerError::Mapping { id, source })
    }

    /// Create a destination object for the current source object and map onto it.
    pub(crate) fn insert(&mut self) -> Result<(), WorkerError> {
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
        self.log.record(Operation::Inserted, id);
        Ok(())
    }

    /// Remove the current destination object. No mapping is involved.
    pub(crate) fn delete(&mut self) -> Result<(), WorkerError> {
        let Some((id, destination_object)) =
            self.destination_queue.as_mut().and_then(Cursor::take)
        else {
            return Ok(());
        };

        self.destination
            .delete(destination_object)
            .map_err(|err| Side::Destination.error(err))?;

        self.advance_destination()?;
        self.log.record(Operation::Deleted, id);
        Ok(())
    }

    /// Map the current source object onto its matching destination object.
    pub(crate) fn update(&mut self) -> Result<(), WorkerError> {
        let source = self.source_queue.as_mut().and_then(Cursor::take);
        let destination = self.destination_queue.as_mut().and_then(Cursor::take);
        let (Some((id, source_object)), Some((_, mut destination_object))) = (source, destination)
        else {
            return Ok(());
        };

        if let Some(provider) = self.destination.as_updateable() {
            destination_object = provider
                .prepare_update(destination_object)
                .map_err(|err| Side::Destination.error(err))?;
        }

        match self.apply_mapping(id, &source_object, destination_object)? {
            MappingResult::Changed(object) => {
                self.destination
                    .updated(object)
                    .map_err(|err| Side::Destination.error(err))?;
                self.log.record(Operation::Updated, id);
            }
            MappingResult::Unchanged => self.log.record(Operation::Kept, id),
        }

        self.advance_destination()?;
        self.advance_source()?;
        Ok(())
    }

    pub(crate) fn notify_progress(&mut self) {
        if let Some(listener) = self.destination.as_progress_listener() {
            listener.after_object_processed();
        }
    }

    pub(crate) fn advance_source(&mut self) -> Result<(), WorkerError> {
        match self.source_queue.as_mut() {
            Some(cursor) => cursor.next(&*self.source),
            None => Ok(()),
        }
    }

    pub(crate) fn advance_destination(&mut self) -> Result<(), WorkerError> {
        match self.destination_queue.as_mut() {
            Some(cursor) => cursor.next(&*self.destination),
            None => Ok(()),
        }
    }

    /// Commit the destination and hand back the log.
    pub(crate) fn finish(self) -> Result<RunLog, WorkerError> {
        let Run {
            destination,
            object_type,
            kind,
            mut log,
            ..
        } = self;

        destination
            .commit()
            .map_err(|err| Side::Destination.error(err))?;

        let stats = log.stats();
        tracing::info!(
            run_id = %log.run_id(),
            object_type,
            inserted = stats.inserted,
            updated = stats.updated,
            kept = stats.kept,
            deleted = stats.deleted,
            upserted = stats.upserted,
            "end of {kind}"
        );
        log.note(format!("End of {kind} for {object_type}"));
        Ok(log)
    }
}
