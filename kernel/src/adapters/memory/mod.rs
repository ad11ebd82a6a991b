// In-Memory Store Adapter
//
// A JSON-backed store of records grouped by type, usable as source
// (full sequence or change queue) and as destination. Destination
// writes are staged and only applied on `commit()`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::adapter::{
    Adapter, Destination, IndexableAdapter, ObjectId, ProgressListener, Status,
    UpdateableObjectProvider,
};
use crate::mapper::{MapError, MappingResult};

/// A single stored object: an ID plus free-form JSON fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: ObjectId,

    /// Only set on change-queue entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,

    #[serde(skip)]
    object_type: String,

    /// Whether the record was read from committed state.
    #[serde(skip)]
    stored: bool,
}

impl Record {
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            status: None,
            fields: Map::new(),
            object_type: String::new(),
            stored: false,
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot access store file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid store document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
enum Pending {
    Upsert(Record),
    Delete { object_type: String, id: ObjectId },
}

type RecordCursor =
    std::iter::Map<std::vec::IntoIter<Record>, fn(Record) -> Result<Record, StoreError>>;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    objects: BTreeMap<String, Vec<Record>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    queue: BTreeMap<String, Vec<Record>>,

    #[serde(skip)]
    pending: Vec<Pending>,

    #[serde(skip)]
    commits: usize,

    #[serde(skip)]
    processed: usize,

    #[serde(skip)]
    prepared: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let mut store: MemoryStore = serde_json::from_str(json)?;
        for records in store.objects.values_mut() {
            records.sort_by_key(|record| record.id);
        }
        Ok(store)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let data = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Load `path`, or start empty when the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the committed state. Staged writes are not included.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Store `record` directly, bypassing staging.
    pub fn insert(&mut self, object_type: &str, record: Record) {
        let records = self.objects.entry(object_type.to_string()).or_default();
        match records.binary_search_by_key(&record.id, |r| r.id) {
            Ok(pos) => records[pos] = record,
            Err(pos) => records.insert(pos, record),
        }
    }

    /// Append a change-queue entry; `record.status` selects the operation.
    pub fn enqueue(&mut self, object_type: &str, record: Record) {
        self.queue
            .entry(object_type.to_string())
            .or_default()
            .push(record);
    }

    pub fn clear_queue(&mut self, object_type: &str) {
        self.queue.remove(object_type);
    }

    pub fn records(&self, object_type: &str) -> &[Record] {
        self.objects
            .get(object_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn ids(&self, object_type: &str) -> Vec<ObjectId> {
        self.records(object_type).iter().map(|r| r.id).collect()
    }

    pub fn queued(&self, object_type: &str) -> &[Record] {
        self.queue
            .get(object_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Number of stored records handed out for update.
    pub fn prepared_updates(&self) -> usize {
        self.prepared
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.pending.is_empty()
    }

    fn sequence(&self, object_type: &str) -> Vec<Record> {
        self.records(object_type)
            .iter()
            .map(|record| Record {
                object_type: object_type.to_string(),
                stored: true,
                ..record.clone()
            })
            .collect()
    }

    fn change_queue(&self, object_type: &str) -> Vec<Record> {
        let mut entries: Vec<Record> = self
            .queued(object_type)
            .iter()
            .filter(|record| {
                if record.status.is_none() {
                    tracing::warn!(
                        object_type,
                        id = record.id,
                        "skipping queue entry without status"
                    );
                }
                record.status.is_some()
            })
            .map(|record| Record {
                object_type: object_type.to_string(),
                ..record.clone()
            })
            .collect();
        // Stable, so repeated entries for one ID keep their queue order
        entries.sort_by_key(|record| record.id);
        entries
    }

    fn apply(&mut self, pending: Pending) {
        match pending {
            Pending::Upsert(record) => {
                let object_type = record.object_type.clone();
                self.insert(
                    &object_type,
                    Record {
                        status: None,
                        stored: false,
                        object_type: String::new(),
                        ..record
                    },
                );
            }
            Pending::Delete { object_type, id } => {
                if let Some(records) = self.objects.get_mut(&object_type) {
                    records.retain(|record| record.id != id);
                }
            }
        }
    }
}

impl Adapter for MemoryStore {
    type Object = Record;
    type Error = StoreError;
    type Cursor = RecordCursor;

    fn objects_ordered_by_id(
        &mut self,
        object_type: &str,
        change_queue: bool,
    ) -> Result<Self::Cursor, Self::Error> {
        let records = if change_queue {
            self.change_queue(object_type)
        } else {
            self.sequence(object_type)
        };
        Ok(records.into_iter().map(Ok as fn(Record) -> Result<Record, StoreError>))
    }

    fn id_of(&self, object: &Record) -> ObjectId {
        object.id
    }
}

impl IndexableAdapter for MemoryStore {
    fn status_of(&self, object: &Record) -> Status {
        object.status.unwrap_or(Status::Update)
    }
}

impl Destination for MemoryStore {
    fn create_object(&mut self, id: ObjectId, object_type: &str) -> Result<Record, StoreError> {
        Ok(Record {
            object_type: object_type.to_string(),
            ..Record::new(id)
        })
    }

    fn delete(&mut self, object: Record) -> Result<(), StoreError> {
        self.pending.push(Pending::Delete {
            object_type: object.object_type,
            id: object.id,
        });
        Ok(())
    }

    fn updated(&mut self, object: Record) -> Result<(), StoreError> {
        self.pending.push(Pending::Upsert(object));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let pending = std::mem::take(&mut self.pending);
        tracing::debug!(writes = pending.len(), "committing staged writes");
        for write in pending {
            self.apply(write);
        }
        self.commits += 1;
        Ok(())
    }

    fn as_updateable(
        &mut self,
    ) -> Option<&mut dyn UpdateableObjectProvider<Record, StoreError>> {
        Some(self)
    }

    fn as_progress_listener(&mut self) -> Option<&mut dyn ProgressListener> {
        Some(self)
    }
}

impl UpdateableObjectProvider<Record, StoreError> for MemoryStore {
    /// Detach a sequence record for writing. Keeps `stored` so unchanged
    /// fields are still recognised.
    fn prepare_update(&mut self, object: Record) -> Result<Record, StoreError> {
        self.prepared += 1;
        Ok(Record {
            status: None,
            ..object
        })
    }
}

impl ProgressListener for MemoryStore {
    fn after_object_processed(&mut self) {
        self.processed += 1;
    }
}

/// Mapping function that mirrors the source fields into the destination.
///
/// Stored records whose fields already match are reported unchanged;
/// freshly created records are always written.
pub fn copy_fields(
    source: &Record,
    mut destination: Record,
) -> Result<MappingResult<Record>, MapError> {
    if destination.stored && destination.fields == source.fields {
        return Ok(MappingResult::unchanged());
    }
    destination.fields = source.fields.clone();
    Ok(MappingResult::changed(destination))
}
