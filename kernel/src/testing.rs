// Test Doubles
//
// A scripted adapter that plays either side of a run and records every
// call the workers make against it.

use crate::adapter::{
    Adapter, Destination, IndexableAdapter, ObjectId, ProgressListener, Status,
    UpdateableObjectProvider,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ObjectId,
    pub value: String,
    pub status: Status,
    pub writable: bool,
}

pub fn item(id: ObjectId, value: &str) -> Item {
    Item {
        id,
        value: value.to_string(),
        status: Status::Update,
        writable: false,
    }
}

pub fn queued(id: ObjectId, status: Status) -> Item {
    Item {
        status,
        ..item(id, "queued")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Sequence { object_type: String, change_queue: bool },
    CreateObject { id: ObjectId, object_type: String },
    PrepareUpdate(ObjectId),
    Delete(Item),
    Updated(Item),
    AfterObjectProcessed,
    Commit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("scripted failure: {0}")]
pub struct ScriptedError(pub &'static str);

#[derive(Debug, Default)]
pub struct RecordingAdapter {
    items: Vec<Item>,
    pub calls: Vec<Call>,
    updateable: bool,
    progress: bool,
    fail_sequence: bool,
    fail_item_at: Option<usize>,
    fail_updated_for: Option<ObjectId>,
}

impl RecordingAdapter {
    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn updateable(mut self) -> Self {
        self.updateable = true;
        self
    }

    pub fn listening(mut self) -> Self {
        self.progress = true;
        self
    }

    pub fn failing_sequence(mut self) -> Self {
        self.fail_sequence = true;
        self
    }

    /// Yield an error in place of the item at `position`.
    pub fn failing_item_at(mut self, position: usize) -> Self {
        self.fail_item_at = Some(position);
        self
    }

    pub fn failing_updated_for(mut self, id: ObjectId) -> Self {
        self.fail_updated_for = Some(id);
        self
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| matches(call)).count()
    }

    pub fn commits(&self) -> usize {
        self.count(|call| *call == Call::Commit)
    }

    pub fn progress_notifications(&self) -> usize {
        self.count(|call| *call == Call::AfterObjectProcessed)
    }

    /// Calls other than sequence requests, progress and commit.
    pub fn writes(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|call| {
                !matches!(
                    call,
                    Call::Sequence { .. } | Call::AfterObjectProcessed | Call::Commit
                )
            })
            .cloned()
            .collect()
    }
}

impl Adapter for RecordingAdapter {
    type Object = Item;
    type Error = ScriptedError;
    type Cursor = std::vec::IntoIter<Result<Item, ScriptedError>>;

    fn objects_ordered_by_id(
        &mut self,
        object_type: &str,
        change_queue: bool,
    ) -> Result<Self::Cursor, Self::Error> {
        self.calls.push(Call::Sequence {
            object_type: object_type.to_string(),
            change_queue,
        });
        if self.fail_sequence {
            return Err(ScriptedError("sequence unavailable"));
        }
        let items: Vec<_> = self
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| match self.fail_item_at {
                Some(failing) if failing == position => Err(ScriptedError("read failed")),
                _ => Ok(item.clone()),
            })
            .collect();
        Ok(items.into_iter())
    }

    fn id_of(&self, object: &Item) -> ObjectId {
        object.id
    }
}

impl IndexableAdapter for RecordingAdapter {
    fn status_of(&self, object: &Item) -> Status {
        object.status
    }
}

impl Destination for RecordingAdapter {
    fn create_object(&mut self, id: ObjectId, object_type: &str) -> Result<Item, ScriptedError> {
        self.calls.push(Call::CreateObject {
            id,
            object_type: object_type.to_string(),
        });
        Ok(Item {
            writable: true,
            ..item(id, "")
        })
    }

    fn delete(&mut self, object: Item) -> Result<(), ScriptedError> {
        self.calls.push(Call::Delete(object));
        Ok(())
    }

    fn updated(&mut self, object: Item) -> Result<(), ScriptedError> {
        if self.fail_updated_for == Some(object.id) {
            return Err(ScriptedError("write rejected"));
        }
        self.calls.push(Call::Updated(object));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), ScriptedError> {
        self.calls.push(Call::Commit);
        Ok(())
    }

    fn as_updateable(&mut self) -> Option<&mut dyn UpdateableObjectProvider<Item, ScriptedError>> {
        if self.updateable {
            Some(self)
        } else {
            None
        }
    }

    fn as_progress_listener(&mut self) -> Option<&mut dyn ProgressListener> {
        if self.progress {
            Some(self)
        } else {
            None
        }
    }
}

impl UpdateableObjectProvider<Item, ScriptedError> for RecordingAdapter {
    fn prepare_update(&mut self, object: Item) -> Result<Item, ScriptedError> {
        self.calls.push(Call::PrepareUpdate(object.id));
        Ok(Item {
            writable: true,
            ..object
        })
    }
}

impl ProgressListener for RecordingAdapter {
    fn after_object_processed(&mut self) {
        self.calls.push(Call::AfterObjectProcessed);
    }
}
