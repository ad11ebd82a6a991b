// Sequence Cursor
//
// Pull-based position over an adapter sequence. Holds the current
// object together with its ID so the merge never asks the adapter twice.

use crate::adapter::{Adapter, ObjectId};
use crate::worker::{Side, WorkerError};

pub(crate) struct Cursor<A: Adapter> {
    side: Side,
    inner: A::Cursor,
    current: Option<(ObjectId, A::Object)>,
    last_id: Option<ObjectId>,
    verify_order: bool,
}

impl<A: Adapter> Cursor<A> {
    /// Open the adapter's sequence and position on its first object.
    pub(crate) fn rewind(
        adapter: &mut A,
        object_type: &str,
        change_queue: bool,
        side: Side,
        verify_order: bool,
    ) -> Result<Self, WorkerError> {
        let inner = adapter
            .objects_ordered_by_id(object_type, change_queue)
            .map_err(|err| side.error(err))?;

        let mut cursor = Self {
            side,
            inner,
            current: None,
            last_id: None,
            verify_order,
        };
        cursor.next(adapter)?;
        Ok(cursor)
    }

    pub(crate) fn current_id(&self) -> Option<ObjectId> {
        self.current.as_ref().map(|(id, _)| *id)
    }

    pub(crate) fn current(&self) -> Option<&A::Object> {
        self.current.as_ref().map(|(_, object)| object)
    }

    /// Remove the current object; call [`Cursor::next`] once it is handled.
    pub(crate) fn take(&mut self) -> Option<(ObjectId, A::Object)> {
        self.current.take()
    }

    /// Advance to the following object, if any.
    pub(crate) fn next(&mut self, adapter: &A) -> Result<(), WorkerError> {
        self.current = match self.inner.next() {
            None => None,
            Some(item) => {
                let object = item.map_err(|err| self.side.error(err))?;
                let id = adapter.id_of(&object);
                self.check_order(id)?;
                Some((id, object))
            }
        };
        Ok(())
    }

    fn check_order(&mut self, id: ObjectId) -> Result<(), WorkerError> {
        if self.verify_order {
            if let Some(previous) = self.last_id {
                if id <= previous {
                    return Err(WorkerError::OutOfOrder {
                        side: self.side,
                        previous,
                        current: id,
                    });
                }
            }
        }
        self.last_id = Some(id);
        Ok(())
    }
}
