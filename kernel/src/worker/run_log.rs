// Run Log
//
// Ordered, append-only record of what one run did. Returned to the
// caller on success; never read by the workers themselves.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::adapter::ObjectId;

/// What happened to a single object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Inserted,
    Updated,
    Kept,
    Deleted,

    /// Indexer write for a `New` or `Update` queue entry.
    Upserted,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::Inserted => "Inserted",
            Operation::Updated => "Updated",
            Operation::Kept => "Kept",
            Operation::Deleted => "Deleted",
            Operation::Upserted => "Inserted/Updated",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub operation: Operation,
    pub id: ObjectId,
}

/// Per-operation totals of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub inserted: usize,
    pub updated: usize,
    pub kept: usize,
    pub deleted: usize,
    pub upserted: usize,
}

impl RunStats {
    pub fn processed(&self) -> usize {
        self.inserted + self.updated + self.kept + self.deleted + self.upserted
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunLog {
    run_id: Uuid,
    object_type: String,
    messages: Vec<String>,
    entries: Vec<Entry>,
}

impl RunLog {
    pub(crate) fn new(object_type: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            object_type: object_type.to_string(),
            messages: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn note(&mut self, message: String) {
        self.messages.push(message);
    }

    pub(crate) fn record(&mut self, operation: Operation, id: ObjectId) {
        tracing::debug!(run_id = %self.run_id, id, "{operation} object");
        self.messages.push(format!("{operation} object with id {id}"));
        self.entries.push(Entry { operation, id });
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Human-readable messages in the order they were appended.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// One entry per processed object, in processing order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn ids_with(&self, operation: Operation) -> Vec<ObjectId> {
        self.entries
            .iter()
            .filter(|entry| entry.operation == operation)
            .map(|entry| entry.id)
            .collect()
    }

    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats::default();
        for entry in &self.entries {
            match entry.operation {
                Operation::Inserted => stats.inserted += 1,
                Operation::Updated => stats.updated += 1,
                Operation::Kept => stats.kept += 1,
                Operation::Deleted => stats.deleted += 1,
                Operation::Upserted => stats.upserted += 1,
            }
        }
        stats
    }
}
