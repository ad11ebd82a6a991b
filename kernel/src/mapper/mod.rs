// Mapping Results
//
// The value a caller-supplied mapping function hands back after copying
// source content into a destination object. Only `Changed` results
// reach the destination adapter.

use crate::BoxError;

/// Outcome of mapping one source object onto one destination object.
///
/// `Changed` carries the object that must be written. For destinations
/// that hand out writable objects this is usually the very object passed
/// into the mapping function; for read-only query results it is the
/// writable counterpart produced by `prepare_update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingResult<T> {
    /// Nothing to persist.
    Unchanged,

    /// The new or modified object to persist.
    Changed(T),
}

impl<T> MappingResult<T> {
    pub fn unchanged() -> Self {
        MappingResult::Unchanged
    }

    pub fn changed(object: T) -> Self {
        MappingResult::Changed(object)
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, MappingResult::Changed(_))
    }

    pub fn object(&self) -> Option<&T> {
        match self {
            MappingResult::Changed(object) => Some(object),
            MappingResult::Unchanged => None,
        }
    }

    pub fn into_object(self) -> Option<T> {
        match self {
            MappingResult::Changed(object) => Some(object),
            MappingResult::Unchanged => None,
        }
    }
}

/// Failure reported by a mapping function.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct MapError {
    message: String,

    #[source]
    source: Option<BoxError>,
}

impl MapError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, e.g. a field conversion failure.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
