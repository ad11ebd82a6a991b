// Worker Configuration
//
// Run options loaded from JSON by callers that wire a worker from files.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Reject a full-synchronization sequence whose IDs are not strictly
    /// ascending instead of producing wrong merge decisions.
    pub verify_order: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { verify_order: true }
    }
}

impl WorkerConfig {
    /// Trust the adapters' ordering without checking it.
    pub fn unchecked() -> Self {
        Self {
            verify_order: false,
        }
    }
}
