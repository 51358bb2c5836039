use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Caller-supplied context for an update call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateOptions {
    /// The update is creating a new document (upsert). Enables
    /// `$setOnInsert`.
    pub is_insert: bool,
    /// Clock value written by `$currentDate`.
    pub now: DateTime,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            is_insert: false,
            now: DateTime::now(),
        }
    }
}

impl UpdateOptions {
    /// Options for an update that inserts a new document.
    pub fn insert() -> Self {
        Self {
            is_insert: true,
            ..Self::default()
        }
    }

    pub fn with_now(mut self, now: DateTime) -> Self {
        self.now = now;
        self
    }
}
