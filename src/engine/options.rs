//! Operation options and results

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Options for `find`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    /// Return every match (true) or only the first (false)
    pub multi: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self { multi: true }
    }
}

impl FindOptions {
    pub fn first() -> Self {
        Self { multi: false }
    }
}

/// Options for the `update` family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Update every match (true) or only the first (false)
    pub multi: bool,

    /// Insert a document when nothing matches
    pub upsert: bool,

    /// Resolve with the updated documents instead of counts
    pub return_documents: bool,

    /// `update_one`/`update_many` only: re-read the post-update state when
    /// something was modified
    pub return_new: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            multi: true,
            upsert: false,
            return_documents: false,
            return_new: false,
        }
    }
}

impl UpdateOptions {
    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn return_documents(mut self, enabled: bool) -> Self {
        self.return_documents = enabled;
        self
    }

    pub fn return_new(mut self, enabled: bool) -> Self {
        self.return_new = enabled;
        self
    }
}

/// Options for `remove`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Remove every match (true) or only the first (false)
    pub multi: bool,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self { multi: true }
    }
}

/// Counts reported by an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
}

/// What an update resolves with
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Counts (the default)
    Result(UpdateResult),

    /// Changed documents (`return_documents` / `return_new`)
    Documents(Vec<Document>),
}

impl UpdateOutcome {
    pub fn result(&self) -> Option<&UpdateResult> {
        match self {
            UpdateOutcome::Result(result) => Some(result),
            UpdateOutcome::Documents(_) => None,
        }
    }

    pub fn documents(&self) -> Option<&[Document]> {
        match self {
            UpdateOutcome::Result(_) => None,
            UpdateOutcome::Documents(documents) => Some(documents),
        }
    }

    pub fn into_documents(self) -> Option<Vec<Document>> {
        match self {
            UpdateOutcome::Result(_) => None,
            UpdateOutcome::Documents(documents) => Some(documents),
        }
    }
}
