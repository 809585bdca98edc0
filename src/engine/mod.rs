//! Engine Module
//!
//! The collection engine: query, insert, update and remove over one
//! storage backend.
//!
//! ## Responsibilities
//! - Run every mutation as one atomic read-modify-write cycle
//! - Apply update specs (`$inc`, literal replacement, upsert)
//! - Keep `_id` assigned once and unique
//! - Own the flush scheduler of a memory-backed collection

mod options;
mod section;
mod update;

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::document::{criteria_arg, lookup, object_arg, Document, IdGenerator, UuidGenerator, ID_FIELD};
use crate::error::{Result, ShelfError};
use crate::flush::FlushScheduler;
use crate::query::{CriteriaMatcher, FieldMatcher};
use crate::storage::StorageBackend;

pub use options::{FindOptions, RemoveOptions, UpdateOptions, UpdateOutcome, UpdateResult};
pub use update::{FieldUpdate, UpdateSpec};

use section::ExclusiveSection;

/// A named collection of documents
///
/// ## Concurrency Model
///
/// - **Mutations** (insert/update/remove): serialized by the backend's
///   exclusive section
///   - acquire → read → compute → write → release
///   - release runs on every exit path (see `ExclusiveSection`)
///   - arguments are validated before acquiring, so bad input costs no I/O
///
/// - **Reads** (find/count/distinct): no section
///   - one `read_all` snapshot; `replace_all` is atomic, so a reader sees
///     the state before or after a concurrent write, never a mix
///
/// Collections never share a backend, so they never contend.
pub struct Collection {
    /// Collection name
    name: String,

    /// Where the documents live
    backend: Arc<dyn StorageBackend>,

    /// Criteria evaluation
    matcher: Arc<dyn CriteriaMatcher>,

    /// `_id` source
    ids: Arc<dyn IdGenerator>,

    /// Flush task for memory-backed collections
    scheduler: tokio::sync::Mutex<Option<FlushScheduler>>,
}

impl Collection {
    /// Create a collection over `backend` with the default matcher and ids
    pub fn new(name: impl Into<String>, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            name: name.into(),
            backend,
            matcher: Arc::new(FieldMatcher),
            ids: Arc::new(UuidGenerator),
            scheduler: tokio::sync::Mutex::new(None),
        }
    }

    /// Use a different criteria matcher
    pub fn with_matcher(mut self, matcher: Arc<dyn CriteriaMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Use a different id generator
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Hand the collection ownership of its flush task
    pub fn attach_scheduler(mut self, scheduler: FlushScheduler) -> Self {
        *self.scheduler.get_mut() = Some(scheduler);
        self
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Documents matching `criteria` (`null` or `{}` match all)
    pub async fn find(&self, criteria: &Value, options: FindOptions) -> Result<Vec<Document>> {
        let criteria = criteria_arg(criteria, "criteria")?;
        let documents = self.backend.read_all().await?;

        let found: Vec<Document> = documents
            .into_iter()
            .filter(|doc| self.is_match(doc, criteria))
            .take(if options.multi { usize::MAX } else { 1 })
            .collect();

        tracing::debug!("find on {}: {} documents", self.name, found.len());
        Ok(found)
    }

    /// First document matching `criteria`
    ///
    /// Unlike `find`, criteria are required: `null` or `{}` is rejected.
    pub async fn find_one(&self, criteria: &Value) -> Result<Option<Document>> {
        match criteria_arg(criteria, "criteria")? {
            Some(c) if !c.is_empty() => {}
            _ => return Err(ShelfError::invalid("find_one requires non-empty criteria")),
        }

        Ok(self
            .find(criteria, FindOptions::first())
            .await?
            .into_iter()
            .next())
    }

    /// Number of documents matching `criteria` (`null` counts everything)
    pub async fn count(&self, criteria: &Value) -> Result<usize> {
        if criteria.is_null() {
            return Ok(self.backend.read_all().await?.len());
        }
        Ok(self.find(criteria, FindOptions::default()).await?.len())
    }

    /// Unique non-null values of `field` across the collection
    ///
    /// Values are returned in first-seen order. Dotted paths reach into
    /// nested objects.
    pub async fn distinct(&self, field: &str) -> Result<Vec<Value>> {
        if field.trim().is_empty() {
            return Err(ShelfError::invalid("distinct requires a field name"));
        }

        let documents = self.backend.read_all().await?;
        let mut seen = HashSet::new();
        let mut values = Vec::new();

        for doc in &documents {
            match lookup(doc, field) {
                None | Some(Value::Null) => continue,
                Some(value) => {
                    if seen.insert(serde_json::to_string(value)?) {
                        values.push(value.clone());
                    }
                }
            }
        }

        Ok(values)
    }

    // =========================================================================
    // Inserts
    // =========================================================================

    /// Store `document` under a fresh `_id` and return the stored copy
    pub async fn insert(&self, document: &Value) -> Result<Document> {
        let document = object_arg(document, "document")?.clone();

        let stored = self
            .cycle(|documents| {
                let stored = self.stamp(document);
                documents.push(stored.clone());
                Ok((stored, true))
            })
            .await?;

        tracing::debug!("insert on {}: _id={}", self.name, stored[ID_FIELD]);
        Ok(stored)
    }

    /// Store every element of a non-empty array in one cycle
    pub async fn insert_many(&self, documents: &Value) -> Result<Vec<Document>> {
        let batch = match documents {
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| object_arg(item, "document").cloned())
                .collect::<Result<Vec<_>>>()?,
            Value::Array(_) => return Err(ShelfError::invalid("insert_many requires at least one document")),
            _ => return Err(ShelfError::invalid("insert_many requires an array of documents")),
        };

        let stored = self
            .cycle(|documents| {
                let stored: Vec<Document> = batch.into_iter().map(|doc| self.stamp(doc)).collect();
                documents.extend(stored.iter().cloned());
                Ok((stored, true))
            })
            .await?;

        tracing::debug!("insert_many on {}: {} documents", self.name, stored.len());
        Ok(stored)
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Apply `spec` to documents matching `criteria`
    ///
    /// - `{}` criteria update every document; `null` is rejected
    /// - `$inc` needs numeric operands (`TypeMismatch`), other operators
    ///   are `UnsupportedOperator`; either aborts with nothing persisted
    /// - with `upsert` and no match, inserts the spec itself as a new
    ///   document
    pub async fn update(&self, criteria: &Value, spec: &Value, options: UpdateOptions) -> Result<UpdateOutcome> {
        if criteria.is_null() {
            return Err(ShelfError::invalid("update requires criteria"));
        }
        let criteria = criteria_arg(criteria, "criteria")?;
        let spec = UpdateSpec::parse(object_arg(spec, "update spec")?)?;

        let (result, changed) = self
            .cycle(|documents| {
                let mut result = UpdateResult::default();
                let mut changed = Vec::new();

                for doc in documents.iter_mut() {
                    if !self.is_match(doc, criteria) {
                        continue;
                    }
                    result.matched_count += 1;
                    if spec.apply(doc)? {
                        result.modified_count += 1;
                    }
                    if options.return_documents {
                        changed.push(doc.clone());
                    }
                    if !options.multi {
                        break;
                    }
                }

                if result.matched_count == 0 && options.upsert {
                    let inserted = self.stamp(spec.upsert_document()?);
                    if options.return_documents {
                        changed.push(inserted.clone());
                    }
                    documents.push(inserted);
                    result.upserted_count = 1;
                }

                let persist = result.matched_count > 0 || result.upserted_count > 0;
                Ok(((result, changed), persist))
            })
            .await?;

        tracing::debug!(
            "update on {}: matched={} modified={} upserted={}",
            self.name,
            result.matched_count,
            result.modified_count,
            result.upserted_count
        );

        if options.return_documents {
            Ok(UpdateOutcome::Documents(changed))
        } else {
            Ok(UpdateOutcome::Result(result))
        }
    }

    /// `update` with both arguments required
    pub async fn find_and_modify(&self, criteria: &Value, spec: &Value, options: UpdateOptions) -> Result<UpdateOutcome> {
        if criteria.is_null() || spec.is_null() {
            return Err(ShelfError::invalid("find_and_modify requires criteria and an update spec"));
        }
        self.update(criteria, spec, options).await
    }

    /// Update the first match only
    pub async fn update_one(&self, criteria: &Value, spec: &Value, options: UpdateOptions) -> Result<UpdateOutcome> {
        self.update_fixed(criteria, spec, options.multi(false)).await
    }

    /// Update every match
    pub async fn update_many(&self, criteria: &Value, spec: &Value, options: UpdateOptions) -> Result<UpdateOutcome> {
        self.update_fixed(criteria, spec, options.multi(true)).await
    }

    /// Shared body of `update_one`/`update_many`
    ///
    /// `return_new` without `return_documents` re-reads the matches after
    /// the update, and only when something was modified.
    async fn update_fixed(&self, criteria: &Value, spec: &Value, options: UpdateOptions) -> Result<UpdateOutcome> {
        let outcome = self.update(criteria, spec, options).await?;

        if options.return_new && !options.return_documents {
            if let UpdateOutcome::Result(result) = &outcome {
                if result.modified_count > 0 {
                    let fresh = self.find(criteria, FindOptions { multi: options.multi }).await?;
                    return Ok(UpdateOutcome::Documents(fresh));
                }
            }
        }

        Ok(outcome)
    }

    // =========================================================================
    // Removes
    // =========================================================================

    /// Delete documents matching `criteria`
    ///
    /// `{}` deletes everything; `null` is rejected.
    pub async fn remove(&self, criteria: &Value, options: RemoveOptions) -> Result<bool> {
        if criteria.is_null() {
            return Err(ShelfError::invalid("remove requires criteria"));
        }
        let criteria = criteria_arg(criteria, "criteria")?;

        let removed = self
            .cycle(|documents| {
                let before = documents.len();
                if options.multi {
                    documents.retain(|doc| !self.is_match(doc, criteria));
                } else if let Some(index) = documents.iter().position(|doc| self.is_match(doc, criteria)) {
                    documents.remove(index);
                }
                let removed = before - documents.len();
                Ok((removed, removed > 0))
            })
            .await?;

        tracing::debug!("remove on {}: {} documents", self.name, removed);
        Ok(true)
    }

    /// Delete the first match only
    pub async fn delete_one(&self, criteria: &Value) -> Result<bool> {
        self.remove(criteria, RemoveOptions { multi: false }).await
    }

    /// Delete every match
    pub async fn delete_many(&self, criteria: &Value) -> Result<bool> {
        self.remove(criteria, RemoveOptions { multi: true }).await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Force a flush of a memory-backed collection (no-op on disk)
    pub async fn flush(&self) -> Result<()> {
        match self.scheduler.lock().await.as_ref() {
            Some(scheduler) => scheduler.flush_now().await,
            None => Ok(()),
        }
    }

    /// Stop the flush task, writing what is still buffered
    pub async fn close(&self) -> Result<()> {
        let scheduler = self.scheduler.lock().await.take();
        match scheduler {
            Some(scheduler) => scheduler.stop().await,
            None => Ok(()),
        }
    }

    /// Whether a flush task is attached
    pub async fn is_buffered(&self) -> bool {
        self.scheduler.lock().await.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// One atomic read-modify-write cycle
    ///
    /// `compute` edits the working copy and says whether to persist it. The
    /// section guard releases on every return path below.
    async fn cycle<T, F>(&self, compute: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Document>) -> Result<(T, bool)>,
    {
        let _section = ExclusiveSection::enter(self.backend.as_ref()).await?;
        tracing::trace!("{}: section acquired", self.name);

        let mut documents = self.backend.read_all().await?;
        let (output, persist) = compute(&mut documents)?;

        if persist {
            self.backend.replace_all(documents).await?;
        }
        Ok(output)
    }

    /// `null`/`{}` criteria match everything
    fn is_match(&self, document: &Document, criteria: Option<&Document>) -> bool {
        match criteria {
            Some(c) if !c.is_empty() => self.matcher.matches(document, c),
            _ => true,
        }
    }

    /// Give `document` a fresh `_id`, placed first
    fn stamp(&self, document: Document) -> Document {
        let mut stored = Document::with_capacity(document.len() + 1);
        stored.insert(ID_FIELD.to_string(), Value::String(self.ids.new_id()));
        stored.extend(document.into_iter().filter(|(k, _)| k != ID_FIELD));
        stored
    }
}
