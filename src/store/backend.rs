//! # Document Backend
//!
//! The seam between the validating [`StoreHandler`](super::StoreHandler) and a
//! concrete store. Arguments arriving here are already validated.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use super::document::{Document, DocumentStream, Namespace, UpdateOutcome};
use super::errors::StoreResult;

/// Boxed future returned by backend operations
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// A document store reachable by namespace.
///
/// Each call is one round trip. Implementations never retry.
pub trait DocumentBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Check that the store answers
    fn ping(&self) -> BackendFuture<'_, ()>;

    /// Insert one document, returning its id
    fn insert_one<'a>(&'a self, ns: &'a Namespace, doc: Document) -> BackendFuture<'a, Value>;

    /// Insert documents in order, returning their ids in the same order
    fn insert_many<'a>(
        &'a self,
        ns: &'a Namespace,
        docs: Vec<Document>,
    ) -> BackendFuture<'a, Vec<Value>>;

    /// First document matching `filter`
    fn find_one<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
    ) -> BackendFuture<'a, Option<Document>>;

    /// All documents matching `filter`; the stream must not expire mid-iteration
    fn find_many<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
    ) -> BackendFuture<'a, DocumentStream>;

    /// Delete every document matching `filter`
    fn delete_many<'a>(&'a self, ns: &'a Namespace, filter: Document) -> BackendFuture<'a, u64>;

    /// Update the first match, inserting a new document when nothing matches
    fn update_one<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
        update: Document,
    ) -> BackendFuture<'a, UpdateOutcome>;

    /// Update every match; never inserts
    fn update_many<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
        update: Document,
    ) -> BackendFuture<'a, UpdateOutcome>;

    /// Run an aggregation pipeline
    fn aggregate<'a>(
        &'a self,
        ns: &'a Namespace,
        pipeline: Vec<Document>,
    ) -> BackendFuture<'a, DocumentStream>;

    /// Full-text search over the collection
    fn text_search<'a>(
        &'a self,
        ns: &'a Namespace,
        text: String,
    ) -> BackendFuture<'a, DocumentStream>;
}
