//! # MongoDB Backend
//!
//! [`DocumentBackend`] over the official `mongodb` driver. Documents cross the
//! boundary as relaxed extended JSON in both directions, so wrappers such as
//! `{"$oid": ..}` and `{"$date": ..}` read from the store convert back to their
//! BSON types when sent as filters or updates.

use futures_util::stream::StreamExt;
use mongodb::bson::{doc, Bson, Document as BsonDocument};
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection};
use serde_json::Value;

use super::backend::{BackendFuture, DocumentBackend};
use super::config::StoreConfig;
use super::document::{Document, DocumentStream, Namespace, UpdateOutcome};
use super::errors::{StoreError, StoreResult};

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match *err.kind {
            ErrorKind::Write(_) | ErrorKind::InsertMany(_) | ErrorKind::Command(_) => {
                StoreError::Rejected(err.to_string())
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// MongoDB-backed store
#[derive(Debug, Clone)]
pub struct MongoBackend {
    client: Client,
}

impl MongoBackend {
    /// Create a client for the configured endpoint.
    ///
    /// The driver connects lazily; use [`DocumentBackend::ping`] to verify reachability.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = Client::with_uri_str(config.uri()).await?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn collection(&self, ns: &Namespace) -> Collection<BsonDocument> {
        self.client
            .database(&ns.database)
            .collection::<BsonDocument>(&ns.collection)
    }
}

/// Convert a JSON value to BSON, reading extended JSON wrappers such as
/// `{"$oid": ..}` and `{"$date": ..}` back into their BSON types
pub fn json_to_bson(value: Value) -> StoreResult<Bson> {
    Bson::try_from(value).map_err(|e| StoreError::Conversion(e.to_string()))
}

/// Convert a JSON document to a BSON document
pub fn to_bson_document(doc: Document) -> StoreResult<BsonDocument> {
    match json_to_bson(Value::Object(doc))? {
        Bson::Document(out) => Ok(out),
        other => Err(StoreError::Conversion(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

/// Convert a BSON document to a JSON document
pub fn from_bson_document(doc: BsonDocument) -> StoreResult<Document> {
    match Bson::Document(doc).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Conversion(format!(
            "expected a document, got {}",
            other
        ))),
    }
}

fn bson_to_json(value: Bson) -> Value {
    value.into_relaxed_extjson()
}

fn cursor_stream(cursor: mongodb::Cursor<BsonDocument>) -> DocumentStream {
    cursor
        .map(|item| {
            item.map_err(StoreError::from)
                .and_then(from_bson_document)
        })
        .boxed()
}

impl DocumentBackend for MongoBackend {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    fn ping(&self) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            self.client
                .database("admin")
                .run_command(doc! {"ping": 1})
                .await?;
            Ok(())
        })
    }

    fn insert_one<'a>(&'a self, ns: &'a Namespace, doc: Document) -> BackendFuture<'a, Value> {
        Box::pin(async move {
            let doc = to_bson_document(doc)?;
            let result = self.collection(ns).insert_one(doc).await?;
            Ok(bson_to_json(result.inserted_id))
        })
    }

    fn insert_many<'a>(
        &'a self,
        ns: &'a Namespace,
        docs: Vec<Document>,
    ) -> BackendFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let docs = docs
                .into_iter()
                .map(to_bson_document)
                .collect::<StoreResult<Vec<_>>>()?;
            let result = self.collection(ns).insert_many(docs).await?;

            let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
            ids.sort_by_key(|(idx, _)| *idx);
            Ok(ids.into_iter().map(|(_, id)| bson_to_json(id)).collect())
        })
    }

    fn find_one<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
    ) -> BackendFuture<'a, Option<Document>> {
        Box::pin(async move {
            let filter = to_bson_document(filter)?;
            self.collection(ns)
                .find_one(filter)
                .await?
                .map(from_bson_document)
                .transpose()
        })
    }

    fn find_many<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
    ) -> BackendFuture<'a, DocumentStream> {
        Box::pin(async move {
            let filter = to_bson_document(filter)?;
            let cursor = self
                .collection(ns)
                .find(filter)
                .no_cursor_timeout(true)
                .await?;
            Ok(cursor_stream(cursor))
        })
    }

    fn delete_many<'a>(&'a self, ns: &'a Namespace, filter: Document) -> BackendFuture<'a, u64> {
        Box::pin(async move {
            let filter = to_bson_document(filter)?;
            let result = self.collection(ns).delete_many(filter).await?;
            Ok(result.deleted_count)
        })
    }

    fn update_one<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
        update: Document,
    ) -> BackendFuture<'a, UpdateOutcome> {
        Box::pin(async move {
            let filter = to_bson_document(filter)?;
            let update = to_bson_document(update)?;
            let result = self
                .collection(ns)
                .update_one(filter, update)
                .upsert(true)
                .await?;
            Ok(UpdateOutcome {
                matched: result.matched_count,
                modified: result.modified_count,
                upserted_id: result.upserted_id.map(bson_to_json),
            })
        })
    }

    fn update_many<'a>(
        &'a self,
        ns: &'a Namespace,
        filter: Document,
        update: Document,
    ) -> BackendFuture<'a, UpdateOutcome> {
        Box::pin(async move {
            let filter = to_bson_document(filter)?;
            let update = to_bson_document(update)?;
            let result = self.collection(ns).update_many(filter, update).await?;
            Ok(UpdateOutcome {
                matched: result.matched_count,
                modified: result.modified_count,
                upserted_id: None,
            })
        })
    }

    fn aggregate<'a>(
        &'a self,
        ns: &'a Namespace,
        pipeline: Vec<Document>,
    ) -> BackendFuture<'a, DocumentStream> {
        Box::pin(async move {
            let pipeline = pipeline
                .into_iter()
                .map(to_bson_document)
                .collect::<StoreResult<Vec<_>>>()?;
            let cursor = self.collection(ns).aggregate(pipeline).await?;
            Ok(cursor_stream(cursor))
        })
    }

    fn text_search<'a>(
        &'a self,
        ns: &'a Namespace,
        text: String,
    ) -> BackendFuture<'a, DocumentStream> {
        Box::pin(async move {
            let cursor = self
                .collection(ns)
                .find(doc! {"$text": {"$search": text}})
                .await?;
            Ok(cursor_stream(cursor))
        })
    }
}
