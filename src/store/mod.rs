//! # Store Access Layer
//!
//! Generic create / read / update / delete / aggregate / text-search over
//! named collections in named databases.
//!
//! [`StoreHandler`] validates arguments and delegates to a
//! [`DocumentBackend`]: [`MongoBackend`] in production, [`MemoryBackend`] for
//! tests and local runs.

pub mod backend;
pub mod config;
pub mod document;
pub mod errors;
pub mod filter;
pub mod handler;
pub mod memory;
pub mod mongo;
pub mod pipeline;
pub mod update;

pub use backend::{BackendFuture, DocumentBackend};
pub use config::StoreConfig;
pub use document::{collect_documents, Document, DocumentStream, Namespace, UpdateOutcome};
pub use errors::{StoreError, StoreResult};
pub use handler::StoreHandler;
pub use memory::MemoryBackend;
pub use mongo::MongoBackend;
