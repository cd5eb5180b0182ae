//! stocklab - stock reference data over a document store
//!
//! - `store`: generic document operations (MongoDB or in-memory backend)
//! - `rest_api`: security code lookups and the public field translation
//! - `http_server`: axum routes for `/codes`, `/orders` and `/health`
//! - `cli`: `serve` and `check` entry points

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod rest_api;
pub mod store;
