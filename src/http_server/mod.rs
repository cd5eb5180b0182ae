//! # HTTP Server Module
//!
//! Axum server exposing the stock reference API.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/codes` - Security code listing, filterable by market
//! - `/codes/{code}` - One security code
//! - `/codes/{code}/price` - Not implemented
//! - `/orders` - Not implemented

pub mod code_routes;
pub mod config;
pub mod health_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use server::HttpServer;
