//! # Resource Layer
//!
//! Maps security code resources onto store reads and translates stored,
//! localized field names into the public schema.

pub mod errors;
pub mod handler;
pub mod model;
pub mod translation;

pub use errors::{ErrorResponse, RestError, RestResult};
pub use handler::{CodeService, DEFAULT_CODE_COLLECTION, DEFAULT_DATABASE};
pub use model::{CodeListQuery, CodeListResponse, CodeRecord, Market};
pub use translation::{project, CODE_FIELD_TABLE};
