//! Persistence of search results
//!
//! Results go to a JSON document collection laid out like a TinyDB file, so
//! existing tooling that reads those files keeps working.

/// JSON document store
pub mod json_store;
/// Cross-process lock guarding a store file
pub mod lock;
/// Turns scan output into result records
pub mod writer;

pub use json_store::JsonStore;
pub use lock::StoreLock;
pub use writer::{ResultWriter, WriteSummary, blob_url};
