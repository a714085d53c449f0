//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - versions(version, title, description, base_url, synced_at)
//! - endpoints(version_id, path, method, summary, description, operation_id, tags, deprecated)
//! - parameters(endpoint_id, name, in_type, required, type, description, schema_ref)
//! - schemas(version_id, name, type, properties, required_fields, description)
//!
//! Deletes cascade explicitly: parameters → endpoints → schemas → version.

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, StoreStats};
