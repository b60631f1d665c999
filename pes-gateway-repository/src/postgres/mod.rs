//! PostgreSQL implementation of the local store.
//!
//! Provides a production backend for the `LocalStore` trait with connection
//! pooling, one transaction per session and nested savepoints.
//!
//! ## Database Tables
//!
//! - One table per entity kind (`persons`, `organizations`, `roles`, ...)
//! - Link tables for ordered references (`event_organizations`,
//!   `exchange_products`, `organization_transverse_themes`) and `occurrences`
//! - `contacts` and `engagements`, owned by their organization or person
//! - `foreign_<kind>` ownership marker tables, cascading with their record
mod records;
mod session;
mod store;

pub use session::PostgresSession;
pub use store::PostgresStore;
