//! Error types for the local store.
//! Consolidates and re-exports the errors raised by store sessions.
mod store;

pub use store::StoreError;
