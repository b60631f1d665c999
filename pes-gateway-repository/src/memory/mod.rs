//! In-memory implementation of the local store, used by tests and for local
//! development without a database.
mod state;
mod store;

pub use store::{Fault, InMemorySession, InMemoryStore};
