//! # PES Gateway Repository
//! This crate provides the traits and implementations for the local store the
//! gateway reads from and writes to. It includes the session interface with
//! nested savepoints, the ownership marker operations, the change observer
//! registry, and concrete implementations for PostgreSQL and for memory.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::StoreError;
pub use interfaces::{
    find_model, ChangeObserver, LocalStore, ObserverId, ObserverRegistry, StoreSession,
};
pub use memory::{Fault, InMemoryStore};
pub use postgres::PostgresStore;
