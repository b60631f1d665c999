//! Configuration module for the PES gateway.
//! Reads settings from the environment and wires the store, the remote
//! client and both sync directions together.
mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{database_url, SyncConfig};
