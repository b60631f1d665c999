//! PES Gateway Library
//!
//! Configuration loading, error handling and dependency wiring for the
//! gateway binary, which keeps the local store in sync with a PES instance.

pub mod config;
pub mod errors;

pub use config::{Dependencies, SyncConfig};
pub use errors::GatewayError;
