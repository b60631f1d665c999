//! Import path: pulls full snapshots from the PES and reconciles them into
//! the local store.
//!
//! This module provides:
//! - [`ImportRunner`] driving one run across every kind in dependency order
//! - [`Reconciler`] applying one kind's records with per-record savepoints
//! - [`ImportHandler`] and its per-kind implementations in [`handlers`]
//! - [`RunReport`] collecting a typed outcome for every record
mod engine;
mod handler;
pub mod handlers;
pub mod lookups;
mod nested;
mod report;
mod runner;

pub use engine::{ClassificationPolicy, Reconciler};
pub use handler::ImportHandler;
pub use report::{RecordOutcome, RecordReport, RunReport, Subject};
pub use runner::ImportRunner;
