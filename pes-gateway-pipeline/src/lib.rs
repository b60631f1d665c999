//! # PES Gateway Pipeline
//! This crate moves records between the local store and the PES.
//! It includes the remote client, the serialization layer, the identifier
//! translations, the import reconciliation engine with its per-kind handlers,
//! and the exporter that pushes local changes.
pub mod client;
pub mod exporter;
pub mod importer;
pub mod serializer;
pub mod translations;

pub mod errors;

pub use client::{MockPesClient, PesClient, PushStyle, RemoteApi};
pub use exporter::{ExportReport, Exporter};
pub use importer::{ClassificationPolicy, ImportRunner, RecordOutcome, RunReport};
