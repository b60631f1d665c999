mod client;
mod export;
mod import;
mod record;
mod serialization;

pub use client::ClientError;
pub use export::ExportError;
pub use import::ImportError;
pub use record::RecordError;
pub use serialization::SerializationError;
