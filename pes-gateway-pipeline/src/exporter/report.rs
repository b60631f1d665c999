use pes_gateway_shared::types::EntityKind;

use crate::errors::ExportError;

/// Outcome of a bulk export.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub exported: Vec<(EntityKind, String)>,
    pub failed: Vec<(EntityKind, String, ExportError)>,
}

impl ExportReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
