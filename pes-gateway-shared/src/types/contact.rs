use serde::{Deserialize, Serialize};

use crate::types::OwnerRef;

/// A contact (email, phone, ...) attached to an organization or a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub uuid: String,
    pub content: String,
    pub contact_medium: Option<i64>,
    pub owner: OwnerRef,
}
