use pes_gateway_shared::types::Contact;
use serde::Deserialize;
use serde_json::{json, Value};

/// A contact nested in an organization or person document.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactDocument {
    pub uuid: String,
    pub content: String,
    #[serde(default)]
    pub contact_medium: Option<i64>,
}

pub fn serialize_contact(contact: &Contact) -> Value {
    json!({
        "contact_medium": contact.contact_medium,
        "uuid": contact.uuid,
        "content": contact.content,
    })
}
