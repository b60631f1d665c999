use pes_gateway_shared::types::Role;
use serde::Deserialize;
use serde_json::json;

use crate::errors::SerializationError;
use crate::serializer::{present, required, Document};

#[derive(Debug, Clone, Deserialize)]
pub struct RoleDocument {
    pub uuid: String,
    pub slug: String,
    #[serde(default, deserialize_with = "present")]
    pub label: Option<Option<String>>,
}

pub fn serialize_role(role: &Role) -> Document {
    let mut document = Document::new();
    document.insert("uuid".to_string(), json!(role.uuid));
    document.insert("slug".to_string(), json!(role.slug));
    document.insert("label".to_string(), json!(role.label));
    document
}

pub fn deserialize_role(
    role: &mut Role,
    document: &RoleDocument,
) -> Result<(), SerializationError> {
    role.uuid = document.uuid.clone();
    role.slug = document.slug.clone();
    role.label = required(&document.label, "label")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::parse_document;

    #[test]
    fn test_role_document_maps_every_field() {
        let document: RoleDocument = parse_document(&json!({
            "uuid": "r-1",
            "slug": "president",
            "label": "Président",
        }))
        .unwrap();
        let mut role = Role::default();

        deserialize_role(&mut role, &document).unwrap();

        assert_eq!(serde_json::Value::Object(serialize_role(&role)), json!({
            "uuid": "r-1",
            "slug": "president",
            "label": "Président",
        }));
    }
}
