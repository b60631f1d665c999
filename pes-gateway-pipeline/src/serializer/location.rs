use pes_gateway_shared::types::Location;
use serde::Deserialize;
use serde_json::json;

use crate::errors::SerializationError;
use crate::serializer::{present, required, Document};

document_fields! {
    LocationField {
        Label => "label",
        Adr1 => "adr1",
        Adr2 => "adr2",
        Zipcode => "zipcode",
        City => "city",
        Country => "country",
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationDocument {
    pub uuid: String,
    #[serde(default, deserialize_with = "present")]
    pub label: Option<Option<String>>,
    #[serde(default)]
    pub adr1: Option<String>,
    #[serde(default)]
    pub adr2: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

pub fn serialize_location(location: &Location, fields: &[LocationField]) -> Document {
    let mut document = Document::new();
    document.insert("uuid".to_string(), json!(location.uuid));
    for field in fields {
        let value = match field {
            LocationField::Label => json!(location.label),
            LocationField::Adr1 => json!(location.adr1),
            LocationField::Adr2 => json!(location.adr2),
            LocationField::Zipcode => json!(location.zipcode),
            LocationField::City => json!(location.city),
            LocationField::Country => json!(location.country),
        };
        document.insert(field.as_str().to_string(), value);
    }
    document
}

pub fn deserialize_location(
    location: &mut Location,
    document: &LocationDocument,
) -> Result<(), SerializationError> {
    location.uuid = document.uuid.clone();
    location.label = required(&document.label, "label")?;
    location.adr1 = document.adr1.clone();
    location.adr2 = document.adr2.clone();
    location.zipcode = document.zipcode.clone();
    location.city = document.city.clone();
    location.country = document.country.clone();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::parse_document;

    #[test]
    fn test_absent_address_lines_are_cleared() {
        let mut location = Location {
            uuid: "l-1".into(),
            label: "Old hall".into(),
            adr1: Some("1 rue Haute".into()),
            city: Some("Lyon".into()),
            ..Default::default()
        };
        let document: LocationDocument =
            parse_document(&json!({"uuid": "l-1", "label": "Hall", "city": "Lyon"})).unwrap();

        deserialize_location(&mut location, &document).unwrap();

        assert_eq!(location.label, "Hall");
        assert_eq!(location.adr1, None);
        assert_eq!(location.city.as_deref(), Some("Lyon"));
    }
}
