use pes_gateway_shared::types::{Contact, Person};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::SerializationError;
use crate::serializer::{present, required, serialize_contact, ContactDocument, Document};

document_fields! {
    /// Selectable fields of a person document.
    PersonField {
        FirstName => "first_name",
        LastName => "last_name",
        Contacts => "contacts",
        PrefEmail => "pref_email",
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PersonView<'a> {
    pub person: &'a Person,
    pub contacts: &'a [Contact],
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonDocument {
    pub uuid: String,
    #[serde(default, deserialize_with = "present")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub last_name: Option<Option<String>>,
    #[serde(default)]
    pub pref_email: Option<String>,
    #[serde(default)]
    pub contacts: Option<Vec<ContactDocument>>,
}

pub fn serialize_person(view: &PersonView<'_>, fields: &[PersonField]) -> Document {
    let person = view.person;
    let mut document = Document::new();
    document.insert("uuid".to_string(), json!(person.uuid));
    for field in fields {
        let value = match field {
            PersonField::FirstName => json!(person.first_name),
            PersonField::LastName => json!(person.last_name),
            PersonField::Contacts => {
                Value::Array(view.contacts.iter().map(serialize_contact).collect())
            }
            PersonField::PrefEmail => json!(person.pref_email),
        };
        document.insert(field.as_str().to_string(), value);
    }
    document
}

pub fn deserialize_person(
    person: &mut Person,
    document: &PersonDocument,
) -> Result<(), SerializationError> {
    person.uuid = document.uuid.clone();
    person.first_name = required(&document.first_name, "first_name")?;
    person.last_name = required(&document.last_name, "last_name")?;
    person.pref_email = document.pref_email.clone();
    Ok(())
}
