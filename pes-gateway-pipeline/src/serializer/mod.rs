//! Pure mapping between local records and PES documents.
//!
//! `serialize_<kind>` emits the external identifier plus exactly the
//! requested fields, with references written as external identifiers.
//! `deserialize_<kind>` maps a parsed document onto a record; it is
//! defaulting, so a field absent from the document resets the attribute to
//! its default.
use chrono::NaiveDate;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::SerializationError;

/// A serialized record, as sent to the PES.
pub type Document = serde_json::Map<String, Value>;

/// Declares the selectable fields of one document type.
macro_rules! document_fields {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $field:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every field, which is also the default selection.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $field),+
                }
            }
        }
    };
}

mod calendar;
mod contact;
mod location;
mod organization;
mod person;
mod product;
mod role;

pub use calendar::{
    deserialize_calendar, deserialize_event, serialize_calendar, serialize_event,
    CalendarDocument, CalendarField, EventDocument, EventField, OccurrenceDocument,
};
pub use contact::{serialize_contact, ContactDocument};
pub use location::{deserialize_location, serialize_location, LocationDocument, LocationField};
pub use organization::{
    deserialize_organization, serialize_organization, MemberDocument, OrganizationDocument,
    OrganizationField, OrganizationView,
};
pub use person::{deserialize_person, serialize_person, PersonDocument, PersonField, PersonView};
pub use product::{
    deserialize_exchange, deserialize_product, serialize_exchange, serialize_product,
    ExchangeDocument, ExchangeField, ProductDocument, ProductField,
};
pub use role::{deserialize_role, serialize_role, RoleDocument};

/// Parses a raw PES document into its typed form.
pub fn parse_document<T: DeserializeOwned>(value: &Value) -> Result<T, SerializationError> {
    Ok(T::deserialize(value)?)
}

/// Reads the external identifier of a raw document.
pub fn document_key<'a>(value: &'a Value, key_field: &str) -> Option<&'a str> {
    value.get(key_field).and_then(Value::as_str)
}

/// Distinguishes an explicit `null` from an absent field: used with
/// `#[serde(default)]` on an `Option<Option<T>>`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub(crate) fn required(
    value: &Option<Option<String>>,
    field: &'static str,
) -> Result<String, SerializationError> {
    match value {
        None => Err(SerializationError::MissingField(field)),
        Some(None) => Err(SerializationError::NullField(field)),
        Some(Some(value)) => Ok(value.clone()),
    }
}

/// Accepts a date or a date-time, keeping the date part.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("invalid date `{raw}`")))
}

/// Accepts a string or a number, keeping its textual form.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(Value::Number(value)) => Ok(Some(value.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or a number, got {other}"
        ))),
    }
}

/// Drops repeated entries, keeping the first occurrence.
pub(crate) fn dedup_keep_order<T: PartialEq + Clone>(values: &[T]) -> Vec<T> {
    let mut result: Vec<T> = Vec::with_capacity(values.len());
    for value in values {
        if !result.contains(value) {
            result.push(value.clone());
        }
    }
    result
}
