use chrono::{DateTime, Utc};
use pes_gateway_shared::types::{Calendar, Event, Occurrence};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::SerializationError;
use crate::serializer::{dedup_keep_order, present, required, Document};

document_fields! {
    /// Selectable fields of a calendar document.
    CalendarField {
        Title => "title",
        Description => "description",
    }
}

document_fields! {
    /// Selectable fields of an event document.
    EventField {
        Title => "title",
        Description => "description",
        Calendar => "calendar",
        Organization => "organization",
        Organizations => "organizations",
        OtherOrganizations => "other_organizations",
        SourceInfo => "source_info",
        Occurrences => "occurrences",
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarDocument {
    pub uuid: String,
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OccurrenceDocument {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDocument {
    pub uuid: String,
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub calendar: Option<Option<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub organizations: Option<Vec<String>>,
    #[serde(default)]
    pub other_organizations: Option<String>,
    #[serde(default)]
    pub source_info: Option<String>,
    #[serde(default)]
    pub occurrences: Option<Vec<OccurrenceDocument>>,
}

pub fn serialize_calendar(calendar: &Calendar, fields: &[CalendarField]) -> Document {
    let mut document = Document::new();
    document.insert("uuid".to_string(), json!(calendar.uuid));
    for field in fields {
        let value = match field {
            CalendarField::Title => json!(calendar.title),
            CalendarField::Description => json!(calendar.description),
        };
        document.insert(field.as_str().to_string(), value);
    }
    document
}

pub fn deserialize_calendar(
    calendar: &mut Calendar,
    document: &CalendarDocument,
) -> Result<(), SerializationError> {
    calendar.uuid = document.uuid.clone();
    calendar.title = required(&document.title, "title")?;
    calendar.description = document.description.clone();
    Ok(())
}

pub fn serialize_event(event: &Event, fields: &[EventField]) -> Document {
    let mut document = Document::new();
    document.insert("uuid".to_string(), json!(event.uuid));
    for field in fields {
        let value = match field {
            EventField::Title => json!(event.title),
            EventField::Description => json!(event.description),
            EventField::Calendar => json!(event.calendar),
            EventField::Organization => json!(event.organization),
            EventField::Organizations => json!(event.organizations),
            EventField::OtherOrganizations => json!(event.other_organizations),
            EventField::SourceInfo => json!(event.source_info),
            EventField::Occurrences => Value::Array(
                event
                    .occurrences
                    .iter()
                    .map(|occurrence| {
                        json!({
                            "start_time": occurrence.start_time,
                            "end_time": occurrence.end_time,
                        })
                    })
                    .collect(),
            ),
        };
        document.insert(field.as_str().to_string(), value);
    }
    document
}

/// Maps a document onto `event`. Organization references are copied as
/// given and left for the caller to resolve.
pub fn deserialize_event(
    event: &mut Event,
    document: &EventDocument,
) -> Result<(), SerializationError> {
    event.uuid = document.uuid.clone();
    event.title = required(&document.title, "title")?;
    event.calendar = required(&document.calendar, "calendar")?;
    event.description = document.description.clone();
    event.organization = document.organization.clone();
    event.organizations = dedup_keep_order(document.organizations.as_deref().unwrap_or_default());
    event.other_organizations = document.other_organizations.clone();
    event.source_info = document.source_info.clone();
    event.occurrences = document
        .occurrences
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|occurrence| Occurrence {
            start_time: occurrence.start_time,
            end_time: occurrence.end_time,
        })
        .collect();
    Ok(())
}
