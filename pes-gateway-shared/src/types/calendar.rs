use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub uuid: String,
    pub title: String,
    pub description: Option<String>,
}

/// A dated event belonging to a calendar.
///
/// Occurrences are owned by the event and replaced with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub uuid: String,
    pub title: String,
    pub description: Option<String>,
    pub calendar: String,
    pub organization: Option<String>,
    pub organizations: Vec<String>,
    pub other_organizations: Option<String>,
    pub source_info: Option<String>,
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Occurrence {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
