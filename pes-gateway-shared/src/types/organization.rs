use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A local organization record.
///
/// References to other rows are held by their external identifier: contacts
/// by uuid, the legal status by its local slug, transverse themes by local id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub uuid: String,
    pub title: String,
    pub description: Option<String>,
    pub acronym: Option<String>,
    pub testimony: String,
    pub annual_revenue: Option<i64>,
    pub workforce: Option<String>,
    pub birth: Option<NaiveDate>,
    pub web: Option<String>,
    pub legal_status: Option<String>,
    pub pref_email: Option<String>,
    pub pref_phone: Option<String>,
    pub transverse_themes: Vec<i64>,
}

impl Organization {
    pub fn new(uuid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}

/// One person's role within an organization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Engagement {
    pub organization: String,
    pub person: String,
    /// Local role uuid, if the role could be resolved.
    pub role: Option<String>,
    pub role_detail: Option<String>,
}
