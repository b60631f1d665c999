use serde::{Deserialize, Serialize};

/// A local person record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub uuid: String,
    pub first_name: String,
    pub last_name: String,
    pub pref_email: Option<String>,
}

impl Person {
    pub fn new(
        uuid: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            pref_email: None,
        }
    }
}
