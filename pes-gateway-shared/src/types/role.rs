use serde::{Deserialize, Serialize};

/// A role a person can hold in an organization. Roles are matched across
/// systems by `slug`; the `uuid` differs between the two sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub uuid: String,
    pub slug: String,
    pub label: String,
}
