use serde::{Deserialize, Serialize};

/// Legal status of an organization. Both sides agree on labels; slugs may
/// differ and are translated by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalStatus {
    pub slug: String,
    pub label: String,
}

/// Theme an organization can be tagged with. Ids are local to each side and
/// translated by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransverseTheme {
    pub id: i64,
    pub name: String,
}
