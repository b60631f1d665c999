use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of entity the gateway keeps in sync with the PES.
///
/// Each kind maps to one remote resource collection and one ownership marker
/// table. The declaration order is the order a full import walks them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Role,
    Person,
    Organization,
    Calendar,
    Event,
    Product,
    Exchange,
    Location,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Role,
        EntityKind::Person,
        EntityKind::Organization,
        EntityKind::Calendar,
        EntityKind::Event,
        EntityKind::Product,
        EntityKind::Exchange,
        EntityKind::Location,
    ];

    /// Kinds pushed to the PES, in dependency order.
    pub const EXPORTED: [EntityKind; 7] = [
        EntityKind::Location,
        EntityKind::Person,
        EntityKind::Organization,
        EntityKind::Calendar,
        EntityKind::Event,
        EntityKind::Product,
        EntityKind::Exchange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Role => "role",
            EntityKind::Person => "person",
            EntityKind::Organization => "organization",
            EntityKind::Calendar => "calendar",
            EntityKind::Event => "event",
            EntityKind::Product => "product",
            EntityKind::Exchange => "exchange",
            EntityKind::Location => "location",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        EntityKind::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Name of the remote collection, as in `api/<resource>/`.
    pub fn resource(&self) -> &'static str {
        match self {
            EntityKind::Role => "roles",
            EntityKind::Person => "persons",
            EntityKind::Organization => "organizations",
            EntityKind::Calendar => "calendars",
            EntityKind::Event => "events",
            EntityKind::Product => "products",
            EntityKind::Exchange => "exchanges",
            EntityKind::Location => "locations",
        }
    }

    /// Side table holding the ownership markers of this kind.
    pub fn marker_table(&self) -> &'static str {
        match self {
            EntityKind::Role => "foreign_roles",
            EntityKind::Person => "foreign_persons",
            EntityKind::Organization => "foreign_organizations",
            EntityKind::Calendar => "foreign_calendars",
            EntityKind::Event => "foreign_events",
            EntityKind::Product => "foreign_products",
            EntityKind::Exchange => "foreign_exchanges",
            EntityKind::Location => "foreign_locations",
        }
    }

    /// Document field carrying the external identifier.
    pub fn key_field(&self) -> &'static str {
        match self {
            EntityKind::Role => "slug",
            _ => "uuid",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Entity kinds that may own contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    Organization,
    Person,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Organization => "organization",
            OwnerKind::Person => "person",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "organization" => Some(OwnerKind::Organization),
            "person" => Some(OwnerKind::Person),
            _ => None,
        }
    }
}

impl From<OwnerKind> for EntityKind {
    fn from(kind: OwnerKind) -> Self {
        match kind {
            OwnerKind::Organization => EntityKind::Organization,
            OwnerKind::Person => EntityKind::Person,
        }
    }
}

/// Tagged reference from a contact to the entity owning it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: OwnerKind,
    pub key: String,
}

impl OwnerRef {
    pub fn organization(key: impl Into<String>) -> Self {
        Self {
            kind: OwnerKind::Organization,
            key: key.into(),
        }
    }

    pub fn person(key: impl Into<String>) -> Self {
        Self {
            kind: OwnerKind::Person,
            key: key.into(),
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_are_keyed_by_slug() {
        assert_eq!(EntityKind::Role.key_field(), "slug");
        assert_eq!(EntityKind::Organization.key_field(), "uuid");
    }

    #[test]
    fn test_import_order_puts_roles_and_persons_before_organizations() {
        let position = |kind| EntityKind::ALL.iter().position(|k| *k == kind).unwrap();
        assert!(position(EntityKind::Role) < position(EntityKind::Organization));
        assert!(position(EntityKind::Person) < position(EntityKind::Organization));
        assert!(position(EntityKind::Calendar) < position(EntityKind::Event));
    }

    #[test]
    fn test_roles_are_not_exported() {
        assert!(!EntityKind::EXPORTED.contains(&EntityKind::Role));
    }

    #[test]
    fn test_owner_kind_round_trips_through_its_name() {
        for kind in [OwnerKind::Organization, OwnerKind::Person] {
            assert_eq!(OwnerKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(OwnerKind::parse("calendar"), None);
    }

    #[test]
    fn test_entity_kind_parses_its_name_not_its_resource() {
        assert_eq!(EntityKind::parse("exchange"), Some(EntityKind::Exchange));
        assert_eq!(EntityKind::parse("exchanges"), None);
    }
}
