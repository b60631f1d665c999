use serde::{Deserialize, Serialize};

use crate::types::{
    Calendar, EntityKind, Event, Exchange, Location, Organization, Person, Product, Role,
};

/// Any synchronized entity, as handed to and returned by the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Role(Role),
    Person(Person),
    Organization(Organization),
    Calendar(Calendar),
    Event(Event),
    Product(Product),
    Exchange(Exchange),
    Location(Location),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Role(_) => EntityKind::Role,
            Record::Person(_) => EntityKind::Person,
            Record::Organization(_) => EntityKind::Organization,
            Record::Calendar(_) => EntityKind::Calendar,
            Record::Event(_) => EntityKind::Event,
            Record::Product(_) => EntityKind::Product,
            Record::Exchange(_) => EntityKind::Exchange,
            Record::Location(_) => EntityKind::Location,
        }
    }

    /// External identifier: the slug for roles, the uuid for everything else.
    pub fn key(&self) -> &str {
        match self {
            Record::Role(role) => &role.slug,
            Record::Person(person) => &person.uuid,
            Record::Organization(organization) => &organization.uuid,
            Record::Calendar(calendar) => &calendar.uuid,
            Record::Event(event) => &event.uuid,
            Record::Product(product) => &product.uuid,
            Record::Exchange(exchange) => &exchange.uuid,
            Record::Location(location) => &location.uuid,
        }
    }
}

/// A concrete entity type that can be wrapped into and extracted from a
/// [`Record`].
pub trait Model: Clone + Into<Record> + TryFrom<Record, Error = Record> + Send + Sync {
    const KIND: EntityKind;

    fn key(&self) -> &str;
}

macro_rules! impl_model {
    ($model:ident, $key:ident) => {
        impl From<$model> for Record {
            fn from(value: $model) -> Self {
                Record::$model(value)
            }
        }

        impl TryFrom<Record> for $model {
            type Error = Record;

            fn try_from(record: Record) -> Result<Self, Self::Error> {
                match record {
                    Record::$model(value) => Ok(value),
                    other => Err(other),
                }
            }
        }

        impl Model for $model {
            const KIND: EntityKind = EntityKind::$model;

            fn key(&self) -> &str {
                &self.$key
            }
        }
    };
}

impl_model!(Role, slug);
impl_model!(Person, uuid);
impl_model!(Organization, uuid);
impl_model!(Calendar, uuid);
impl_model!(Event, uuid);
impl_model!(Product, uuid);
impl_model!(Exchange, uuid);
impl_model!(Location, uuid);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_follows_kind() {
        let role: Record = Role {
            uuid: "r-1".into(),
            slug: "president".into(),
            label: "President".into(),
        }
        .into();
        assert_eq!(role.kind(), EntityKind::Role);
        assert_eq!(role.key(), "president");

        let organization: Record = Organization::new("o-1", "Coop").into();
        assert_eq!(organization.kind(), EntityKind::Organization);
        assert_eq!(organization.key(), "o-1");
    }

    #[test]
    fn test_try_from_returns_the_record_on_kind_mismatch() {
        let record: Record = Person::new("p-1", "Ada", "Lovelace").into();
        let result = Organization::try_from(record.clone());
        assert_eq!(result, Err(record));
    }
}
