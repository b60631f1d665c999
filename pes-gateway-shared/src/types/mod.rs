mod calendar;
mod change;
mod contact;
mod kind;
mod location;
mod lookup;
mod organization;
mod person;
mod product;
mod record;
mod role;

pub use calendar::{Calendar, Event, Occurrence};
pub use change::{ChangeEvent, Notify};
pub use contact::Contact;
pub use kind::{EntityKind, OwnerKind, OwnerRef};
pub use location::Location;
pub use lookup::{LegalStatus, TransverseTheme};
pub use organization::{Engagement, Organization};
pub use person::Person;
pub use product::{Exchange, ExchangeType, ExchangeWay, Product};
pub use record::{Model, Record};
pub use role::Role;
