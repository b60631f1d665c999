//! Import handlers, one per synchronized entity kind.
mod calendar;
mod location;
mod organization;
mod person;
mod product;
mod role;

pub use calendar::{CalendarHandler, EventHandler};
pub use location::LocationHandler;
pub use organization::OrganizationHandler;
pub use person::PersonHandler;
pub use product::{ExchangeHandler, ProductHandler};
pub use role::RoleHandler;

use pes_gateway_repository::StoreSession;
use pes_gateway_shared::types::EntityKind;
use tracing::warn;

use crate::errors::RecordError;

/// Keeps an optional reference only if the referenced record exists.
pub(crate) async fn optional_reference(
    session: &mut dyn StoreSession,
    kind: EntityKind,
    key: Option<String>,
    referrer: &str,
) -> Result<Option<String>, RecordError> {
    let Some(key) = key else {
        return Ok(None);
    };
    if session.find(kind, &key).await?.is_some() {
        return Ok(Some(key));
    }
    warn!(referrer, kind = %kind, key = %key, "Unknown reference, leaving it empty");
    Ok(None)
}

/// Keeps the references of a list whose target exists, dropping the others.
pub(crate) async fn existing_references(
    session: &mut dyn StoreSession,
    kind: EntityKind,
    keys: Vec<String>,
    referrer: &str,
) -> Result<Vec<String>, RecordError> {
    let mut kept = Vec::with_capacity(keys.len());
    for key in keys {
        if let Some(key) = optional_reference(session, kind, Some(key), referrer).await? {
            kept.push(key);
        }
    }
    Ok(kept)
}

/// Fails unless the required reference exists.
pub(crate) async fn required_reference(
    session: &mut dyn StoreSession,
    kind: EntityKind,
    key: &str,
) -> Result<(), RecordError> {
    match session.find(kind, key).await? {
        Some(_) => Ok(()),
        None => Err(RecordError::ReferenceNotFound {
            kind,
            key: key.to_string(),
        }),
    }
}
