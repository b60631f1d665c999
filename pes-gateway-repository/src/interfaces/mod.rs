//! This module defines and re-exports the interfaces of the local store.
//! It serves as a central point for accessing traits related to data interaction.
mod observer;
mod store;

pub use observer::{ChangeObserver, ObserverId, ObserverRegistry};
pub use store::{find_model, LocalStore, StoreSession};
