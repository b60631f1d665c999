//! # PES Gateway Shared
//! This crate defines the domain types shared across the PES gateway: the
//! synchronized entities, the `Record` sum type the store persists, the tagged
//! owner reference used by contacts, and the change events the store emits.
pub mod types;
