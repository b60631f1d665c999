//! Identifier translation tables between the PES and the local store.
//!
//! Import translations map remote identifiers to local ones and are built
//! once per run, before the records that need them. Export translations go
//! the other way and are derived from a [`RemoteCatalog`] fetched lazily by
//! the exporter.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use pes_gateway_shared::types::{LegalStatus, Role};
use serde::Deserialize;
use serde_json::Value;

use crate::client::RemoteApi;
use crate::errors::ClientError;
use crate::serializer::parse_document;

/// Remote to local identifier tables used while importing.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    roles: HashMap<String, String>,
    legal_statuses: HashMap<String, String>,
    transverse_themes: HashMap<i64, i64>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a remote role identifier (uuid or slug) to a local role uuid.
    pub fn insert_role(&mut self, remote: impl Into<String>, local_uuid: impl Into<String>) {
        self.roles.insert(remote.into(), local_uuid.into());
    }

    pub fn insert_legal_status(
        &mut self,
        remote_slug: impl Into<String>,
        local_slug: impl Into<String>,
    ) {
        self.legal_statuses
            .insert(remote_slug.into(), local_slug.into());
    }

    pub fn insert_transverse_theme(&mut self, remote_id: i64, local_id: i64) {
        self.transverse_themes.insert(remote_id, local_id);
    }

    pub fn role(&self, remote: &str) -> Option<&str> {
        self.roles.get(remote).map(String::as_str)
    }

    pub fn legal_status(&self, remote_slug: &str) -> Option<&str> {
        self.legal_statuses.get(remote_slug).map(String::as_str)
    }

    pub fn transverse_theme(&self, remote_id: i64) -> Option<i64> {
        self.transverse_themes.get(&remote_id).copied()
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }
}

/// Local to remote identifier tables used while exporting.
#[derive(Debug, Clone, Default)]
pub struct ExportTranslations {
    roles: HashMap<String, String>,
    legal_statuses: HashMap<String, String>,
}

impl ExportTranslations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a local role uuid to the remote role uuid.
    pub fn insert_role(&mut self, local_uuid: impl Into<String>, remote_uuid: impl Into<String>) {
        self.roles.insert(local_uuid.into(), remote_uuid.into());
    }

    pub fn insert_legal_status(
        &mut self,
        local_slug: impl Into<String>,
        remote_slug: impl Into<String>,
    ) {
        self.legal_statuses
            .insert(local_slug.into(), remote_slug.into());
    }

    pub fn role(&self, local_uuid: &str) -> Option<&str> {
        self.roles.get(local_uuid).map(String::as_str)
    }

    pub fn legal_status(&self, local_slug: &str) -> Option<&str> {
        self.legal_statuses.get(local_slug).map(String::as_str)
    }
}

#[derive(Deserialize)]
struct RemoteRole {
    uuid: String,
    slug: String,
}

#[derive(Deserialize)]
struct RemoteLegalStatus {
    slug: String,
    label: String,
}

/// Snapshot of the PES lookup collections needed to export organizations.
#[derive(Debug, Clone)]
pub struct RemoteCatalog {
    roles_by_slug: HashMap<String, String>,
    legal_statuses_by_label: HashMap<String, String>,
    fetched_at: Instant,
}

impl RemoteCatalog {
    pub async fn fetch(api: &dyn RemoteApi) -> Result<Self, ClientError> {
        let roles = api.fetch("roles").await?;
        let legal_statuses = api.fetch("legal_statuses").await?;
        Ok(Self::from_documents(&roles, &legal_statuses))
    }

    /// Builds a catalog from raw documents, ignoring malformed entries.
    pub fn from_documents(roles: &[Value], legal_statuses: &[Value]) -> Self {
        let roles_by_slug = roles
            .iter()
            .filter_map(|document| parse_document::<RemoteRole>(document).ok())
            .map(|role| (role.slug, role.uuid))
            .collect();
        let legal_statuses_by_label = legal_statuses
            .iter()
            .filter_map(|document| parse_document::<RemoteLegalStatus>(document).ok())
            .map(|status| (status.label, status.slug))
            .collect();
        Self {
            roles_by_slug,
            legal_statuses_by_label,
            fetched_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }

    /// Joins the catalog with the local lookup rows: roles meet on their
    /// slug, legal statuses on their label.
    pub fn translations_for(
        &self,
        roles: &[Role],
        legal_statuses: &[LegalStatus],
    ) -> ExportTranslations {
        let mut translations = ExportTranslations::new();
        for role in roles {
            if let Some(remote) = self.roles_by_slug.get(&role.slug) {
                translations.insert_role(role.uuid.clone(), remote.clone());
            }
        }
        for status in legal_statuses {
            if let Some(remote) = self.legal_statuses_by_label.get(&status.label) {
                translations.insert_legal_status(status.slug.clone(), remote.clone());
            }
        }
        translations
    }
}
