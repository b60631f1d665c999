//! Mock PES client for testing and local development.
//!
//! The `MockPesClient` serves pre-registered collections and records every
//! call it receives, allowing tests to run without network access and to
//! assert on what would have been sent.
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::RemoteApi;
use crate::errors::ClientError;

/// A call received by [`MockPesClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Fetch {
        resource: String,
    },
    Push {
        resource: String,
        key: String,
        document: Value,
    },
    Remove {
        resource: String,
        key: String,
    },
}

/// Mock PES client returning pre-configured collections.
#[derive(Default)]
pub struct MockPesClient {
    resources: RwLock<HashMap<String, Vec<Value>>>,
    failing: RwLock<HashSet<String>>,
    calls: RwLock<Vec<RemoteCall>>,
}

impl MockPesClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the documents returned when fetching `resource`.
    pub fn set_resource(&self, resource: &str, documents: Vec<Value>) {
        write(&self.resources).insert(resource.to_string(), documents);
    }

    /// Makes every call on `resource` fail with a 500 status.
    pub fn fail_resource(&self, resource: &str) {
        write(&self.failing).insert(resource.to_string());
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        read(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        write(&self.calls).clear();
    }

    /// Keys pushed so far, as `(resource, key)` pairs in call order.
    pub fn pushed(&self) -> Vec<(String, String)> {
        read(&self.calls)
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Push { resource, key, .. } => Some((resource.clone(), key.clone())),
                _ => None,
            })
            .collect()
    }

    /// The last document pushed for `key`, if any.
    pub fn last_push(&self, key: &str) -> Option<Value> {
        read(&self.calls).iter().rev().find_map(|call| match call {
            RemoteCall::Push {
                key: pushed,
                document,
                ..
            } if pushed == key => Some(document.clone()),
            _ => None,
        })
    }

    pub fn removed(&self) -> Vec<(String, String)> {
        read(&self.calls)
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Remove { resource, key } => Some((resource.clone(), key.clone())),
                _ => None,
            })
            .collect()
    }

    fn check(&self, method: &'static str, resource: &str) -> Result<(), ClientError> {
        if read(&self.failing).contains(resource) {
            return Err(ClientError::Status {
                method,
                url: format!("mock://api/{resource}/"),
                status: 500,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteApi for MockPesClient {
    async fn fetch(&self, resource: &str) -> Result<Vec<Value>, ClientError> {
        write(&self.calls).push(RemoteCall::Fetch {
            resource: resource.to_string(),
        });
        self.check("GET", resource)?;
        Ok(read(&self.resources)
            .get(resource)
            .cloned()
            .unwrap_or_default())
    }

    async fn push(&self, resource: &str, key: &str, document: &Value) -> Result<(), ClientError> {
        write(&self.calls).push(RemoteCall::Push {
            resource: resource.to_string(),
            key: key.to_string(),
            document: document.clone(),
        });
        self.check("PUT", resource)
    }

    async fn remove(&self, resource: &str, key: &str) -> Result<(), ClientError> {
        write(&self.calls).push(RemoteCall::Remove {
            resource: resource.to_string(),
            key: key.to_string(),
        });
        self.check("DELETE", resource)
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
