//! HTTP client for the PES API.
//!
//! This module provides:
//! - [`RemoteApi`] trait abstracting PES access
//! - [`PesClient`] production client over `reqwest`
//! - [`MockPesClient`] in-memory client for tests, recording every call
//! - [`PushStyle`] selecting how records are written to the PES
mod mock;

pub use mock::{MockPesClient, RemoteCall};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method, Response};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::errors::ClientError;

/// Trait for reading from and writing to the PES.
///
/// Resources are collection names such as `organizations` or
/// `legal_statuses`; keys are external identifiers.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Fetches the full collection as a list of JSON documents.
    async fn fetch(&self, resource: &str) -> Result<Vec<Value>, ClientError>;

    /// Creates or replaces one record.
    async fn push(&self, resource: &str, key: &str, document: &Value) -> Result<(), ClientError>;

    /// Removes one record.
    async fn remove(&self, resource: &str, key: &str) -> Result<(), ClientError>;
}

/// How records are written to the PES.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PushStyle {
    /// `PUT api/<resource>/<uuid>/?api_key=<key>`, `DELETE` likewise.
    #[default]
    PerRecord,
    /// `PUT api/<resource>/` with the record as body, `DELETE api/<resource>/<uuid>/`.
    Collection,
}

impl FromStr for PushStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "per-record" => Ok(PushStyle::PerRecord),
            "collection" => Ok(PushStyle::Collection),
            other => Err(format!(
                "unknown push style `{other}`, expected `per-record` or `collection`"
            )),
        }
    }
}

impl fmt::Display for PushStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushStyle::PerRecord => f.write_str("per-record"),
            PushStyle::Collection => f.write_str("collection"),
        }
    }
}

/// Production client talking to a PES instance over HTTP.
pub struct PesClient {
    base: Url,
    api_key: Option<String>,
    style: PushStyle,
    client: ReqwestClient,
}

impl PesClient {
    /// Creates a client for the PES at `host`.
    ///
    /// The per-record push style authenticates with `api_key`, so it is
    /// required there.
    pub fn new(host: &str, api_key: Option<String>, style: PushStyle) -> Result<Self, ClientError> {
        if style == PushStyle::PerRecord && api_key.is_none() {
            return Err(ClientError::MissingApiKey);
        }
        let mut base = Url::parse(host)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            api_key,
            style,
            client: ReqwestClient::new(),
        })
    }

    pub fn style(&self) -> PushStyle {
        self.style
    }

    fn collection_url(&self, resource: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(&format!("api/{resource}/"))?)
    }

    fn record_url(&self, resource: &str, key: &str) -> Result<Url, ClientError> {
        let mut url = self.base.join(&format!("api/{resource}/{key}/"))?;
        if self.style == PushStyle::PerRecord {
            let api_key = self.api_key.as_deref().ok_or(ClientError::MissingApiKey)?;
            url.query_pairs_mut().append_pair("api_key", api_key);
        }
        Ok(url)
    }

    fn write_url(&self, resource: &str, key: &str) -> Result<Url, ClientError> {
        match self.style {
            PushStyle::PerRecord => self.record_url(resource, key),
            PushStyle::Collection => self.collection_url(resource),
        }
    }
}

fn check_status(method: &'static str, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            method,
            url: redact(response.url()),
            status: status.as_u16(),
        })
    }
}

/// Strips the query string, which may hold the API key.
fn redact(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

#[async_trait]
impl RemoteApi for PesClient {
    async fn fetch(&self, resource: &str) -> Result<Vec<Value>, ClientError> {
        let url = self.collection_url(resource)?;
        debug!(url = %url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        let response = check_status("GET", response)?;
        let body: Value = response.json().await?;
        match body {
            Value::Array(documents) => Ok(documents),
            other => Err(ClientError::InvalidBody {
                url: url.to_string(),
                reason: format!("expected a JSON array, got {}", json_type(&other)),
            }),
        }
    }

    async fn push(&self, resource: &str, key: &str, document: &Value) -> Result<(), ClientError> {
        let url = self.write_url(resource, key)?;
        debug!(url = %redact(&url), key, "PUT");
        let response = self
            .client
            .request(Method::PUT, url)
            .json(document)
            .send()
            .await
            .map_err(|err| ClientError::Http(err.without_url()))?;
        check_status("PUT", response)?;
        Ok(())
    }

    async fn remove(&self, resource: &str, key: &str) -> Result<(), ClientError> {
        let url = self.record_url(resource, key)?;
        debug!(url = %redact(&url), key, "DELETE");
        let response = self
            .client
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(|err| ClientError::Http(err.without_url()))?;
        check_status("DELETE", response)?;
        Ok(())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_record_urls_carry_the_api_key() {
        let client = PesClient::new(
            "http://pes.local",
            Some("secret".into()),
            PushStyle::PerRecord,
        )
        .unwrap();

        let url = client.write_url("organizations", "o-1").unwrap();

        assert_eq!(
            url.as_str(),
            "http://pes.local/api/organizations/o-1/?api_key=secret"
        );
        assert_eq!(redact(&url), "http://pes.local/api/organizations/o-1/");
    }

    #[test]
    fn test_collection_style_writes_to_the_collection() {
        let client = PesClient::new("http://pes.local/base", None, PushStyle::Collection).unwrap();

        assert_eq!(
            client.write_url("persons", "p-1").unwrap().as_str(),
            "http://pes.local/base/api/persons/"
        );
        assert_eq!(
            client.record_url("persons", "p-1").unwrap().as_str(),
            "http://pes.local/base/api/persons/p-1/"
        );
    }

    #[test]
    fn test_per_record_style_requires_an_api_key() {
        let result = PesClient::new("http://pes.local", None, PushStyle::PerRecord);
        assert!(matches!(result, Err(ClientError::MissingApiKey)));
    }

    #[test]
    fn test_push_style_parses_from_configuration() {
        assert_eq!("per-record".parse::<PushStyle>(), Ok(PushStyle::PerRecord));
        assert_eq!("collection".parse::<PushStyle>(), Ok(PushStyle::Collection));
        assert!("batch".parse::<PushStyle>().is_err());
    }
}
