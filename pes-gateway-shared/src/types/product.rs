use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub uuid: String,
    pub title: String,
    pub description: Option<String>,
    pub organization: Option<String>,
}

/// Direction of an exchange, sent over the wire as its constant name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeWay {
    #[default]
    Offer,
    Need,
}

impl ExchangeWay {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeWay::Offer => "OFFER",
            ExchangeWay::Need => "NEED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OFFER" => Some(ExchangeWay::Offer),
            "NEED" => Some(ExchangeWay::Need),
            _ => None,
        }
    }
}

impl fmt::Display for ExchangeWay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is being exchanged, sent over the wire as its constant name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeType {
    #[default]
    #[serde(rename = "PROD")]
    Product,
    #[serde(rename = "SERVICE")]
    Service,
    #[serde(rename = "SKILL")]
    Skill,
    #[serde(rename = "MATERIAL")]
    Material,
}

impl ExchangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeType::Product => "PROD",
            ExchangeType::Service => "SERVICE",
            ExchangeType::Skill => "SKILL",
            ExchangeType::Material => "MATERIAL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PROD" => Some(ExchangeType::Product),
            "SERVICE" => Some(ExchangeType::Service),
            "SKILL" => Some(ExchangeType::Skill),
            "MATERIAL" => Some(ExchangeType::Material),
            _ => None,
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An offer or need published by a person or an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub uuid: String,
    pub title: String,
    pub permanent: bool,
    pub expiration: Option<NaiveDate>,
    pub description: Option<String>,
    pub eway: ExchangeWay,
    pub etype: ExchangeType,
    pub person: Option<String>,
    pub organization: Option<String>,
    pub products: Vec<String>,
    pub methods: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_constants_match_their_wire_names() {
        for way in [ExchangeWay::Offer, ExchangeWay::Need] {
            let json = serde_json::to_value(way).unwrap();
            assert_eq!(json, serde_json::json!(way.as_str()));
            assert_eq!(ExchangeWay::parse(way.as_str()), Some(way));
        }
        for etype in [
            ExchangeType::Product,
            ExchangeType::Service,
            ExchangeType::Skill,
            ExchangeType::Material,
        ] {
            let json = serde_json::to_value(etype).unwrap();
            assert_eq!(json, serde_json::json!(etype.as_str()));
            assert_eq!(ExchangeType::parse(etype.as_str()), Some(etype));
        }
    }

    #[test]
    fn test_unknown_exchange_constants_are_rejected() {
        assert_eq!(ExchangeWay::parse("GIFT"), None);
        assert_eq!(ExchangeType::parse("prod"), None);
    }
}
