use chrono::NaiveDate;
use pes_gateway_shared::types::{Exchange, ExchangeType, ExchangeWay, Product};
use serde::Deserialize;
use serde_json::json;

use crate::errors::SerializationError;
use crate::serializer::{dedup_keep_order, lenient_date, present, required, Document};

document_fields! {
    ProductField {
        Title => "title",
        Description => "description",
        Organization => "organization",
    }
}

document_fields! {
    ExchangeField {
        Title => "title",
        Permanent => "permanent",
        Eway => "eway",
        Etype => "etype",
        Expiration => "expiration",
        Description => "description",
        Person => "person",
        Organization => "organization",
        Products => "products",
        Methods => "methods",
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductDocument {
    pub uuid: String,
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeDocument {
    pub uuid: String,
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default)]
    pub permanent: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub eway: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub etype: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub expiration: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub person: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<String>>,
    #[serde(default)]
    pub methods: Option<Vec<i64>>,
}

pub fn serialize_product(product: &Product, fields: &[ProductField]) -> Document {
    let mut document = Document::new();
    document.insert("uuid".to_string(), json!(product.uuid));
    for field in fields {
        let value = match field {
            ProductField::Title => json!(product.title),
            ProductField::Description => json!(product.description),
            ProductField::Organization => json!(product.organization),
        };
        document.insert(field.as_str().to_string(), value);
    }
    document
}

pub fn deserialize_product(
    product: &mut Product,
    document: &ProductDocument,
) -> Result<(), SerializationError> {
    product.uuid = document.uuid.clone();
    product.title = required(&document.title, "title")?;
    product.description = document.description.clone();
    product.organization = document.organization.clone();
    Ok(())
}

pub fn serialize_exchange(exchange: &Exchange, fields: &[ExchangeField]) -> Document {
    let mut document = Document::new();
    document.insert("uuid".to_string(), json!(exchange.uuid));
    for field in fields {
        let value = match field {
            ExchangeField::Title => json!(exchange.title),
            ExchangeField::Permanent => json!(exchange.permanent),
            ExchangeField::Eway => json!(exchange.eway.as_str()),
            ExchangeField::Etype => json!(exchange.etype.as_str()),
            ExchangeField::Expiration => json!(exchange.expiration),
            ExchangeField::Description => json!(exchange.description),
            ExchangeField::Person => json!(exchange.person),
            ExchangeField::Organization => json!(exchange.organization),
            ExchangeField::Products => json!(exchange.products),
            ExchangeField::Methods => json!(exchange.methods),
        };
        document.insert(field.as_str().to_string(), value);
    }
    document
}

pub fn deserialize_exchange(
    exchange: &mut Exchange,
    document: &ExchangeDocument,
) -> Result<(), SerializationError> {
    let eway = required(&document.eway, "eway")?;
    let etype = required(&document.etype, "etype")?;

    exchange.uuid = document.uuid.clone();
    exchange.title = required(&document.title, "title")?;
    exchange.eway = ExchangeWay::parse(&eway).ok_or(SerializationError::UnknownValue {
        field: "eway",
        value: eway.clone(),
    })?;
    exchange.etype = ExchangeType::parse(&etype).ok_or(SerializationError::UnknownValue {
        field: "etype",
        value: etype.clone(),
    })?;
    exchange.permanent = document.permanent.unwrap_or_default();
    exchange.expiration = document.expiration;
    exchange.description = document.description.clone();
    exchange.person = document.person.clone();
    exchange.organization = document.organization.clone();
    exchange.products = dedup_keep_order(document.products.as_deref().unwrap_or_default());
    exchange.methods = dedup_keep_order(document.methods.as_deref().unwrap_or_default());
    Ok(())
}
