use async_trait::async_trait;
use pes_gateway_repository::StoreSession;
use pes_gateway_shared::types::{EntityKind, Exchange, Product, Record};
use serde_json::Value;

use crate::errors::RecordError;
use crate::importer::handlers::{existing_references, optional_reference};
use crate::importer::ImportHandler;
use crate::serializer::{
    deserialize_exchange, deserialize_product, parse_document, ExchangeDocument, ProductDocument,
};
use crate::translations::Translations;

pub struct ProductHandler;

#[async_trait]
impl ImportHandler for ProductHandler {
    fn kind(&self) -> EntityKind {
        EntityKind::Product
    }

    async fn map(
        &self,
        session: &mut dyn StoreSession,
        document: &Value,
        _translations: &Translations,
    ) -> Result<Record, RecordError> {
        let document: ProductDocument = parse_document(document)?;
        let mut product = Product::default();
        deserialize_product(&mut product, &document)?;
        product.organization = optional_reference(
            session,
            EntityKind::Organization,
            product.organization.take(),
            &product.uuid,
        )
        .await?;
        Ok(product.into())
    }
}

pub struct ExchangeHandler;

#[async_trait]
impl ImportHandler for ExchangeHandler {
    fn kind(&self) -> EntityKind {
        EntityKind::Exchange
    }

    async fn map(
        &self,
        session: &mut dyn StoreSession,
        document: &Value,
        _translations: &Translations,
    ) -> Result<Record, RecordError> {
        let document: ExchangeDocument = parse_document(document)?;
        let mut exchange = Exchange::default();
        deserialize_exchange(&mut exchange, &document)?;
        exchange.person = optional_reference(
            session,
            EntityKind::Person,
            exchange.person.take(),
            &exchange.uuid,
        )
        .await?;
        exchange.organization = optional_reference(
            session,
            EntityKind::Organization,
            exchange.organization.take(),
            &exchange.uuid,
        )
        .await?;
        exchange.products = existing_references(
            session,
            EntityKind::Product,
            std::mem::take(&mut exchange.products),
            &exchange.uuid,
        )
        .await?;
        Ok(exchange.into())
    }
}
