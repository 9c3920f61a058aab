//! Shipping quotes by postal code.
//!
//! Rates are a fixed table; the address lookup only confirms the postal code exists.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::value_objects::{Money, PostalCode};
use crate::{Result, StorefrontError};

#[derive(Error, Debug)]
pub enum ShippingError {
    #[error("address lookup failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingOption {
    pub name: &'static str,
    pub price: Money,
    pub days: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuote {
    pub zip_code: String,
    pub address: Value,
    pub options: Vec<ShippingOption>,
}

pub fn standard_options() -> Vec<ShippingOption> {
    vec![
        ShippingOption { name: "Entrega padrão", price: Money::from_cents(1590), days: "5-8 dias úteis" },
        ShippingOption { name: "Entrega expressa", price: Money::from_cents(2990), days: "2-3 dias úteis" },
    ]
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// The address payload for `zip`, or `None` when the code does not exist.
    async fn lookup(&self, zip: &PostalCode) -> std::result::Result<Option<Value>, ShippingError>;
}

/// ViaCEP public postal-code API.
#[derive(Debug, Clone)]
pub struct ViaCep {
    client: reqwest::Client,
    base_url: String,
}

impl ViaCep {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into().trim_end_matches('/').to_string() }
    }
}

#[async_trait]
impl AddressLookup for ViaCep {
    async fn lookup(&self, zip: &PostalCode) -> std::result::Result<Option<Value>, ShippingError> {
        let body: Value = self.client
            .get(format!("{}/ws/{}/json/", self.base_url, zip.as_str()))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let missing = body.get("erro").is_some_and(|v| v.as_bool() == Some(true) || v.as_str() == Some("true"));
        Ok((!missing).then_some(body))
    }
}

#[derive(Clone)]
pub struct ShippingQuoter {
    lookup: Arc<dyn AddressLookup>,
}

impl ShippingQuoter {
    pub fn new(lookup: Arc<dyn AddressLookup>) -> Self { Self { lookup } }

    pub async fn address(&self, raw_zip: &str) -> Result<Value> {
        let zip = PostalCode::parse(raw_zip).ok_or(StorefrontError::PostalCodeNotFound)?;
        self.lookup.lookup(&zip).await?.ok_or(StorefrontError::PostalCodeNotFound)
    }

    pub async fn quote(&self, raw_zip: &str) -> Result<ShippingQuote> {
        let zip = PostalCode::parse(raw_zip)
            .ok_or_else(|| StorefrontError::Validation("zipCode must have 8 digits".into()))?;
        let address = self.lookup.lookup(&zip).await?.ok_or(StorefrontError::PostalCodeNotFound)?;
        Ok(ShippingQuote { zip_code: zip.as_str().to_string(), address, options: standard_options() })
    }
}
