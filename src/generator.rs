//! Template generation for a (trade, GFA) pair.
//!
//! A remote generator can be configured. It receives the trade, area and
//! project context and returns an itemized list. Whenever it is unavailable
//! or returns nothing usable, the built-in catalog is used instead.

use std::time::Duration;

use anyhow::Context;
use keystone_core::catalog::catalog_template;
use keystone_core::models::{NewTemplateItem, Trade};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub enum TemplateGenerator {
    Catalog,
    Remote { client: reqwest::Client, url: String },
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    trade: &'a str,
    gfa_sqft: f64,
    context: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    items: Vec<NewTemplateItem>,
}

/// Where a generated template came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    Catalog,
    Remote,
}

impl TemplateGenerator {
    pub fn remote(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::Remote {
            client,
            url: url.into(),
        })
    }

    pub async fn generate(
        &self,
        trade: Trade,
        gfa_sqft: f64,
        context: &serde_json::Value,
    ) -> (Vec<NewTemplateItem>, TemplateSource) {
        match self {
            Self::Catalog => (catalog_template(trade, gfa_sqft), TemplateSource::Catalog),
            Self::Remote { client, url } => {
                match fetch_remote(client, url, trade, gfa_sqft, context).await {
                    Ok(items) => (items, TemplateSource::Remote),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            trade = trade.as_str(),
                            "remote template generation failed, using catalog"
                        );
                        (catalog_template(trade, gfa_sqft), TemplateSource::Catalog)
                    }
                }
            }
        }
    }
}

async fn fetch_remote(
    client: &reqwest::Client,
    url: &str,
    trade: Trade,
    gfa_sqft: f64,
    context: &serde_json::Value,
) -> anyhow::Result<Vec<NewTemplateItem>> {
    let response = client
        .post(url)
        .json(&GenerateRequest {
            trade: trade.as_str(),
            gfa_sqft,
            context,
        })
        .send()
        .await
        .context("template generator request failed")?
        .error_for_status()
        .context("template generator returned an error status")?;

    let body: GenerateResponse = response
        .json()
        .await
        .context("template generator returned malformed JSON")?;

    let items: Vec<NewTemplateItem> = body
        .items
        .into_iter()
        .filter(|i| !i.name.trim().is_empty() && i.base_quantity >= 0.0 && i.unit_price >= 0.0)
        .collect();
    anyhow::ensure!(!items.is_empty(), "template generator returned no usable items");

    tracing::info!(trade = trade.as_str(), items = items.len(), "remote template generated");
    Ok(items)
}
