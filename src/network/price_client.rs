//! HTTP price source for pull-based quotes

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use crate::{
    config::FeedConfig,
    errors::{BotError, BotResult},
    network::retry::RetryPolicy,
    types::{Asset, Quote, Venue, DEFAULT_QUOTE_CONFIDENCE},
    utils::time::from_unix,
};

/// Anything that can answer "what is the price of `asset` on `venue`".
/// `None` means no data, whatever the underlying cause.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self, asset: &Asset, venue: &Venue) -> Option<Quote>;
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: Decimal,
    #[serde(default)]
    volume_24h: Option<Decimal>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    timestamp: Option<f64>,
}

pub struct HttpPriceClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    retry: RetryPolicy,
}

impl HttpPriceClient {
    pub fn new(base_url: &str, api_key: &str, retry: RetryPolicy) -> BotResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| BotError::Configuration {
            field: "PRICE_API_URL".to_string(),
            message: format!("invalid URL {}: {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BotError::configuration("PRICE_API_URL", "URL cannot be used as a base"));
        }

        let client = reqwest::Client::builder()
            .timeout(retry.attempt_timeout + Duration::from_secs(1))
            .build()
            .map_err(|e| {
                warn!("⚠️ Failed to initialize HTTP client: {}", e);
                BotError::Transport {
                    message: "Failed to build HTTP client".to_string(),
                    source: Some(e.into()),
                }
            })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            retry,
        })
    }

    pub fn from_config(config: &FeedConfig) -> BotResult<Self> {
        let url = config
            .price_api_url
            .as_deref()
            .ok_or_else(|| BotError::configuration("PRICE_API_URL", "price API URL is required"))?;
        let key = config
            .price_api_key
            .as_deref()
            .ok_or_else(|| BotError::configuration("PRICE_API_KEY", "price API key is required"))?;
        Self::new(url, key, RetryPolicy::from_config(config))
    }

    /// `{base}/price/{asset}/{venue}`, each segment percent-encoded.
    pub fn price_url(&self, asset: &Asset, venue: &Venue) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("price")
                .push(&asset.to_string())
                .push(venue.as_str());
        }
        url
    }

    /// One attempt, no retries.
    pub async fn fetch_once(&self, asset: &Asset, venue: &Venue) -> Result<Quote> {
        let url = self.price_url(asset, venue);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .send()
            .await
            .context("HTTP request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("price API error: {} - {}", status, body));
        }

        let body: PriceResponse = response
            .json()
            .await
            .context("Failed to parse price response")?;

        let observed_at = body.timestamp.and_then(from_unix).unwrap_or_else(Utc::now);
        let confidence = body
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(DEFAULT_QUOTE_CONFIDENCE);

        Ok(Quote::new(asset.clone(), venue.clone(), body.price, observed_at)
            .with_volume(body.volume_24h.unwrap_or(Decimal::ZERO))
            .with_confidence(confidence))
    }
}

#[async_trait]
impl PriceSource for HttpPriceClient {
    async fn fetch_price(&self, asset: &Asset, venue: &Venue) -> Option<Quote> {
        let context = format!("price fetch {}@{}", asset, venue);
        match self.retry.run(|| self.fetch_once(asset, venue), &context).await {
            Ok(quote) => {
                debug!(asset = %asset, venue = %venue, price = %quote.price, "Fetched quote");
                Some(quote)
            }
            Err(e) => {
                warn!(asset = %asset, venue = %venue, error = %e, "No price data");
                None
            }
        }
    }
}
