//! Normalizes pushed and polled quotes and manages subscriptions

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use crate::{
    config::FeedConfig,
    errors::{BotError, BotResult},
    network::PriceSource,
    types::{Asset, Quote, Venue},
};
use super::InboundQuote;

/// Subscription control message sent to the push transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionRequest {
    pub asset: Asset,
    pub venues: Vec<Venue>,
}

/// The streaming side of the feed. Connection handling is the transport's
/// business; the ingestor only tells it what to subscribe to.
#[async_trait]
pub trait PushTransport: Send {
    async fn subscribe(&mut self, request: &SubscriptionRequest) -> BotResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestStats {
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub subscriptions_issued: u64,
}

pub struct PriceFeedIngestor {
    assets: Vec<Asset>,
    venues: Vec<Venue>,
    stats: IngestStats,
}

impl PriceFeedIngestor {
    pub fn new(assets: Vec<Asset>, venues: Vec<Venue>) -> Self {
        Self {
            assets,
            venues,
            stats: IngestStats::default(),
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.tracked_assets.clone(), config.venues.clone())
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Parses one pushed message. Malformed messages are dropped with a
    /// warning and never reach validation.
    pub fn normalize_push(&mut self, raw: &str, received_at: DateTime<Utc>) -> Option<Quote> {
        self.stats.messages_received += 1;

        let inbound: InboundQuote = match serde_json::from_str(raw) {
            Ok(inbound) => inbound,
            Err(e) => {
                self.stats.messages_dropped += 1;
                let err = BotError::DataParsing {
                    context: "push quote message".to_string(),
                    source: e.into(),
                };
                warn!(error = ?err, "Dropping unparseable quote message");
                return None;
            }
        };

        match inbound.into_quote(received_at) {
            Ok(quote) => Some(quote),
            Err(defect) => {
                self.stats.messages_dropped += 1;
                warn!(defect = %defect, "Dropping malformed quote message");
                None
            }
        }
    }

    pub fn subscription_requests(&self) -> Vec<SubscriptionRequest> {
        self.assets
            .iter()
            .map(|asset| SubscriptionRequest {
                asset: asset.clone(),
                venues: self.venues.clone(),
            })
            .collect()
    }

    /// Re-issues every subscription. Called on each (re)connect; returns how
    /// many requests the transport accepted.
    pub async fn on_connected(&mut self, transport: &mut dyn PushTransport) -> usize {
        let mut issued = 0;
        for request in self.subscription_requests() {
            match transport.subscribe(&request).await {
                Ok(()) => {
                    issued += 1;
                    debug!(asset = %request.asset, venues = request.venues.len(), "Subscribed");
                }
                Err(e) => warn!(asset = %request.asset, error = %e, "Subscription failed"),
            }
        }
        self.stats.subscriptions_issued += issued as u64;
        info!("📡 Push feed connected, {} subscriptions issued", issued);
        issued
    }

    pub fn poll_targets(&self) -> Vec<(Asset, Venue)> {
        self.assets
            .iter()
            .flat_map(|asset| self.venues.iter().map(move |venue| (asset.clone(), venue.clone())))
            .collect()
    }
}

/// Fetches every (asset, venue) concurrently. Failed fetches are simply
/// absent from the result, in completion order otherwise.
pub async fn poll_once(source: Arc<dyn PriceSource>, targets: Vec<(Asset, Venue)>) -> Vec<Quote> {
    let mut tasks = JoinSet::new();
    for (asset, venue) in targets {
        let source = source.clone();
        tasks.spawn(async move { source.fetch_price(&asset, &venue).await });
    }

    let mut quotes = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(quote)) => quotes.push(quote),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Price poll task failed"),
        }
    }
    quotes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ingestor() -> PriceFeedIngestor {
        PriceFeedIngestor::new(
            vec![Asset::native("XLM").unwrap(), Asset::native("BTC").unwrap()],
            vec![Venue::new("binance").unwrap(), Venue::new("kraken").unwrap()],
        )
    }

    #[derive(Default)]
    struct RecordingTransport {
        requests: Vec<SubscriptionRequest>,
        fail_asset: Option<String>,
    }

    #[async_trait]
    impl PushTransport for RecordingTransport {
        async fn subscribe(&mut self, request: &SubscriptionRequest) -> BotResult<()> {
            if self.fail_asset.as_deref() == Some(request.asset.code()) {
                return Err(BotError::Transport {
                    message: "socket closed".into(),
                    source: None,
                });
            }
            self.requests.push(request.clone());
            Ok(())
        }
    }

    struct FixedSource;

    #[async_trait]
    impl PriceSource for FixedSource {
        async fn fetch_price(&self, asset: &Asset, venue: &Venue) -> Option<Quote> {
            if venue.as_str() == "kraken" {
                return None;
            }
            Some(Quote::new(asset.clone(), venue.clone(), dec!(1), Utc::now()))
        }
    }

    #[test]
    fn test_malformed_messages_are_counted_and_dropped() {
        let mut ingestor = ingestor();
        let now = Utc::now();
        assert!(ingestor.normalize_push("not json", now).is_none());
        assert!(ingestor.normalize_push(r#"{"asset":"XLM","price":1}"#, now).is_none());
        assert!(ingestor
            .normalize_push(r#"{"asset":"XLM","venue":"binance","price":"0.12"}"#, now)
            .is_some());
        assert_eq!(ingestor.stats().messages_received, 3);
        assert_eq!(ingestor.stats().messages_dropped, 2);
    }

    #[tokio::test]
    async fn test_resubscribes_on_every_connect() {
        let mut ingestor = ingestor();
        let mut transport = RecordingTransport::default();

        assert_eq!(ingestor.on_connected(&mut transport).await, 2);
        assert_eq!(ingestor.on_connected(&mut transport).await, 2);

        assert_eq!(transport.requests.len(), 4);
        assert_eq!(transport.requests[0].venues.len(), 2);
        assert_eq!(transport.requests[2], transport.requests[0]);
        assert_eq!(ingestor.stats().subscriptions_issued, 4);
    }

    #[tokio::test]
    async fn test_failed_subscription_does_not_block_others() {
        let mut ingestor = ingestor();
        let mut transport = RecordingTransport {
            fail_asset: Some("XLM".into()),
            ..Default::default()
        };
        assert_eq!(ingestor.on_connected(&mut transport).await, 1);
        assert_eq!(transport.requests[0].asset.code(), "BTC");
    }

    #[tokio::test]
    async fn test_poll_collects_only_successful_fetches() {
        let ingestor = ingestor();
        let targets = ingestor.poll_targets();
        assert_eq!(targets.len(), 4);

        let quotes = poll_once(Arc::new(FixedSource), targets).await;
        assert_eq!(quotes.len(), 2);
        assert!(quotes.iter().all(|q| q.venue.as_str() == "binance"));
    }
}
