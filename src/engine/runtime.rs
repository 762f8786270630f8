//! Event loop wiring feeds, pipeline and execution together

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use crate::{
    config::RuntimeConfig,
    execution::ExecutionGateway,
    feeds::{poll_once, PriceFeedIngestor, PushTransport},
    network::PriceSource,
    types::{ApprovedTrade, ExecutionResponse, Quote},
    utils::display::print_risk_status,
};
use super::{Pipeline, RecurringTask};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Everything the pipeline reacts to, in arrival order.
#[derive(Debug)]
pub enum PipelineEvent {
    PushMessage { raw: String, received_at: DateTime<Utc> },
    PushConnected,
    PollDue,
    Polled(Vec<Quote>),
    Sweep,
    ExecutionFinished {
        trade_id: String,
        response: ExecutionResponse,
        elapsed_ms: u64,
    },
    Shutdown,
}

/// Single consumer of the event channel. Network work runs in spawned
/// tasks and reports back through the same channel, so pipeline state is
/// only ever touched here.
pub struct Runtime {
    pipeline: Pipeline,
    ingestor: PriceFeedIngestor,
    source: Arc<dyn PriceSource>,
    gateway: Arc<dyn ExecutionGateway>,
    transport: Option<Box<dyn PushTransport>>,
    sweep_period: Duration,
    poll_period: Duration,
    execution_timeout: Duration,
    poll_in_flight: bool,
    tx: mpsc::Sender<PipelineEvent>,
    rx: mpsc::Receiver<PipelineEvent>,
}

impl Runtime {
    pub fn new(
        pipeline: Pipeline,
        ingestor: PriceFeedIngestor,
        source: Arc<dyn PriceSource>,
        gateway: Arc<dyn ExecutionGateway>,
        config: &RuntimeConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            pipeline,
            ingestor,
            source,
            gateway,
            transport: None,
            sweep_period: Duration::from_secs(config.sweep_interval_secs),
            poll_period: Duration::from_secs(config.poll_interval_secs),
            execution_timeout: Duration::from_secs(config.execution_timeout_secs),
            poll_in_flight: false,
            tx,
            rx,
        }
    }

    pub fn with_push_transport(mut self, transport: Box<dyn PushTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Handle for feeding events in from outside (push feed, signals).
    pub fn sender(&self) -> mpsc::Sender<PipelineEvent> {
        self.tx.clone()
    }

    /// Runs until `Shutdown` and hands the pipeline back for reporting.
    pub async fn run(mut self) -> (Pipeline, PriceFeedIngestor) {
        let sweep = RecurringTask::start("sweep", self.sweep_period, self.tx.clone(), || PipelineEvent::Sweep);
        let poll = RecurringTask::start("poll", self.poll_period, self.tx.clone(), || PipelineEvent::PollDue);

        info!("🚀 Pipeline running");

        while let Some(event) = self.rx.recv().await {
            match event {
                PipelineEvent::Shutdown => {
                    info!("Shutdown signal received, exiting event loop...");
                    break;
                }
                other => self.handle_event(other).await,
            }
        }

        sweep.stop().await;
        poll.stop().await;
        (self.pipeline, self.ingestor)
    }

    async fn handle_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::PushMessage { raw, received_at } => {
                if let Some(quote) = self.ingestor.normalize_push(&raw, received_at) {
                    self.process_quote(quote);
                }
            }
            PipelineEvent::PushConnected => {
                if let Some(transport) = self.transport.as_mut() {
                    self.ingestor.on_connected(transport.as_mut()).await;
                }
            }
            PipelineEvent::PollDue => self.start_poll(),
            PipelineEvent::Polled(quotes) => {
                self.poll_in_flight = false;
                debug!(quotes = quotes.len(), "Poll complete");
                for quote in quotes {
                    self.process_quote(quote);
                }
            }
            PipelineEvent::Sweep => {
                let report = self.pipeline.sweep(Utc::now());
                debug!(?report, "Sweep");
                print_risk_status(&self.pipeline.risk_status());
            }
            PipelineEvent::ExecutionFinished { trade_id, response, elapsed_ms } => {
                self.pipeline
                    .handle_execution_result(&trade_id, &response, elapsed_ms, Utc::now());
            }
            PipelineEvent::Shutdown => {}
        }
    }

    fn process_quote(&mut self, quote: Quote) {
        let trades = self.pipeline.handle_quote(quote, Utc::now());
        for trade in trades {
            self.dispatch(trade);
        }
    }

    /// Skips a poll while the previous one is still outstanding.
    fn start_poll(&mut self) {
        if self.poll_in_flight {
            debug!("Previous poll still running, skipping");
            return;
        }
        self.poll_in_flight = true;

        let source = self.source.clone();
        let targets = self.ingestor.poll_targets();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let quotes = poll_once(source, targets).await;
            let _ = tx.send(PipelineEvent::Polled(quotes)).await;
        });
    }

    fn dispatch(&self, trade: ApprovedTrade) {
        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        let limit = self.execution_timeout;

        tokio::spawn(async move {
            let started = Instant::now();
            let response = match tokio::time::timeout(limit, gateway.submit(&trade.request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!(trade_id = %trade.id, error = %e, "Gateway error");
                    ExecutionResponse::declined(e.to_string())
                }
                Err(_) => {
                    warn!(trade_id = %trade.id, "Gateway timed out");
                    ExecutionResponse::declined(format!("timed out after {}s", limit.as_secs()))
                }
            };
            let _ = tx
                .send(PipelineEvent::ExecutionFinished {
                    trade_id: trade.id,
                    response,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                })
                .await;
        });
    }
}
