//! Display and printing utilities

use tracing::{info, warn};
use crate::{
    engine::PipelineStats,
    errors::CircuitBreaker,
    feeds::IngestStats,
    types::{AlertType, Opportunity, RiskStatus},
};

pub fn print_session_stats(stats: &PipelineStats, ingest: &IngestStats, circuit_breaker: &CircuitBreaker) {
    let runtime = stats.started_at.elapsed().as_secs() / 60;

    info!("\n📊 Session Statistics ({} minutes)", runtime);
    info!("   📡 FEEDS:");
    info!("     Push messages: {} ({} dropped)", ingest.messages_received, ingest.messages_dropped);
    info!("     Subscriptions issued: {}", ingest.subscriptions_issued);
    info!("     Quotes accepted: {}/{}", stats.quotes_accepted, stats.quotes_received);

    info!("   📈 ARBITRAGE:");
    info!("     Total opportunities: {}", stats.opportunities);
    info!("     Eligible (scored): {}", stats.eligible_opportunities);
    info!("     Best spread: {:.3}%", stats.best_spread_percent);

    info!("   🚀 TRADE EXECUTION:");
    info!("     Approved: {}, Rejected: {}", stats.trades_approved, stats.trades_rejected);
    info!("     Filled: {}, Failed: {}", stats.executions_filled, stats.executions_failed);
    info!("     Fill rate: {:.1}%",
        if stats.trades_approved > 0 {
            (stats.executions_filled as f64 / stats.trades_approved as f64) * 100.0
        } else {
            0.0
        }
    );
    info!("     Positions closed: {}", stats.positions_closed);

    info!("   ⚙️  SYSTEM:");
    info!("     Circuit breaker: {} ({} consecutive failures)",
        if circuit_breaker.is_open() { "OPEN" } else { "CLOSED" },
        circuit_breaker.consecutive_errors()
    );
    info!("");
}

pub fn print_opportunity(opportunity: &Opportunity) {
    warn!("\n🎯 ARBITRAGE OPPORTUNITY #{}", opportunity.id);
    warn!("📍 Asset: {}", opportunity.asset);
    warn!("📋 Route: buy on {} → sell on {}", opportunity.buy_venue, opportunity.sell_venue);
    warn!("💰 Spread Analysis:");
    warn!("   Buy Price:  ${:.6}", opportunity.buy_price);
    warn!("   Sell Price: ${:.6}", opportunity.sell_price);
    warn!("   Spread: {:.3}%", opportunity.spread_percent);
    warn!("   Confidence: {:.1}/100", opportunity.confidence_score);
}

pub fn print_risk_status(status: &RiskStatus) {
    let portfolio = &status.portfolio;
    info!("🛡️  Risk Status:");
    info!("   Portfolio: ${:.2} (available ${:.2})", portfolio.total_value, portfolio.available_capital);
    info!("   Exposure: ${:.2} ({:.1}% of limit {:.0}%)",
        status.exposure.total,
        status.exposure.ratio * rust_decimal_macros::dec!(100),
        status.exposure.limit * rust_decimal_macros::dec!(100)
    );
    info!("   PnL: realized ${:.2}, unrealized ${:.2}", portfolio.realized_pnl, portfolio.unrealized_pnl);
    info!("   Open positions: {}", status.open_positions.len());
    info!("   Win rate: {:.1}% | Sharpe: {:.2} | VaR95: {:.4} | Drawdown: {:.2}%",
        status.metrics.win_rate * rust_decimal_macros::dec!(100),
        status.metrics.sharpe_ratio,
        status.metrics.var_95,
        status.metrics.current_drawdown * rust_decimal_macros::dec!(100)
    );

    for alert in &status.alerts {
        match alert.alert_type {
            AlertType::Emergency => warn!("   🚨 {:?}: {}", alert.category, alert.message),
            AlertType::Warning => info!("   ⚠️  {:?}: {}", alert.category, alert.message),
        }
    }
}
