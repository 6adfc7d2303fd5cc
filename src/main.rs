mod config;
mod model;
mod scraper;
mod parser;
mod analyzer;
mod normalizer;
mod governor;
mod service;
mod utils;

use config::{load_config, AppConfig, CardConfig, CONFIG_PATH_ENV};
use governor::Governor;
use model::{FetchError, Grade, ScrapeRequest, Trend};
use normalizer::SetResolver;
use scraper::{build_client, CatalogClient, MarketSource, SalesSource, ScraperImpl};
use service::CardPriceService;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use futures::future::join_all;

#[tokio::main]
async fn main() {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    let client = match build_client(config.request_timeout_seconds) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    let sales_source: Arc<dyn SalesSource> = Arc::new(ScraperImpl::from_config(client.clone(), &config));
    let market_source: Arc<dyn MarketSource> = Arc::new(CatalogClient::new(
        client,
        &config.catalog_base_url,
        config.catalog_api_key.clone(),
    ));

    let governor = Arc::new(Governor::new(&config.governor));
    let cleanup = governor
        .clone()
        .spawn_cleanup(std::time::Duration::from_secs(config.governor.cleanup_interval_seconds.max(1)));

    let service = CardPriceService::new(
        governor.clone(),
        sales_source,
        Some(market_source),
        SetResolver::new(config.set_mapping.clone()),
    );

    info!(
        "Card sniper started, {} cards configured (upstream TTL {}s, report TTL {}s)",
        config.cards.len(),
        governor.upstream().ttl().num_seconds(),
        governor.reports().ttl().num_seconds()
    );

    loop {
        let tasks: Vec<_> = config
            .cards
            .iter()
            .map(|card| process_card(card, &service))
            .collect();
        join_all(tasks).await;

        log_governor_stats(&governor);

        info!("Waiting for timer ({}s)...", config.check_interval_seconds);
        tokio::select! {
            _ = sleep(Duration::from_secs(config.check_interval_seconds)) => {
                info!("Timer triggered.");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested.");
                break;
            }
        }
    }

    cleanup.abort();
    governor.clear();
    info!("Governor cleared, exiting.");
}

/// Logs per-pass cache statistics, then starts a fresh counting period.
fn log_governor_stats(governor: &Governor) {
    let upstream = governor.upstream().stats();
    let reports = governor.reports().stats();
    info!(
        "Cache stats since {}: upstream {}/{} hits ({} entries), reports {}/{} hits ({} entries), {} rate-limited identities",
        upstream.last_reset.format("%H:%M:%S"),
        upstream.hits,
        upstream.total_requests,
        governor.upstream().len(),
        reports.hits,
        reports.total_requests,
        governor.reports().len(),
        governor.tracked_identities()
    );
    governor.upstream().reset_stats();
    governor.reports().reset_stats();
}

/// Refreshes one configured card and logs the headline numbers.
async fn process_card(card: &CardConfig, service: &CardPriceService) {
    let request = ScrapeRequest {
        set_name: card.set_name.clone(),
        card_number: card.card_number.clone(),
    };
    let identity = format!("refresh:{}:{}", card.set_name, card.card_number);

    let report = match service
        .card_report(&identity, &request, card.catalog_id.as_deref())
        .await
    {
        Ok(report) => report,
        Err(FetchError::NotFound(e)) => {
            warn!("{} #{} not found: {}", card.set_name, card.card_number, e);
            return;
        }
        Err(e) => {
            warn!(
                "Refresh of {} #{} failed [{}]: {}",
                card.set_name,
                card.card_number,
                e.status_code(),
                e
            );
            return;
        }
    };

    for grade in Grade::ALL {
        let analysis = report.analysis.grade(grade);
        if analysis.recent_sales.is_empty() {
            continue;
        }
        info!(
            "{} #{} [{}]: avg {:.2} (min {:.2}, max {:.2}), 30d trend {:+.1}%",
            card.set_name,
            card.card_number,
            grade.label(),
            analysis.average_price,
            analysis.min_price,
            analysis.max_price,
            analysis.trend
        );
    }

    let prediction = &report.prediction;
    let direction = match prediction.trend {
        Trend::Up => "up",
        Trend::Down => "down",
        Trend::Stable => "stable",
    };
    info!(
        "{} #{}: predicted {:.2} ({}, confidence {:.2}), score {}, risk {:?}",
        card.set_name,
        card.card_number,
        prediction.predicted_price,
        direction,
        prediction.confidence,
        prediction.profit_analysis.investment_score,
        prediction.profit_analysis.risk_level
    );
}
