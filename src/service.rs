use crate::analyzer::{Analyzer, AnalyzerImpl, PricePredictor};
use crate::config::SetMapping;
use crate::governor::Governor;
use crate::model::{CardReport, FetchError, Grade, PricePoint, PricePrediction, Sale, ScrapeRequest};
use crate::normalizer::SetResolver;
use crate::scraper::{MarketSource, SalesSource};
use crate::utils::cache_key;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serves per-card analyses: rate limit, validation, two cache layers, then the
/// upstream fetch and the analytics pipeline.
pub struct CardPriceService {
    governor: Arc<Governor>,
    sales_source: Arc<dyn SalesSource>,
    market_source: Option<Arc<dyn MarketSource>>,
    resolver: SetResolver,
    analyzer: AnalyzerImpl,
}

impl CardPriceService {
    pub fn new(
        governor: Arc<Governor>,
        sales_source: Arc<dyn SalesSource>,
        market_source: Option<Arc<dyn MarketSource>>,
        resolver: SetResolver,
    ) -> Self {
        Self {
            governor,
            sales_source,
            market_source,
            resolver,
            analyzer: AnalyzerImpl::new(),
        }
    }

    pub async fn card_report(
        &self,
        identity: &str,
        req: &ScrapeRequest,
        catalog_id: Option<&str>,
    ) -> Result<CardReport, FetchError> {
        if !self.governor.check_rate_limit(identity) {
            return Err(FetchError::RateLimited(identity.to_string()));
        }
        let req = validate(req)?;

        let report_key = cache_key("analysis", &req.set_name, &req.card_number);
        if let Some(report) = self.governor.reports().get(&report_key) {
            debug!("Report cache hit: {}", report_key);
            return Ok(report);
        }

        let sales = self.sales(&req).await?;
        let now = Utc::now();
        let analysis = self.analyzer.analyze_sales(&sales, now);
        let prediction = self.predict(&sales, &analysis.raw, catalog_id, now).await;

        let report = CardReport {
            set_name: req.set_name.clone(),
            card_number: req.card_number.clone(),
            analysis,
            prediction,
            generated_at: now,
        };
        self.governor.reports().set(&report_key, report.clone());
        Ok(report)
    }

    /// Raw sales through the long-lived upstream cache.
    async fn sales(&self, req: &ScrapeRequest) -> Result<Vec<Sale>, FetchError> {
        let key = cache_key(self.sales_source.name(), &req.set_name, &req.card_number);
        if let Some(sales) = self.governor.upstream().get(&key) {
            info!("Sales served from cache: {}", key);
            return Ok(sales);
        }

        let set = if self.sales_source.resolves_sets() {
            self.resolver.resolve(&req.set_name)?.clone()
        } else {
            SetMapping {
                name: req.set_name.clone(),
                id: req.set_name.clone(),
            }
        };
        let sales = self.sales_source.fetch_sales(&set, req).await?;
        self.governor.upstream().set(&key, sales.clone());
        Ok(sales)
    }

    /// Primary series from the catalog when available, fused with the raw-grade
    /// sales; otherwise the raw-grade sales alone.
    async fn predict(
        &self,
        sales: &[Sale],
        raw: &crate::model::PriceAnalysis,
        catalog_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> PricePrediction {
        if let (Some(source), Some(card_id)) = (&self.market_source, catalog_id) {
            match source.fetch_market_prices(card_id).await {
                Ok(prices) => {
                    let series = prices.to_price_series(now);
                    return PricePredictor::predict_with_secondary(&series, raw, now);
                }
                Err(e) => warn!("Market prices unavailable for {}: {}", card_id, e),
            }
        }
        PricePredictor::predict_price(&sales_series(sales, Grade::Raw), now)
    }
}

fn validate(req: &ScrapeRequest) -> Result<ScrapeRequest, FetchError> {
    let set_name = req.set_name.trim();
    let card_number = req.card_number.trim();
    if set_name.is_empty() || card_number.is_empty() {
        return Err(FetchError::Validation("set name and card number are required".into()));
    }
    Ok(ScrapeRequest {
        set_name: set_name.to_string(),
        card_number: card_number.to_string(),
    })
}

/// Most-recent-first price series of one grade's sales.
pub fn sales_series(sales: &[Sale], grade: Grade) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = sales
        .iter()
        .filter(|s| s.grade == grade)
        .map(|s| PricePoint {
            timestamp: s.date_sold,
            price: s.price,
            volume: Some(1),
        })
        .collect();
    points.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    points
}
