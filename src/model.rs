// Core records: Sale, PricePoint, per-grade analysis, prediction, errors
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Certification tier of a sold card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "raw")]
    Raw,
    #[serde(rename = "psa 8")]
    Psa8,
    #[serde(rename = "psa 9")]
    Psa9,
    #[serde(rename = "psa 10")]
    Psa10,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Raw, Grade::Psa8, Grade::Psa9, Grade::Psa10];

    pub fn label(self) -> &'static str {
        match self {
            Grade::Raw => "raw",
            Grade::Psa8 => "psa 8",
            Grade::Psa9 => "psa 9",
            Grade::Psa10 => "psa 10",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub listing_id: String,
    pub title: String,
    pub price: f64,
    pub date_sold: DateTime<Utc>,
    pub is_auction: bool,
    pub bids: Option<u32>,
    pub condition: String,
    pub grade: Grade,
}

/// One observation of a price series. Series are most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: Option<u64>,
}

/// Fixed look-back windows used by the aggregator and temporal metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
    #[serde(rename = "all")]
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeFrameAnalysis {
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub sales_count: usize,
    /// Percent change from the oldest to the newest sale in the window.
    pub trend: f64,
    pub price_history: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDistribution {
    pub standard_deviation: f64,
    pub median: f64,
    pub mode: f64,
    pub quartiles: Quartiles,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BidDistribution {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionAnalysis {
    pub auction_percentage: f64,
    pub average_bids: f64,
    pub auction_price_difference: f64,
    pub bid_distribution: BidDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAnalysis {
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub trend: f64,
    pub recent_sales: Vec<Sale>,
    pub time_frames: BTreeMap<TimeFrame, TimeFrameAnalysis>,
    pub price_distribution: PriceDistribution,
    pub auction_analysis: AuctionAnalysis,
}

/// Per-grade analyses, the unit handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeAnalysis {
    pub raw: PriceAnalysis,
    pub psa8: PriceAnalysis,
    pub psa9: PriceAnalysis,
    pub psa10: PriceAnalysis,
}

impl GradeAnalysis {
    pub fn grade(&self, grade: Grade) -> &PriceAnalysis {
        match grade {
            Grade::Raw => &self.raw,
            Grade::Psa8 => &self.psa8,
            Grade::Psa9 => &self.psa9,
            Grade::Psa10 => &self.psa10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAnalysis {
    pub expected_profit: f64,
    pub roi: f64,
    pub investment_score: f64,
    pub risk_level: RiskLevel,
    /// Estimated holding period in days.
    pub time_to_profit: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub change: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalMetrics {
    pub current: f64,
    pub day: PeriodMetrics,
    pub week: PeriodMetrics,
    pub month: PeriodMetrics,
    pub all_time: PeriodMetrics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub value: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalMetrics {
    pub rsi: f64,
    pub momentum: f64,
    pub volatility: f64,
    pub macd: Macd,
    pub bollinger_bands: BollingerBands,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seasonality {
    pub detected: bool,
    pub period: Option<u32>,
    pub strength: f64,
    pub next_peak: Option<DateTime<Utc>>,
    pub next_trough: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetrics {
    pub temporal: TemporalMetrics,
    pub technical: TechnicalMetrics,
    pub seasonality: Seasonality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePrediction {
    pub predicted_price: f64,
    pub confidence: f64,
    pub trend: Trend,
    pub trend_strength: f64,
    pub volatility: f64,
    pub price_history: Vec<PricePoint>,
    pub profit_analysis: ProfitAnalysis,
    pub metrics: PredictionMetrics,
}

/// Catalog market averages for a single card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketPrices {
    pub average_sell_price: f64,
    pub avg1: f64,
    pub avg7: f64,
    pub avg30: f64,
    pub trend_price: f64,
}

#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub set_name: String,
    pub card_number: String,
}

/// Everything computed for one card in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardReport {
    pub set_name: String,
    pub card_number: String,
    pub analysis: GradeAnalysis,
    pub prediction: PricePrediction,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream error (status {status:?}): {message}")]
    Upstream { status: Option<u16>, message: String },
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("rate limit exceeded for {0}")]
    RateLimited(String),
}

impl FetchError {
    /// HTTP status a caller-facing handler should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            FetchError::NotFound(_) => 404,
            FetchError::Upstream { .. } => 502,
            FetchError::Unavailable(_) => 503,
            FetchError::Validation(_) => 400,
            FetchError::RateLimited(_) => 429,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            FetchError::Unavailable(e.to_string())
        } else {
            FetchError::Upstream {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(String),
}

impl From<ParserError> for FetchError {
    fn from(e: ParserError) -> Self {
        FetchError::Upstream {
            status: None,
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("non-finite {0} in prediction pipeline")]
    NonFinite(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_frame_keys_serialize_as_labels() {
        let mut frames = BTreeMap::new();
        frames.insert(TimeFrame::Day, TimeFrameAnalysis::default());
        frames.insert(TimeFrame::All, TimeFrameAnalysis::default());
        let json = serde_json::to_value(&frames).unwrap();
        assert!(json.get("24h").is_some());
        assert!(json.get("all").is_some());
    }

    #[test]
    fn fetch_errors_map_to_distinct_statuses() {
        assert_eq!(FetchError::NotFound("x".into()).status_code(), 404);
        assert_eq!(FetchError::Unavailable("x".into()).status_code(), 503);
        assert_eq!(
            FetchError::Upstream { status: Some(500), message: "x".into() }.status_code(),
            502
        );
        assert_eq!(FetchError::Validation("x".into()).status_code(), 400);
        assert_eq!(FetchError::RateLimited("x".into()).status_code(), 429);
    }

    #[test]
    fn grade_serializes_with_spaced_label() {
        assert_eq!(serde_json::to_string(&Grade::Psa10).unwrap(), "\"psa 10\"");
        assert_eq!(Grade::Psa8.label(), "psa 8");
    }
}
