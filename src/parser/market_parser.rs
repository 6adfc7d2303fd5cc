// Catalog card payload parsing
use crate::model::{MarketPrices, ParserError, PricePoint};
use crate::parser::Parser;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CardEnvelope {
    data: CatalogCard,
}

#[derive(Debug, Deserialize)]
struct CatalogCard {
    #[serde(default)]
    cardmarket: Option<Cardmarket>,
}

#[derive(Debug, Deserialize)]
struct Cardmarket {
    prices: MarketPrices,
}

/// Extracts the cardmarket averages from a catalog `cards/{id}` response.
pub struct MarketPriceParser;

impl MarketPriceParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for MarketPriceParser {
    type Output = MarketPrices;

    fn parse(&self, body: &str) -> Result<MarketPrices, ParserError> {
        let envelope: CardEnvelope = serde_json::from_str(body)?;
        envelope
            .data
            .cardmarket
            .map(|c| c.prices)
            .ok_or_else(|| ParserError::MissingField("cardmarket.prices".into()))
    }
}

impl MarketPrices {
    /// Most-recent-first series: the 1/7/30-day averages at their look-back,
    /// the trend price at 90 days, then two points extrapolated from the trend
    /// price (x0.95 at 120 days, x0.9 at 150 days).
    pub fn to_price_series(&self, now: DateTime<Utc>) -> Vec<PricePoint> {
        [
            (self.avg1, 0),
            (self.avg7, 7),
            (self.avg30, 30),
            (self.trend_price, 90),
            (self.trend_price * 0.95, 120),
            (self.trend_price * 0.9, 150),
        ]
        .into_iter()
        .map(|(price, days)| PricePoint {
            timestamp: now - Duration::days(days),
            price,
            volume: None,
        })
        .collect()
    }
}
