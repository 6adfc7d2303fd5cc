use crate::config::SetMapping;
use crate::model::{FetchError, MarketPrices, Sale, ScrapeRequest};

/// Upstream that returns individual sold listings for a card.
#[async_trait::async_trait]
pub trait SalesSource: Send + Sync {
    /// Prefix used for this source's cache keys.
    fn name(&self) -> &'static str;

    /// Whether lookups are keyed by the catalog set id from the mapping table.
    /// Sources answering `false` are queried with the caller's set name as is.
    fn resolves_sets(&self) -> bool {
        true
    }

    async fn fetch_sales(&self, set: &SetMapping, req: &ScrapeRequest) -> Result<Vec<Sale>, FetchError>;
}

/// Upstream that returns aggregated market prices for a catalog card.
#[async_trait::async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch_market_prices(&self, card_id: &str) -> Result<MarketPrices, FetchError>;
}
