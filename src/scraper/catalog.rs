use crate::model::{FetchError, MarketPrices};
use crate::parser::{MarketPriceParser, Parser};
use crate::scraper::fetcher::read_body;
use crate::scraper::traits::MarketSource;

use reqwest::Client;
use tracing::{info, warn};

/// Card catalog client; supplies the cardmarket averages used as the primary
/// prediction series.
pub struct CatalogClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CatalogClient {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("Catalog API key is not set, requests will be throttled upstream");
        }
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn build_url(&self, card_id: &str) -> String {
        format!("{}/cards/{}", self.base_url, card_id)
    }
}

#[async_trait::async_trait]
impl MarketSource for CatalogClient {
    async fn fetch_market_prices(&self, card_id: &str) -> Result<MarketPrices, FetchError> {
        let url = self.build_url(card_id);
        info!("Fetching market prices from {}", url);

        let mut request = self
            .client
            .get(&url)
            .query(&[("select", "id,name,cardmarket")]);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let body = read_body(request.send().await?).await?;
        Ok(MarketPriceParser::new().parse(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::fetcher::build_client;

    #[test]
    fn builds_card_url() {
        let catalog = CatalogClient::new(build_client(5).unwrap(), "https://api.pokemontcg.io/v2/", None);
        assert_eq!(catalog.build_url("base1-4"), "https://api.pokemontcg.io/v2/cards/base1-4");
    }
}
