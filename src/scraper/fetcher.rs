use crate::config::{AppConfig, SalesApi, SetMapping};
use crate::model::{FetchError, Sale, ScrapeRequest};
use crate::parser::{GraphqlSalesParser, Parser, RestSalesParser};
use crate::scraper::traits::SalesSource;

use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) CardSniperBot/0.1";

const SALES_QUERY: &str = "
    query GetCardSales($setName: String!, $cardNumber: String!) {
        card(setName: $setName, cardNumber: $cardNumber) {
            sales { date_sold sold_price type condition num_bids ebay_item_id title seller_name }
        }
    }";

pub fn build_client(timeout_seconds: u64) -> Result<Client, FetchError> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?)
}

/// Reads a response body, mapping failures onto caller-facing categories.
pub async fn read_body(response: Response) -> Result<String, FetchError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }

    warn!("Upstream responded [{}]: {}", status, body);
    Err(match status {
        StatusCode::NOT_FOUND => FetchError::NotFound(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FetchError::Unavailable(format!("upstream rejected credentials ({})", status))
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            FetchError::Unavailable(format!("upstream unavailable ({})", status))
        }
        _ => FetchError::Upstream {
            status: Some(status.as_u16()),
            message: body,
        },
    })
}

/// Sales lookup against the pokedata REST or GraphQL endpoint.
pub struct ScraperImpl {
    pub client: Client,
    pub base_url: String,
    pub graphql_base_url: String,
    pub api_key: Option<String>,
    pub api: SalesApi,
}

impl ScraperImpl {
    pub fn new(
        client: Client,
        base_url: &str,
        graphql_base_url: &str,
        api_key: Option<String>,
        api: SalesApi,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            graphql_base_url: graphql_base_url.trim_end_matches('/').to_string(),
            api_key,
            api,
        }
    }

    pub fn from_config(client: Client, config: &AppConfig) -> Self {
        Self::new(
            client,
            &config.api_base_url,
            &config.graphql_base_url,
            config.api_key.clone(),
            config.sales_api,
        )
    }

    fn api_key(&self) -> Result<&str, FetchError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| FetchError::Unavailable("sales API key not configured".into()))
    }

    fn build_rest_url(&self, set: &SetMapping, req: &ScrapeRequest) -> String {
        format!("{}/card/{}/{}/sales", self.base_url, set.id, req.card_number.trim())
    }

    fn build_graphql_url(&self) -> String {
        format!("{}/api/graphql", self.graphql_base_url)
    }

    async fn fetch_rest(&self, set: &SetMapping, req: &ScrapeRequest) -> Result<Vec<Sale>, FetchError> {
        let url = self.build_rest_url(set, req);
        info!("Fetching sales from {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", self.api_key()?)
            .send()
            .await?;
        let body = read_body(response).await?;
        Ok(RestSalesParser::new().parse(&body)?)
    }

    async fn fetch_graphql(&self, set: &SetMapping, req: &ScrapeRequest) -> Result<Vec<Sale>, FetchError> {
        let set_name = plus_encode(&set.name);
        let card_number = plus_encode(&req.card_number);
        let query = json!({
            "query": SALES_QUERY,
            "variables": { "setName": set_name, "cardNumber": card_number }
        });
        info!("Querying sales for {} #{}", set.name, req.card_number);

        let response = self
            .client
            .post(self.build_graphql_url())
            .header("Accept", "application/json")
            .bearer_auth(self.api_key()?)
            .json(&query)
            .send()
            .await?;
        let body = read_body(response).await?;
        let sales = GraphqlSalesParser::new().parse(&body)?;
        if sales.is_empty() {
            return Err(FetchError::NotFound(format!(
                "no sales for {} #{}",
                set.name, req.card_number
            )));
        }
        Ok(sales)
    }
}

fn plus_encode(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("+")
}

#[async_trait::async_trait]
impl SalesSource for ScraperImpl {
    fn name(&self) -> &'static str {
        match self.api {
            SalesApi::Rest => "ebay",
            SalesApi::Graphql => "pokedata",
        }
    }

    fn resolves_sets(&self) -> bool {
        self.api == SalesApi::Rest
    }

    async fn fetch_sales(&self, set: &SetMapping, req: &ScrapeRequest) -> Result<Vec<Sale>, FetchError> {
        let sales = match self.api {
            SalesApi::Rest => self.fetch_rest(set, req).await?,
            SalesApi::Graphql => self.fetch_graphql(set, req).await?,
        };
        info!("{} sales found for {} #{}", sales.len(), set.name, req.card_number);
        Ok(sales)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn scraper(api: SalesApi, key: Option<&str>) -> ScraperImpl {
        ScraperImpl::new(
            build_client(5).unwrap(),
            "https://www.pokedata.io/api/v1/",
            "https://www.pokedata.io/",
            key.map(str::to_string),
            api,
        )
    }

    fn request() -> ScrapeRequest {
        ScrapeRequest {
            set_name: "Base".into(),
            card_number: " 4 ".into(),
        }
    }

    #[test]
    fn builds_rest_url_from_set_id() {
        let set = SetMapping { name: "Base Set".into(), id: "1".into() };
        assert_eq!(
            scraper(SalesApi::Rest, Some("k")).build_rest_url(&set, &request()),
            "https://www.pokedata.io/api/v1/card/1/4/sales"
        );
    }

    #[test]
    fn default_config_posts_graphql_to_site_root() {
        let cfg = parse_config(r#"{ "check_interval_seconds": 60, "sales_api": "graphql" }"#).unwrap();
        let scraper = ScraperImpl::from_config(build_client(5).unwrap(), &cfg);
        assert_eq!(scraper.build_graphql_url(), "https://www.pokedata.io/api/graphql");
        assert_eq!(scraper.api, SalesApi::Graphql);
    }

    #[test]
    fn graphql_variables_use_plus_separators() {
        assert_eq!(plus_encode("Crown  Zenith"), "Crown+Zenith");
        assert_eq!(plus_encode("SWSH 050"), "SWSH+050");
    }

    #[test]
    fn source_names_follow_api_flavour() {
        assert_eq!(scraper(SalesApi::Rest, None).name(), "ebay");
        assert_eq!(scraper(SalesApi::Graphql, None).name(), "pokedata");
        assert!(scraper(SalesApi::Rest, None).resolves_sets());
        assert!(!scraper(SalesApi::Graphql, None).resolves_sets());
    }

    #[tokio::test]
    async fn missing_api_key_is_unavailable() {
        let set = SetMapping { name: "Base Set".into(), id: "1".into() };
        let err = scraper(SalesApi::Rest, Some(""))
            .fetch_sales(&set, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unavailable(_)));
        assert_eq!(err.status_code(), 503);
    }
}
