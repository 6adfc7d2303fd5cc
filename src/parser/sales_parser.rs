// Upstream sales payload parsing
use crate::model::{ParserError, Sale};
use crate::normalizer::{is_auction_type, normalize_grade};
use crate::parser::Parser;
use crate::utils::parse_datetime;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RestPayload {
    sales: Vec<RestSale>,
}

#[derive(Debug, Deserialize)]
struct RestSale {
    price: f64,
    #[serde(default)]
    grade: Option<String>,
    date: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    condition: String,
    #[serde(default)]
    is_auction: bool,
    listing_id: String,
    #[serde(default)]
    bids: Option<u32>,
}

/// Parses the REST `/card/{set}/{number}/sales` payload.
pub struct RestSalesParser;

impl RestSalesParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for RestSalesParser {
    type Output = Vec<Sale>;

    fn parse(&self, body: &str) -> Result<Vec<Sale>, ParserError> {
        let payload: RestPayload = serde_json::from_str(body)?;

        let sales = payload
            .sales
            .into_iter()
            .filter_map(|raw| {
                let Some(date_sold) = parse_datetime(&raw.date) else {
                    debug!("Skipping sale {} with unreadable date {:?}", raw.listing_id, raw.date);
                    return None;
                };
                Some(Sale {
                    grade: normalize_grade(raw.grade.as_deref()),
                    listing_id: raw.listing_id,
                    title: raw.title,
                    price: raw.price.max(0.0),
                    date_sold,
                    is_auction: raw.is_auction,
                    bids: raw.bids,
                    condition: raw.condition,
                })
            })
            .collect();

        Ok(sales)
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlPayload {
    data: Option<GraphqlData>,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    card: Option<GraphqlCard>,
}

#[derive(Debug, Deserialize)]
struct GraphqlCard {
    #[serde(default)]
    sales: Vec<GraphqlSale>,
}

#[derive(Debug, Deserialize)]
struct GraphqlSale {
    date_sold: String,
    sold_price: f64,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    condition: String,
    #[serde(default)]
    num_bids: Option<u32>,
    ebay_item_id: String,
    #[serde(default)]
    title: String,
}

/// Parses the GraphQL `card { sales { ... } }` payload. The grade is read
/// from the listing condition and auction-ness from the listing type.
pub struct GraphqlSalesParser;

impl GraphqlSalesParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for GraphqlSalesParser {
    type Output = Vec<Sale>;

    fn parse(&self, body: &str) -> Result<Vec<Sale>, ParserError> {
        let payload: GraphqlPayload = serde_json::from_str(body)?;
        let raw_sales = payload
            .data
            .and_then(|d| d.card)
            .map(|c| c.sales)
            .unwrap_or_default();

        let sales = raw_sales
            .into_iter()
            .filter_map(|raw| {
                let date_sold = parse_datetime(&raw.date_sold)?;
                let condition = raw.condition.to_lowercase();
                Some(Sale {
                    grade: normalize_grade(Some(&condition)),
                    listing_id: raw.ebay_item_id,
                    title: raw.title,
                    price: raw.sold_price.max(0.0),
                    date_sold,
                    is_auction: is_auction_type(&raw.kind),
                    bids: raw.num_bids,
                    condition,
                })
            })
            .collect();

        Ok(sales)
    }
}
