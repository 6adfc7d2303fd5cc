pub mod sales_parser;
pub mod market_parser;

use crate::model::ParserError;

pub use market_parser::MarketPriceParser;
pub use sales_parser::{GraphqlSalesParser, RestSalesParser};

/// Turns an upstream response body into typed records.
pub trait Parser {
    type Output;

    fn parse(&self, body: &str) -> Result<Self::Output, ParserError>;
}
