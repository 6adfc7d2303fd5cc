pub mod traits;
pub mod fetcher;
pub mod catalog;

pub use catalog::CatalogClient;
pub use fetcher::{build_client, ScraperImpl};
pub use traits::{MarketSource, SalesSource};
