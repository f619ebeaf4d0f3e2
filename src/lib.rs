pub mod config;
pub mod errors;
pub mod http_client;
pub mod models;
pub mod scrapers;
pub mod search;
pub mod search_url;

pub use config::Config;
pub use errors::ScrapeError;
pub use models::{Listing, ListingDetails, ListingSummary};
pub use search::{ResultPage, SearchClient, SearchOptions, SearchQuery, SearchResults};
pub use search_url::SearchUrlBuilder;
