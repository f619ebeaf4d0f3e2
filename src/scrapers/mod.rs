mod property_page;
mod search_results;

pub use property_page::PropertyPage;
pub use search_results::{SearchPage, SearchResultsPage};

use crate::errors::ScrapeError;

/// Capability implemented by each page type the site serves. Parsing is
/// pure; callers pick the concrete scraper for the page they fetched.
pub trait PageScraper {
    type Output;

    fn parse(&self, html: &str) -> Result<Self::Output, ScrapeError>;
}
