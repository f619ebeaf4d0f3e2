use thiserror::Error;

/// Errors produced while building a search or scraping realtor.com pages.
///
/// Fetch-layer variants carry the failing URL so a failure deep in the
/// concurrent detail fan-out can still be attributed to one listing.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("location cannot be empty")]
    EmptyLocation,

    /// An embedded data block was missing from the page or did not
    /// deserialize into the expected shape.
    #[error("{block} block missing or malformed: {reason}")]
    Parse { block: &'static str, reason: String },

    /// The summary and linking blocks reported different listing counts, so
    /// positional URL binding cannot be trusted.
    #[error("summary and linking data disagree on listing count ({summaries} summaries vs {links} links)")]
    LinkCountMismatch { summaries: usize, links: usize },

    #[error("GET {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// A single listing's detail page could not be fetched or parsed.
    #[error("failed to scrape property page at {url}")]
    Detail {
        url: String,
        #[source]
        source: Box<ScrapeError>,
    },

    #[error("page fetch timed out after {seconds}s")]
    PageTimeout { seconds: u64 },
}

impl ScrapeError {
    pub fn parse(block: &'static str, reason: impl Into<String>) -> Self {
        ScrapeError::Parse {
            block,
            reason: reason.into(),
        }
    }

    pub fn detail(url: impl Into<String>, source: ScrapeError) -> Self {
        ScrapeError::Detail {
            url: url.into(),
            source: Box::new(source),
        }
    }
}
