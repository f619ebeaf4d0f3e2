use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::errors::ScrapeError;
use crate::http_client::{HttpFetch, ReqwestFetcher};
use crate::models::{DetailFailure, Listing, ListingDetails};
use crate::scrapers::{PageScraper, PropertyPage, SearchResultsPage};
use crate::search_url::SearchUrlBuilder;

/// Optional search filters. Applied to the URL in a fixed order: price,
/// property types, beds, baths, listing status.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub property_types: Vec<String>,
    pub beds_min: Option<u64>,
    pub beds_max: Option<u64>,
    pub baths_min: Option<u64>,
    pub baths_max: Option<u64>,
    pub listing_status: Option<String>,
}

impl SearchQuery {
    fn apply(&self, url: &mut SearchUrlBuilder) {
        if self.price_min.is_some() || self.price_max.is_some() {
            url.price_range(self.price_min, self.price_max);
        }
        if !self.property_types.is_empty() {
            url.property_types(&self.property_types);
        }
        if self.beds_min.is_some() || self.beds_max.is_some() {
            url.beds(self.beds_min, self.beds_max);
        }
        if self.baths_min.is_some() || self.baths_max.is_some() {
            url.baths(self.baths_min, self.baths_max);
        }
        if let Some(status) = &self.listing_status {
            url.listing_status(status);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Fetch and merge each listing's detail page.
    pub deep_fetch: bool,
    /// Width of the detail-fetch worker pool.
    pub detail_concurrency: usize,
    /// Budget for assembling one full page, detail fetches included.
    pub page_timeout: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            deep_fetch: true,
            detail_concurrency: 10,
            page_timeout: Duration::from_secs(120),
        }
    }
}

/// One assembled page of results. `listings` preserves the order the site
/// returned; failed detail fetches are recorded in `failures` instead of
/// aborting the page.
#[derive(Debug)]
pub struct ResultPage {
    pub listings: Vec<Listing>,
    pub failures: Vec<DetailFailure>,
    pub total_count: u64,
    per_page: usize,
}

impl ResultPage {
    fn empty() -> Self {
        Self {
            listings: Vec::new(),
            failures: Vec::new(),
            total_count: 0,
            per_page: 0,
        }
    }

    /// Number of result pages the site reports, derived from the total
    /// count and this page's size. A page with no listings has no pages to
    /// offer.
    pub fn page_count(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.per_page as u64)
    }
}

/// Entry point for searches. Holds the fetch capability and the knobs the
/// orchestrator runs with.
pub struct SearchClient {
    fetcher: Arc<dyn HttpFetch>,
    options: SearchOptions,
}

impl SearchClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let fetcher = ReqwestFetcher::new(
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self {
            fetcher: Arc::new(fetcher),
            options: SearchOptions {
                deep_fetch: config.deep_fetch,
                detail_concurrency: config.detail_concurrency,
                page_timeout: Duration::from_secs(config.page_timeout_secs),
            },
        })
    }

    pub fn with_fetcher(fetcher: Arc<dyn HttpFetch>, options: SearchOptions) -> Self {
        Self { fetcher, options }
    }

    /// Runs a search and eagerly fetches the first result page.
    pub async fn find(
        &self,
        location: &str,
        query: &SearchQuery,
    ) -> Result<SearchResults, ScrapeError> {
        let mut url = SearchUrlBuilder::for_location(location)?;
        query.apply(&mut url);

        let page = fetch_page(&self.fetcher, url.url(), &self.options).await?;

        Ok(SearchResults {
            fetcher: Arc::clone(&self.fetcher),
            options: self.options.clone(),
            url,
            page,
        })
    }
}

/// Cursor over result pages. Always holds one fetched page; the page number
/// only moves forward.
pub struct SearchResults {
    fetcher: Arc<dyn HttpFetch>,
    options: SearchOptions,
    url: SearchUrlBuilder,
    page: ResultPage,
}

impl std::fmt::Debug for SearchResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchResults")
            .field("options", &self.options)
            .field("url", &self.url)
            .field("page", &self.page)
            .finish_non_exhaustive()
    }
}

impl SearchResults {
    pub fn has_next_page(&self) -> bool {
        u64::from(self.url.current_page()) < self.page.page_count()
    }

    /// Advances to the next result page and fetches it. Does not check
    /// `has_next_page`; asking for a page past the end simply yields
    /// whatever the site serves for it.
    pub async fn next_page(&mut self) -> Result<(), ScrapeError> {
        self.url.next_page();
        self.page = fetch_page(&self.fetcher, self.url.url(), &self.options).await?;
        Ok(())
    }

    /// Applies `f` to every merged listing on the current page. Does not
    /// advance.
    pub fn for_each<F: FnMut(&Listing)>(&self, mut f: F) {
        for listing in &self.page.listings {
            f(listing);
        }
    }

    pub fn page(&self) -> &ResultPage {
        &self.page
    }

    pub fn current_page_number(&self) -> u32 {
        self.url.current_page()
    }
}

/// Fetches one search-results page and assembles it into a `ResultPage`,
/// fanning out detail fetches under the configured pool width. The whole
/// assembly runs under the page timeout; dropping it aborts any in-flight
/// detail fetches with it.
async fn fetch_page(
    fetcher: &Arc<dyn HttpFetch>,
    url: &str,
    options: &SearchOptions,
) -> Result<ResultPage, ScrapeError> {
    let assembly = assemble_page(fetcher, url, options);

    match tokio::time::timeout(options.page_timeout, assembly).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::PageTimeout {
            seconds: options.page_timeout.as_secs(),
        }),
    }
}

async fn assemble_page(
    fetcher: &Arc<dyn HttpFetch>,
    url: &str,
    options: &SearchOptions,
) -> Result<ResultPage, ScrapeError> {
    tracing::info!("Fetching search results page {}", url);
    let html = fetcher.fetch_text(url).await?;
    let search_page = SearchResultsPage.parse(&html)?;

    let summaries = search_page.listings;
    let per_page = summaries.len();

    if summaries.is_empty() {
        tracing::info!("No listings on {}", url);
        return Ok(ResultPage {
            total_count: search_page.total_count,
            ..ResultPage::empty()
        });
    }

    if !options.deep_fetch {
        let listings = summaries
            .into_iter()
            .map(|summary| Listing {
                summary,
                details: None,
            })
            .collect();
        return Ok(ResultPage {
            listings,
            failures: Vec::new(),
            total_count: search_page.total_count,
            per_page,
        });
    }

    let semaphore = Arc::new(Semaphore::new(options.detail_concurrency.max(1)));
    let mut tasks: JoinSet<(usize, Result<ListingDetails, ScrapeError>)> = JoinSet::new();

    for (index, summary) in summaries.iter().enumerate() {
        let detail_url = summary.url.clone();
        let fetcher = Arc::clone(fetcher);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (index, fetch_details(fetcher.as_ref(), &detail_url).await)
        });
    }

    // Collect into index-addressed slots so output order matches the page,
    // whatever order the fetches complete in.
    let mut slots: Vec<Option<Result<ListingDetails, ScrapeError>>> =
        (0..per_page).map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(e) => tracing::error!("Detail fetch task failed to run: {}", e),
        }
    }

    let mut listings = Vec::with_capacity(per_page);
    let mut failures = Vec::new();

    for (summary, slot) in summaries.into_iter().zip(slots) {
        match slot {
            Some(Ok(details)) => listings.push(Listing {
                summary,
                details: Some(details),
            }),
            Some(Err(error)) => {
                tracing::warn!("Skipping {}: {}", summary.url, error);
                failures.push(DetailFailure {
                    url: summary.url,
                    error,
                });
            }
            None => failures.push(DetailFailure {
                error: ScrapeError::Fetch {
                    url: summary.url.clone(),
                    reason: "detail fetch task did not complete".to_string(),
                },
                url: summary.url,
            }),
        }
    }

    tracing::info!(
        "Assembled {} listings ({} failed) of {} total results",
        listings.len(),
        failures.len(),
        search_page.total_count
    );

    Ok(ResultPage {
        listings,
        failures,
        total_count: search_page.total_count,
        per_page,
    })
}

async fn fetch_details(fetcher: &dyn HttpFetch, url: &str) -> Result<ListingDetails, ScrapeError> {
    let html = fetcher
        .fetch_text(url)
        .await
        .map_err(|e| ScrapeError::detail(url, e))?;

    PropertyPage
        .parse(&html)
        .map_err(|e| ScrapeError::detail(url, e))
}
