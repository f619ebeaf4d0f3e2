use regex::Regex;

use crate::errors::ScrapeError;

const BASE_URL: &str = "https://www.realtor.com/realestateandhomes-search";
const PAGE_SEGMENT: &str = r"/pg-(\d+)/?$";

fn page_pattern() -> Option<Regex> {
    Regex::new(PAGE_SEGMENT).ok()
}

/// Builds a realtor.com search URL one path segment at a time.
///
/// The location is fixed at construction; filter calls append segments in
/// the order they are made. The builder is a single mutable cursor over one
/// search, so it is deliberately not `Clone`.
#[derive(Debug)]
pub struct SearchUrlBuilder {
    url: String,
}

impl SearchUrlBuilder {
    pub fn for_location(location: &str) -> Result<Self, ScrapeError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ScrapeError::EmptyLocation);
        }

        Ok(Self {
            url: format!("{}/{}", BASE_URL, urlencoding::encode(location)),
        })
    }

    /// Appends `/price-<min|na>[-<max>]`.
    pub fn price_range(&mut self, min: Option<u64>, max: Option<u64>) -> &mut Self {
        self.push_range_segment("price", min, max);
        self
    }

    /// Appends `/type-<t1>-<t2>...`.
    pub fn property_types(&mut self, types: &[String]) -> &mut Self {
        self.url.push_str(&format!("/type-{}", types.join("-")));
        self
    }

    /// Appends `/beds-<min|na>[-<max>]`.
    pub fn beds(&mut self, min: Option<u64>, max: Option<u64>) -> &mut Self {
        self.push_range_segment("beds", min, max);
        self
    }

    /// Appends `/baths-<min|na>[-<max>]`.
    pub fn baths(&mut self, min: Option<u64>, max: Option<u64>) -> &mut Self {
        self.push_range_segment("baths", min, max);
        self
    }

    /// Appends `/show-<status>`, e.g. `show-recently_sold`.
    pub fn listing_status(&mut self, status: &str) -> &mut Self {
        self.url.push_str(&format!("/show-{}", status));
        self
    }

    fn push_range_segment(&mut self, name: &str, min: Option<u64>, max: Option<u64>) {
        let min = min.map_or_else(|| "na".to_string(), |v| v.to_string());
        self.url.push_str(&format!("/{}-{}", name, min));
        if let Some(max) = max {
            self.url.push_str(&format!("-{}", max));
        }
    }

    /// Advances the trailing page segment. Pages start implicitly at 1, so
    /// the first advance appends `/pg-2`; later advances rewrite the
    /// existing segment.
    pub fn next_page(&mut self) {
        if let Some(pattern) = page_pattern() {
            if let Some(captures) = pattern.captures(&self.url) {
                let next = captures
                    .get(1)
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .map_or(2, |n| n + 1);
                self.url = pattern
                    .replace(&self.url, format!("/pg-{}", next).as_str())
                    .into_owned();
                return;
            }
        }
        self.url.push_str("/pg-2");
    }

    pub fn current_page(&self) -> u32 {
        page_pattern()
            .and_then(|pattern| pattern.captures(&self.url))
            .and_then(|captures| captures.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(1)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
