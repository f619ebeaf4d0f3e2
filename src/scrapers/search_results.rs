use chrono::NaiveDate;
use scraper::{Html, Selector};
use serde::Deserialize;

use super::PageScraper;
use crate::errors::ScrapeError;
use crate::models::{Address, ListingSummary};

/// Scraper for one search-results page.
///
/// The page embeds two JSON blobs: the main data blob under
/// `script#__NEXT_DATA__` carries the listing summaries and the total result
/// count, and the SEO linking blob under `[data-testid="seoLinkingData"]`
/// carries the detail-page URLs in the same order. The URLs live only in the
/// linking blob, so both are required.
pub struct SearchResultsPage;

/// Parsed contents of one search-results page.
#[derive(Debug)]
pub struct SearchPage {
    pub listings: Vec<ListingSummary>,
    pub total_count: u64,
}

#[derive(Deserialize)]
struct NextData {
    props: Props,
}

#[derive(Deserialize)]
struct Props {
    #[serde(rename = "pageProps")]
    page_props: PageProps,
}

#[derive(Deserialize)]
struct PageProps {
    properties: Vec<RawProperty>,
    #[serde(rename = "totalProperties")]
    total_properties: u64,
}

#[derive(Deserialize)]
struct RawProperty {
    list_price: Option<u64>,
    location: Option<RawLocation>,
    description: Option<RawDescription>,
}

#[derive(Deserialize)]
struct RawLocation {
    address: Option<RawAddress>,
}

#[derive(Deserialize)]
struct RawAddress {
    line: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    state_code: Option<String>,
}

#[derive(Default, Deserialize)]
struct RawDescription {
    beds: Option<u32>,
    baths_consolidated: Option<String>,
    lot_sqft: Option<u64>,
    sqft: Option<u64>,
    sold_date: Option<NaiveDate>,
    sold_price: Option<u64>,
}

#[derive(Deserialize)]
struct SeoLinkingBlock {
    #[serde(rename = "mainEntity")]
    main_entity: MainEntity,
}

#[derive(Deserialize)]
struct MainEntity {
    #[serde(rename = "itemListElement")]
    item_list_element: Vec<SeoListItem>,
}

#[derive(Deserialize)]
struct SeoListItem {
    url: String,
}

impl PageScraper for SearchResultsPage {
    type Output = SearchPage;

    fn parse(&self, html: &str) -> Result<SearchPage, ScrapeError> {
        let document = Html::parse_document(html);

        let page_props = extract_page_props(&document)?;
        let urls = extract_linking_urls(&document)?;

        // The two blobs carry no shared key, so positional binding is all
        // there is. Refuse it outright when the counts disagree.
        if page_props.properties.len() != urls.len() {
            return Err(ScrapeError::LinkCountMismatch {
                summaries: page_props.properties.len(),
                links: urls.len(),
            });
        }

        let listings = page_props
            .properties
            .into_iter()
            .zip(urls)
            .map(|(raw, url)| summarize(raw, url))
            .collect::<Vec<_>>();

        tracing::debug!(
            "Parsed {} listings of {} total results",
            listings.len(),
            page_props.total_properties
        );

        Ok(SearchPage {
            listings,
            total_count: page_props.total_properties,
        })
    }
}

fn extract_page_props(document: &Html) -> Result<PageProps, ScrapeError> {
    let selector = Selector::parse("script#__NEXT_DATA__")
        .map_err(|e| ScrapeError::parse("__NEXT_DATA__", e.to_string()))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| ScrapeError::parse("__NEXT_DATA__", "element not found"))?;

    let text = element.text().collect::<String>();
    let data: NextData = serde_json::from_str(&text)
        .map_err(|e| ScrapeError::parse("__NEXT_DATA__", e.to_string()))?;

    Ok(data.props.page_props)
}

fn extract_linking_urls(document: &Html) -> Result<Vec<String>, ScrapeError> {
    let selector = Selector::parse(r#"[data-testid="seoLinkingData"]"#)
        .map_err(|e| ScrapeError::parse("seoLinkingData", e.to_string()))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| ScrapeError::parse("seoLinkingData", "element not found"))?;

    let text = element.text().collect::<String>();
    let blocks: Vec<serde_json::Value> = serde_json::from_str(&text)
        .map_err(|e| ScrapeError::parse("seoLinkingData", e.to_string()))?;

    // The first array entry is breadcrumb markup; the listing URLs sit in
    // the second.
    let linking = blocks
        .into_iter()
        .nth(1)
        .ok_or_else(|| ScrapeError::parse("seoLinkingData", "expected at least two entries"))?;
    let linking: SeoLinkingBlock = serde_json::from_value(linking)
        .map_err(|e| ScrapeError::parse("seoLinkingData", e.to_string()))?;

    Ok(linking
        .main_entity
        .item_list_element
        .into_iter()
        .map(|item| item.url)
        .collect())
}

fn summarize(raw: RawProperty, url: String) -> ListingSummary {
    let address = raw
        .location
        .and_then(|location| location.address)
        .map(|a| Address {
            street: a.line,
            city: a.city,
            zip: a.postal_code,
            state: a.state_code,
        })
        .unwrap_or_default();

    let description = raw.description.unwrap_or_default();

    ListingSummary {
        price: raw.list_price,
        address,
        url,
        beds: description.beds,
        // The site reports baths as a string like "2.5"; values such as
        // "3+" have no numeric reading.
        baths: description
            .baths_consolidated
            .and_then(|b| b.parse().ok()),
        lot_sqft: description.lot_sqft,
        sqft: description.sqft,
        sold_date: description.sold_date,
        sold_price: description.sold_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROPERTIES_JSON: &str = r#"[
        {
            "list_price": 550000,
            "location": {
                "address": {
                    "line": "123 N Main St",
                    "city": "Scottsdale",
                    "postal_code": "85251",
                    "state_code": "AZ"
                }
            },
            "description": {
                "beds": 3,
                "baths_consolidated": "2.5",
                "lot_sqft": 7200,
                "sqft": 1850,
                "sold_date": "2024-05-17",
                "sold_price": 540000
            }
        },
        {
            "list_price": 725000,
            "location": {
                "address": {
                    "line": "9 E Cactus Rd",
                    "city": "Scottsdale",
                    "postal_code": "85254",
                    "state_code": "AZ"
                }
            },
            "description": {
                "beds": 4,
                "baths_consolidated": "3",
                "sqft": 2400
            }
        }
    ]"#;

    fn search_html(properties: &str, total: u64, urls: &[&str]) -> String {
        let items = urls
            .iter()
            .map(|u| format!(r#"{{"url":"{}"}}"#, u))
            .collect::<Vec<_>>()
            .join(",");

        format!(
            r#"<html><body>
            <script id="__NEXT_DATA__" type="application/json">
            {{"props":{{"pageProps":{{"totalProperties":{total},"properties":{properties}}}}}}}
            </script>
            <script type="application/ld+json" data-testid="seoLinkingData">
            [{{"@type":"BreadcrumbList"}},{{"mainEntity":{{"itemListElement":[{items}]}}}}]
            </script>
            </body></html>"#
        )
    }

    #[test]
    fn test_parses_listings_and_total_count() {
        let html = search_html(
            PROPERTIES_JSON,
            25,
            &[
                "https://www.realtor.com/realestateandhomes-detail/123-N-Main-St",
                "https://www.realtor.com/realestateandhomes-detail/9-E-Cactus-Rd",
            ],
        );

        let page = SearchResultsPage.parse(&html).unwrap();

        assert_eq!(page.total_count, 25);
        assert_eq!(page.listings.len(), 2);

        let first = &page.listings[0];
        assert_eq!(first.price, Some(550_000));
        assert_eq!(first.address.street.as_deref(), Some("123 N Main St"));
        assert_eq!(first.address.city.as_deref(), Some("Scottsdale"));
        assert_eq!(first.address.zip.as_deref(), Some("85251"));
        assert_eq!(first.address.state.as_deref(), Some("AZ"));
        assert_eq!(first.beds, Some(3));
        assert_eq!(first.baths, Some(2.5));
        assert_eq!(first.lot_sqft, Some(7200));
        assert_eq!(first.sqft, Some(1850));
        assert_eq!(
            first.sold_date,
            NaiveDate::from_ymd_opt(2024, 5, 17)
        );
        assert_eq!(first.sold_price, Some(540_000));
        assert_eq!(
            first.url,
            "https://www.realtor.com/realestateandhomes-detail/123-N-Main-St"
        );

        let second = &page.listings[1];
        assert_eq!(second.beds, Some(4));
        assert_eq!(second.baths, Some(3.0));
        assert_eq!(second.lot_sqft, None);
        assert_eq!(second.sold_date, None);
        assert_eq!(
            second.url,
            "https://www.realtor.com/realestateandhomes-detail/9-E-Cactus-Rd"
        );
    }

    #[test]
    fn test_missing_main_blob_names_the_blob() {
        let html = r#"<html><body>
            <script type="application/ld+json" data-testid="seoLinkingData">
            [{}, {"mainEntity":{"itemListElement":[]}}]
            </script>
            </body></html>"#;

        let err = SearchResultsPage.parse(html).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Parse { block: "__NEXT_DATA__", .. }
        ));
    }

    #[test]
    fn test_missing_linking_blob_names_the_blob() {
        let html = r#"<html><body>
            <script id="__NEXT_DATA__" type="application/json">
            {"props":{"pageProps":{"totalProperties":0,"properties":[]}}}
            </script>
            </body></html>"#;

        let err = SearchResultsPage.parse(html).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Parse { block: "seoLinkingData", .. }
        ));
    }

    #[test]
    fn test_malformed_main_blob_is_a_parse_error() {
        let html = r#"<html><body>
            <script id="__NEXT_DATA__" type="application/json">{"props":{}}</script>
            <script data-testid="seoLinkingData">[{}, {"mainEntity":{"itemListElement":[]}}]</script>
            </body></html>"#;

        let err = SearchResultsPage.parse(html).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Parse { block: "__NEXT_DATA__", .. }
        ));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let html = search_html(
            PROPERTIES_JSON,
            25,
            &["https://www.realtor.com/realestateandhomes-detail/123-N-Main-St"],
        );

        let err = SearchResultsPage.parse(&html).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::LinkCountMismatch { summaries: 2, links: 1 }
        ));
    }

    #[test]
    fn test_unparseable_baths_become_none() {
        let properties = r#"[{
            "list_price": 400000,
            "description": {"beds": 2, "baths_consolidated": "3+"}
        }]"#;
        let html = search_html(properties, 1, &["https://example.com/h"]);

        let page = SearchResultsPage.parse(&html).unwrap();
        assert_eq!(page.listings[0].baths, None);
        assert_eq!(page.listings[0].address, Address::default());
    }

    #[test]
    fn test_empty_results_page() {
        let html = search_html("[]", 0, &[]);

        let page = SearchResultsPage.parse(&html).unwrap();
        assert!(page.listings.is_empty());
        assert_eq!(page.total_count, 0);
    }
}
