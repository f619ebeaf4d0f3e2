use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::ScrapeError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub state: Option<String>,
}

/// One listing as it appears on a search-results page, before any detail
/// page has been fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingSummary {
    pub price: Option<u64>,
    pub address: Address,
    pub url: String,
    pub beds: Option<u32>,
    pub baths: Option<f64>,
    pub lot_sqft: Option<u64>,
    pub sqft: Option<u64>,
    pub sold_date: Option<NaiveDate>,
    pub sold_price: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InteriorDetails {
    pub features: Option<Vec<String>>,
    pub heating_cooling: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExteriorDetails {
    pub features: Option<Vec<String>>,
    pub lot_features: Option<Vec<String>>,
    pub pool_spa: Option<Vec<String>>,
    pub garage_parking: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommunityDetails {
    pub hoa: Option<Vec<String>>,
}

/// Stories and style are free text on the site, recovered by pattern
/// matching rather than read from structured fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConstructionDetails {
    pub stories: Option<u32>,
    pub architectural_style: Option<String>,
}

/// Everything scraped from a single listing's own page: the key-facts pairs
/// shown in the DOM plus the categorized feature groups from the embedded
/// details blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingDetails {
    pub key_facts: BTreeMap<String, String>,
    pub interior: InteriorDetails,
    pub exterior: ExteriorDetails,
    pub community: CommunityDetails,
    pub construction: ConstructionDetails,
}

/// A merged listing record. `details` is `None` when deep fetching is
/// disabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    #[serde(flatten)]
    pub summary: ListingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ListingDetails>,
}

/// A detail fetch that failed while the rest of the page completed.
#[derive(Debug)]
pub struct DetailFailure {
    pub url: String,
    pub error: ScrapeError,
}
