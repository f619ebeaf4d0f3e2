use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::PageScraper;
use crate::errors::ScrapeError;
use crate::models::{
    CommunityDetails, ConstructionDetails, ExteriorDetails, InteriorDetails, ListingDetails,
};

/// Scraper for a single listing's detail page.
///
/// Feature lists come from the embedded details blob, keyed by category
/// name. Key facts come from a separate DOM list the page renders visibly.
pub struct PropertyPage;

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
    #[serde(rename = "initialReduxState")]
    initial_redux_state: ReduxState,
}

#[derive(Deserialize)]
struct ReduxState {
    #[serde(rename = "propertyDetails")]
    property_details: PropertyDetailsNode,
}

#[derive(Deserialize)]
struct PropertyDetailsNode {
    details: Vec<DetailEntry>,
}

#[derive(Deserialize)]
struct DetailEntry {
    category: String,
    #[serde(default)]
    text: Vec<String>,
}

impl PageScraper for PropertyPage {
    type Output = ListingDetails;

    fn parse(&self, html: &str) -> Result<ListingDetails, ScrapeError> {
        let document = Html::parse_document(html);

        let mut categories = extract_detail_categories(&document)?;
        let key_facts = extract_key_facts(&document);

        let interior = InteriorDetails {
            features: categories.remove("Interior Features"),
            heating_cooling: categories.remove("Heating and Cooling"),
        };

        let exterior = ExteriorDetails {
            features: categories.remove("Home Features"),
            lot_features: categories.remove("Exterior and Lot Features"),
            pool_spa: categories.remove("Pool and Spa"),
            garage_parking: categories.remove("Garage and Parking"),
        };

        let community = CommunityDetails {
            hoa: categories.remove("Homeowners Association"),
        };

        let construction = categories
            .remove("Building and Construction")
            .map(|lines| construction_from(&lines))
            .unwrap_or_default();

        Ok(ListingDetails {
            key_facts,
            interior,
            exterior,
            community,
            construction,
        })
    }
}

fn extract_detail_categories(
    document: &Html,
) -> Result<BTreeMap<String, Vec<String>>, ScrapeError> {
    let selector = Selector::parse("script#__NEXT_DATA__")
        .map_err(|e| ScrapeError::parse("propertyDetails", e.to_string()))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| ScrapeError::parse("propertyDetails", "__NEXT_DATA__ element not found"))?;

    let text = element.text().collect::<String>();
    let data: NextData = serde_json::from_str(&text)
        .map_err(|e| ScrapeError::parse("propertyDetails", e.to_string()))?;

    Ok(data
        .props
        .page_props
        .initial_redux_state
        .property_details
        .details
        .into_iter()
        .map(|entry| (entry.category, entry.text))
        .collect())
}

/// First match wins for both patterns; the label text is matched literally.
fn construction_from(lines: &[String]) -> ConstructionDetails {
    let joined = lines.join("\n");

    let stories = Regex::new(r"Building Total Stories: (\d+)")
        .ok()
        .and_then(|pattern| pattern.captures(&joined))
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok());

    let architectural_style = Regex::new(r"Architectural Style: (.*)")
        .ok()
        .and_then(|pattern| pattern.captures(&joined))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string());

    ConstructionDetails {
        stories,
        architectural_style,
    }
}

fn extract_key_facts(document: &Html) -> BTreeMap<String, String> {
    let mut facts = BTreeMap::new();

    let (Ok(item_selector), Ok(label_selector), Ok(value_selector)) = (
        Selector::parse(r#"[data-testid="key-facts"] li"#),
        Selector::parse(".listing-key-fact-item-label"),
        Selector::parse(".listing-key-fact-item-value"),
    ) else {
        return facts;
    };

    for item in document.select(&item_selector) {
        let label = item
            .select(&label_selector)
            .next()
            .map(|el| el.text().collect::<String>());
        let value = item
            .select(&value_selector)
            .next()
            .map(|el| el.text().collect::<String>());

        if let (Some(label), Some(value)) = (label, value) {
            facts.insert(normalize_label(&label), value.trim().to_string());
        }
    }

    facts
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_html(details_json: &str, key_facts_html: &str) -> String {
        format!(
            r#"<html><body>
            <script id="__NEXT_DATA__" type="application/json">
            {{"props":{{"pageProps":{{"initialReduxState":{{"propertyDetails":{{"details":{details_json}}}}}}}}}}}
            </script>
            {key_facts_html}
            </body></html>"#
        )
    }

    const KEY_FACTS_HTML: &str = r#"
        <ul data-testid="key-facts">
            <li>
                <div class="listing-key-fact-item-label">Property type</div>
                <div class="listing-key-fact-item-value">Single family</div>
            </li>
            <li>
                <div class="listing-key-fact-item-label">Year built</div>
                <div class="listing-key-fact-item-value">1987</div>
            </li>
            <li>
                <div class="listing-key-fact-item-label">Price per sqft</div>
                <div class="listing-key-fact-item-value">$297</div>
            </li>
        </ul>"#;

    #[test]
    fn test_parses_construction_stories_and_style() {
        let html = detail_html(
            r#"[{"category":"Building and Construction",
                "text":["Year Built: 1987","Building Total Stories: 2","Architectural Style: Ranch"]}]"#,
            "",
        );

        let details = PropertyPage.parse(&html).unwrap();
        assert_eq!(details.construction.stories, Some(2));
        assert_eq!(
            details.construction.architectural_style.as_deref(),
            Some("Ranch")
        );
    }

    #[test]
    fn test_missing_construction_category_yields_empty_group() {
        let html = detail_html(
            r#"[{"category":"Interior Features","text":["Fireplace"]}]"#,
            "",
        );

        let details = PropertyPage.parse(&html).unwrap();
        assert_eq!(details.construction.stories, None);
        assert_eq!(details.construction.architectural_style, None);
    }

    #[test]
    fn test_categories_map_to_detail_groups() {
        let html = detail_html(
            r#"[
                {"category":"Interior Features","text":["Fireplace","Tile Floors"]},
                {"category":"Heating and Cooling","text":["Central Air"]},
                {"category":"Home Features","text":["Patio"]},
                {"category":"Exterior and Lot Features","text":["Corner Lot"]},
                {"category":"Pool and Spa","text":["Private Pool"]},
                {"category":"Garage and Parking","text":["Garage Spaces: 2"]},
                {"category":"Homeowners Association","text":["Association Fee: 120"]}
            ]"#,
            "",
        );

        let details = PropertyPage.parse(&html).unwrap();
        assert_eq!(
            details.interior.features,
            Some(vec!["Fireplace".to_string(), "Tile Floors".to_string()])
        );
        assert_eq!(
            details.interior.heating_cooling,
            Some(vec!["Central Air".to_string()])
        );
        assert_eq!(details.exterior.features, Some(vec!["Patio".to_string()]));
        assert_eq!(
            details.exterior.lot_features,
            Some(vec!["Corner Lot".to_string()])
        );
        assert_eq!(
            details.exterior.pool_spa,
            Some(vec!["Private Pool".to_string()])
        );
        assert_eq!(
            details.exterior.garage_parking,
            Some(vec!["Garage Spaces: 2".to_string()])
        );
        assert_eq!(
            details.community.hoa,
            Some(vec!["Association Fee: 120".to_string()])
        );
    }

    #[test]
    fn test_unrecognized_categories_are_ignored() {
        let html = detail_html(
            r#"[{"category":"Other Property Info","text":["Source Listing Status: Active"]}]"#,
            "",
        );

        let details = PropertyPage.parse(&html).unwrap();
        assert_eq!(details, ListingDetails::default());
    }

    #[test]
    fn test_key_facts_are_paired_and_normalized() {
        let html = detail_html("[]", KEY_FACTS_HTML);

        let details = PropertyPage.parse(&html).unwrap();
        assert_eq!(
            details.key_facts.get("property_type").map(String::as_str),
            Some("Single family")
        );
        assert_eq!(
            details.key_facts.get("year_built").map(String::as_str),
            Some("1987")
        );
        assert_eq!(
            details.key_facts.get("price_per_sqft").map(String::as_str),
            Some("$297")
        );
        assert_eq!(details.key_facts.len(), 3);
    }

    #[test]
    fn test_missing_key_facts_container_yields_empty_map() {
        let html = detail_html(r#"[{"category":"Interior Features","text":["Fireplace"]}]"#, "");

        let details = PropertyPage.parse(&html).unwrap();
        assert!(details.key_facts.is_empty());
    }

    #[test]
    fn test_missing_details_blob_is_a_parse_error() {
        let html = "<html><body><p>Not the page you wanted</p></body></html>";

        let err = PropertyPage.parse(html).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Parse { block: "propertyDetails", .. }
        ));
    }

    #[test]
    fn test_first_stories_match_wins() {
        let html = detail_html(
            r#"[{"category":"Building and Construction",
                "text":["Building Total Stories: 1","Building Total Stories: 3"]}]"#,
            "",
        );

        let details = PropertyPage.parse(&html).unwrap();
        assert_eq!(details.construction.stories, Some(1));
    }
}
