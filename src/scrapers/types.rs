use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Listings search endpoint
pub const DEFAULT_SEARCH_URL: &str = "https://www.zillow.com/homes/for_sale/";

/// Map bounding box, in the site's own coordinate convention.
///
/// No ordering checks are made; callers pass what the site expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub north: f64,
    pub east: f64,
    pub south: f64,
    pub west: f64,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            north: -115.56063652038574,
            east: -110.18832206726074,
            south: 31.701736103303432,
            west: 35.29649332118693,
        }
    }
}

/// What to search for: the region, its bounding box and the list preferences
#[derive(Debug, Clone, PartialEq)]
pub struct SearchArea {
    /// Free-text term shown in the site's search box
    pub search_term: String,
    pub bounds: MapBounds,
    pub map_zoom: u8,
    /// Site region identifier
    pub region_id: u64,
    /// Site region kind (6 = city)
    pub region_type: u32,
    /// Result ordering
    pub sort: String,
    pub ah: bool,
}

impl SearchArea {
    /// Same search, different bounding box
    pub fn with_bounds(mut self, bounds: MapBounds) -> Self {
        self.bounds = bounds;
        self
    }
}

impl Default for SearchArea {
    fn default() -> Self {
        Self {
            search_term: "Scottsdale, AZ".to_string(),
            bounds: MapBounds::default(),
            map_zoom: 14,
            region_id: 38590,
            region_type: 6,
            sort: "globalrelevanceex".to_string(),
            ah: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterValue<T> {
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub ah: FilterValue<bool>,
    pub sort: FilterValue<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSelection {
    pub region_id: u64,
    pub region_type: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQueryState {
    pub pagination: Map<String, Value>,
    pub users_search_term: String,
    pub map_bounds: MapBounds,
    pub map_zoom: u8,
    pub is_map_visible: bool,
    pub filter_state: FilterState,
    pub is_list_visible: bool,
    pub region_selection: Vec<RegionSelection>,
}

/// Search parameters sent with the listings request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub search_query_state: SearchQueryState,
}

impl SearchParams {
    pub fn for_area(area: &SearchArea) -> Self {
        Self {
            search_query_state: SearchQueryState {
                pagination: Map::new(),
                users_search_term: area.search_term.clone(),
                map_bounds: area.bounds,
                map_zoom: area.map_zoom,
                is_map_visible: true,
                filter_state: FilterState {
                    ah: FilterValue { value: area.ah },
                    sort: FilterValue {
                        value: area.sort.clone(),
                    },
                },
                is_list_visible: true,
                region_selection: vec![RegionSelection {
                    region_id: area.region_id,
                    region_type: area.region_type,
                }],
            },
        }
    }

    /// Query string form: the whole state travels as one JSON-encoded parameter.
    pub fn query_pairs(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        let state = serde_json::to_string(&self.search_query_state)?;
        Ok(vec![("searchQueryState".to_string(), state)])
    }
}

/// How the live page is fetched
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub search_url: String,
    pub area: SearchArea,
    pub timeout: Duration,
    /// Extra attempts after the first one fails
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each one after
    pub retry_backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            area: SearchArea::default(),
            timeout: Duration::from_secs(30),
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_embedded_unchanged() {
        let bounds = MapBounds {
            north: 33.79,
            east: -111.72,
            south: 33.42,
            west: -112.01,
        };
        let params = SearchParams::for_area(&SearchArea::default().with_bounds(bounds));
        let value = serde_json::to_value(&params).unwrap();
        let map_bounds = &value["searchQueryState"]["mapBounds"];

        assert_eq!(map_bounds["north"], 33.79);
        assert_eq!(map_bounds["east"], -111.72);
        assert_eq!(map_bounds["south"], 33.42);
        assert_eq!(map_bounds["west"], -112.01);
        assert_eq!(map_bounds.as_object().unwrap().len(), 4);
    }

    #[test]
    fn default_area_targets_fixed_region() {
        let params = SearchParams::for_area(&SearchArea::default());
        let value = serde_json::to_value(&params).unwrap();
        let state = &value["searchQueryState"];

        assert_eq!(state["usersSearchTerm"], "Scottsdale, AZ");
        assert_eq!(state["regionSelection"][0]["regionId"], 38590);
        assert_eq!(state["regionSelection"][0]["regionType"], 6);
        assert_eq!(state["filterState"]["sort"]["value"], "globalrelevanceex");
        assert_eq!(state["filterState"]["ah"]["value"], true);
        assert_eq!(state["mapZoom"], 14);
        assert_eq!(state["pagination"], serde_json::json!({}));
        assert_eq!(state["mapBounds"]["north"], -115.56063652038574);
    }

    #[test]
    fn query_carries_state_as_json() {
        let params = SearchParams::for_area(&SearchArea::default());
        let pairs = params.query_pairs().unwrap();

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "searchQueryState");
        let decoded: SearchQueryState = serde_json::from_str(&pairs[0].1).unwrap();
        assert_eq!(decoded, params.search_query_state);
    }
}
