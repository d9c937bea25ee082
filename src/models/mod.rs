use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Nested postal address of a listing.
///
/// Values stay as the page wrote them: a zip may arrive as `85001` or `"85001"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub street_address: Option<Value>,
    pub address_locality: Option<Value>,
    pub address_region: Option<Value>,
    pub postal_code: Option<Value>,
}

/// Nested coordinates of a listing, numbers or strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

/// Structured-data blob embedded in one listing card, plus the card's price text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<Value>,
    pub name: Option<String>,
    pub address: Option<PostalAddress>,
    pub geo: Option<GeoCoordinates>,
    /// Usually `{"value": "1,800", "unitText": "sqft"}`; kept loose on purpose
    pub floor_size: Option<Value>,
    /// Whitespace-separated tokens of the card's display price
    #[serde(skip_deserializing, default)]
    pub price: Vec<String>,
    /// Remaining fields (`url` and friends), in page order
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Flat listing ready for export
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedListing {
    pub floor_size: String,
    pub price: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub full_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NormalizedListing {
    /// Cell text for an export column, `None` when the listing has no such field
    pub fn field(&self, column: &str) -> Option<String> {
        match column {
            "floorSize" => Some(self.floor_size.clone()),
            "price" => Some(self.price.clone()),
            "streetAddress" => Some(self.street_address.clone()),
            "city" => Some(self.city.clone()),
            "state" => Some(self.state.clone()),
            "zip" => Some(self.zip.clone()),
            "fullAddress" => Some(self.full_address.clone()),
            "latitude" => self.latitude.as_ref().map(value_text),
            "longitude" => self.longitude.as_ref().map(value_text),
            other => self.extra.get(other).map(value_text),
        }
    }
}

/// Cell text of a JSON value: strings unquoted, numbers as written on the page
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_listing_reads_schema_blob() {
        let blob = json!({
            "@type": "SingleFamilyResidence",
            "@context": "http://schema.org",
            "name": "7510 E Main St, Scottsdale, AZ 85251",
            "floorSize": {"@type": "QuantitativeValue", "@context": "http://schema.org", "value": "1,800"},
            "address": {
                "@type": "PostalAddress",
                "streetAddress": "7510 E Main St",
                "addressLocality": "Scottsdale",
                "addressRegion": "AZ",
                "postalCode": "85251"
            },
            "geo": {"@type": "GeoCoordinates", "latitude": 33.49, "longitude": -111.92},
            "url": "https://example.com/homedetails/1"
        });

        let listing: RawListing = serde_json::from_value(blob).unwrap();

        assert_eq!(listing.schema_type, Some(json!("SingleFamilyResidence")));
        assert_eq!(listing.address.unwrap().address_locality, Some(json!("Scottsdale")));
        assert_eq!(listing.geo.unwrap().latitude, Some(json!(33.49)));
        assert_eq!(listing.extra.keys().collect::<Vec<_>>(), vec!["url"]);
        assert!(listing.price.is_empty());
    }

    #[test]
    fn field_looks_up_flat_and_extra_columns() {
        let mut listing = NormalizedListing {
            price: "$450,000".to_string(),
            full_address: "1 A St".to_string(),
            latitude: Some(json!(33.0)),
            longitude: Some(json!("-111.9")),
            ..NormalizedListing::default()
        };
        listing.extra.insert("url".to_string(), json!("https://example.com/1"));

        assert_eq!(listing.field("price").as_deref(), Some("$450,000"));
        assert_eq!(listing.field("fullAddress").as_deref(), Some("1 A St"));
        assert_eq!(listing.field("latitude").as_deref(), Some("33.0"));
        assert_eq!(listing.field("longitude").as_deref(), Some("-111.9"));
        assert_eq!(listing.field("url").as_deref(), Some("https://example.com/1"));
        assert_eq!(listing.field("bedrooms"), None);
        assert_eq!(NormalizedListing::default().field("latitude"), None);
    }

    #[test]
    fn numeric_zip_and_string_coordinates_deserialize() {
        let listing: RawListing = serde_json::from_value(json!({
            "address": {"streetAddress": "1 A St", "postalCode": 85001},
            "geo": {"latitude": "33.5", "longitude": -111.9}
        }))
        .unwrap();

        assert_eq!(listing.address.unwrap().postal_code, Some(json!(85001)));
        let geo = listing.geo.unwrap();
        assert_eq!(geo.latitude, Some(json!("33.5")));
        assert_eq!(geo.longitude, Some(json!(-111.9)));
    }
}
