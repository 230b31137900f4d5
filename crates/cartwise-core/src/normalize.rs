//! # Product Boundary Adapter
//!
//! Turns the inconsistent product JSON the search API (and older persisted
//! favorites) produce into the single [`Product`] record.
//!
//! ## Alias Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Field          Accepted spellings (first usable wins)                  │
//! │  ─────          ──────────────────────────────────────                  │
//! │  product_id     product_id            number or string, must be truthy  │
//! │  master id      masterproductid       number or string, must be truthy  │
//! │  name           name → productName                                      │
//! │  image          imageUrl → image_url → image → images[0]                │
//! │  price          price → lowest_price → price_range.min                  │
//! │                 (first finite value > 0, else "unavailable")            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rule lives in this file; nothing downstream looks at raw JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;

// =============================================================================
// Raw Product
// =============================================================================

/// A product exactly as it arrives, every alias optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProduct {
    #[serde(default, deserialize_with = "lenient_id")]
    pub masterproductid: Option<String>,

    #[serde(default, deserialize_with = "lenient_id")]
    pub product_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,

    #[serde(default, rename = "productName", deserialize_with = "lenient_text")]
    pub product_name: Option<String>,

    #[serde(default, rename = "imageUrl", deserialize_with = "lenient_text")]
    pub image_url_camel: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub image_url: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub image: Option<String>,

    #[serde(default, deserialize_with = "lenient_images")]
    pub images: Vec<String>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<f64>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub lowest_price: Option<f64>,

    #[serde(default)]
    pub price_range: Option<PriceRange>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub brand: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,

    /// Only present on persisted favorites.
    #[serde(default, alias = "favoritedAt")]
    pub favorited_at: Option<DateTime<Utc>>,
}

/// `price_range` object on aggregated search results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceRange {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub min: Option<f64>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub max: Option<f64>,
}

impl RawProduct {
    /// Effective price of this record; see [`effective_price`].
    pub fn effective_price(&self) -> Option<Money> {
        effective_price(
            self.price,
            self.lowest_price,
            self.price_range.as_ref().and_then(|r| r.min),
        )
    }

    fn display_name(&self) -> Option<String> {
        self.name.clone().or_else(|| self.product_name.clone())
    }

    fn primary_image(&self) -> Option<String> {
        self.image_url_camel
            .clone()
            .or_else(|| self.image_url.clone())
            .or_else(|| self.image.clone())
            .or_else(|| self.images.first().cloned())
    }
}

impl From<RawProduct> for Product {
    fn from(raw: RawProduct) -> Self {
        Product {
            price: raw.effective_price(),
            name: raw.display_name(),
            image_url: raw.primary_image(),
            product_id: raw.product_id,
            master_product_id: raw.masterproductid,
            brand: raw.brand,
            description: raw.description,
        }
    }
}

/// Price fallback chain: the first finite, strictly positive candidate wins.
///
/// ## Example
/// ```rust
/// use cartwise_core::normalize::effective_price;
///
/// let price = effective_price(Some(f64::NAN), Some(5.0), None);
/// assert_eq!(price.map(|p| p.cents()), Some(500));
///
/// assert_eq!(effective_price(Some(0.0), None, Some(-1.0)), None);
/// ```
pub fn effective_price(
    price: Option<f64>,
    lowest_price: Option<f64>,
    range_min: Option<f64>,
) -> Option<Money> {
    [price, lowest_price, range_min]
        .into_iter()
        .flatten()
        .find(|v| v.is_finite() && *v > 0.0)
        .and_then(Money::from_decimal)
}

// =============================================================================
// Search Response
// =============================================================================

/// Body of a product search endpoint.
///
/// Some endpoints return a bare array, others wrap it as
/// `{ "products": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    List(Vec<RawProduct>),
    Wrapped {
        products: Vec<RawProduct>,
    },
}

impl SearchResponse {
    /// Normalizes every record in the response.
    pub fn into_products(self) -> Vec<Product> {
        let raw = match self {
            SearchResponse::List(products) => products,
            SearchResponse::Wrapped { products } => products,
        };
        raw.into_iter().map(Product::from).collect()
    }
}

/// Decodes a search response body into normalized products.
///
/// ## Example
/// ```rust
/// use cartwise_core::normalize::parse_search_response;
///
/// let wrapped = r#"{"products":[{"masterproductid":"m1","productName":"Eggs"}]}"#;
/// let products = parse_search_response(wrapped).unwrap();
/// assert_eq!(products[0].name.as_deref(), Some("Eggs"));
///
/// assert!(parse_search_response("not json").is_err());
/// ```
pub fn parse_search_response(body: &str) -> CoreResult<Vec<Product>> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| CoreError::InvalidResponse(e.to_string()))?;
    Ok(response.into_products())
}

// =============================================================================
// Lenient Field Parsers
// =============================================================================

/// Id as number or string. Falsy values (0, "", null) are absent.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => id_from_number(n),
        _ => None,
    }
}

fn id_from_number(n: &Number) -> Option<String> {
    if let Some(u) = n.as_u64() {
        return (u != 0).then(|| u.to_string());
    }
    if let Some(i) = n.as_i64() {
        return (i != 0).then(|| i.to_string());
    }
    let f = n.as_f64().filter(|f| f.is_finite() && *f != 0.0)?;
    // 42.0 is the same product as 42
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some((f as i64).to_string())
    } else {
        Some(f.to_string())
    }
}

/// Number, numeric string, or nothing. "NaN" parses to NaN and is rejected
/// later by the price chain.
fn lenient_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Non-empty string; anything else is absent.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// `images` as a list of URLs or of `{ "url": ... }` objects.
fn lenient_images<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(entries)) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Object(mut map) => match map.remove("url") {
                Some(Value::String(s)) if !s.is_empty() => Some(s),
                _ => None,
            },
            _ => None,
        })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Product {
        let raw: RawProduct = serde_json::from_str(json).unwrap();
        Product::from(raw)
    }

    #[test]
    fn test_numeric_product_id_becomes_string() {
        let p = parse(r#"{"product_id": 42, "masterproductid": "m-42"}"#);
        assert_eq!(p.product_id.as_deref(), Some("42"));
        assert_eq!(p.master_product_id.as_deref(), Some("m-42"));
        assert_eq!(p.identity(), "42");
    }

    #[test]
    fn test_falsy_ids_are_absent() {
        let p = parse(r#"{"product_id": 0, "masterproductid": ""}"#);
        assert_eq!(p.product_id, None);
        assert_eq!(p.master_product_id, None);
        assert_eq!(p.identity(), "0");
    }

    #[test]
    fn test_float_id_without_fraction() {
        let p = parse(r#"{"product_id": 42.0}"#);
        assert_eq!(p.product_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_numeric_master_id() {
        let p = parse(r#"{"masterproductid": 9001}"#);
        assert_eq!(p.master_product_id.as_deref(), Some("9001"));
    }

    #[test]
    fn test_name_aliases() {
        assert_eq!(parse(r#"{"name": "A", "productName": "B"}"#).name.as_deref(), Some("A"));
        assert_eq!(parse(r#"{"productName": "B"}"#).name.as_deref(), Some("B"));
        assert_eq!(parse(r#"{"name": "", "productName": "B"}"#).name.as_deref(), Some("B"));
    }

    #[test]
    fn test_image_aliases_in_priority_order() {
        let p = parse(r#"{"image": "c", "image_url": "b", "imageUrl": "a"}"#);
        assert_eq!(p.image_url.as_deref(), Some("a"));

        let p = parse(r#"{"image": "c", "image_url": "b"}"#);
        assert_eq!(p.image_url.as_deref(), Some("b"));

        let p = parse(r#"{"images": ["d", "e"]}"#);
        assert_eq!(p.image_url.as_deref(), Some("d"));

        let p = parse(r#"{"images": [{"url": "f"}]}"#);
        assert_eq!(p.image_url.as_deref(), Some("f"));

        assert_eq!(parse(r#"{"images": null}"#).image_url, None);
    }

    #[test]
    fn test_price_chain() {
        assert_eq!(parse(r#"{"price": 10}"#).price, Some(Money::from_cents(1000)));
        assert_eq!(
            parse(r#"{"price": "NaN", "lowest_price": 5}"#).price,
            Some(Money::from_cents(500))
        );
        assert_eq!(
            parse(r#"{"price": 0, "lowest_price": null, "price_range": {"min": "2.50"}}"#).price,
            Some(Money::from_cents(250))
        );
        assert_eq!(parse(r#"{"price": -3, "lowest_price": 0}"#).price, None);
        assert_eq!(parse(r#"{}"#).price, None);
    }

    #[test]
    fn test_effective_price_skips_nan() {
        assert_eq!(
            effective_price(Some(f64::NAN), Some(5.0), Some(1.0)),
            Some(Money::from_cents(500))
        );
    }

    #[test]
    fn test_unknown_fields_and_wrong_types_are_tolerated() {
        let p = parse(r#"{"name": 12, "brand": null, "retailer": "X", "rating": 4.5}"#);
        assert_eq!(p.name, None);
        assert_eq!(p.brand, None);
    }

    #[test]
    fn test_search_response_bare_array() {
        let products = parse_search_response(r#"[{"product_id": 1}, {"product_id": 2}]"#).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].identity(), "2");
    }

    #[test]
    fn test_search_response_wrapped() {
        let body = r#"{"products": [{"masterproductid": "m1", "lowest_price": 1.25}], "total": 1}"#;
        let products = parse_search_response(body).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, Some(Money::from_cents(125)));
    }

    #[test]
    fn test_search_response_rejects_garbage() {
        let err = parse_search_response(r#"{"items": 3}"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidResponse(_)));
    }
}
