//! Wire shapes for the catalog search and autocomplete endpoints.
//!
//! Field names follow the catalog API contract exactly (camelCase keys,
//! `voedingswaardes` for the nutrient bounds array), so these types serialize
//! straight onto the wire.

use serde::{Deserialize, Serialize};

use crate::types::facet::{ActiveFilterSelection, FilterOption};
use crate::types::id::{BrandId, NutrientId, ProductId};

/// The outbound search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Free-text keyword; empty means "no text filter".
    pub keyword: String,
    pub filters: Vec<ActiveFilterSelection>,
    /// 0-based page index.
    pub page_index: u32,
    pub page_size: u32,
}

/// One product hit in a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProduct {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Per-option counts for one facet under the current query context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetCounts {
    pub key: String,
    #[serde(default)]
    pub options: Vec<FilterOption>,
}

/// Nutrient range bounds available given the current query context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientBounds {
    pub id: NutrientId,
    pub name: String,
    pub min_value: f64,
    pub max_value: f64,
}

/// Catalog search response.
///
/// Replaced wholesale on every successful search; never partially mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total matching count (not the size of `products`, which is one page).
    pub results: u64,
    #[serde(default)]
    pub products: Vec<SearchProduct>,
    #[serde(default)]
    pub filters: Vec<FacetCounts>,
    #[serde(rename = "voedingswaardes", default)]
    pub nutrient_bounds: Vec<NutrientBounds>,
}

/// One autocomplete suggestion (display-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub slug: String,
}

/// Autocomplete response, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResult {
    #[serde(default)]
    pub products: Vec<Suggestion>,
    #[serde(default)]
    pub brands: Vec<Suggestion>,
}

impl SuggestionResult {
    /// Check if there are any suggestions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.brands.is_empty()
    }
}

/// A brand from the brands endpoint.
///
/// Used to enrich the synthetic `Brand` facet with names and counts. A brand
/// referenced by an active selection may be missing from the current list;
/// such selections stay active and are displayed by id rather than dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_wire_shape() {
        let params = SearchParams {
            keyword: "kaas".to_owned(),
            filters: Vec::new(),
            page_index: 2,
            page_size: 21,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "keyword": "kaas",
                "filters": [],
                "pageIndex": 2,
                "pageSize": 21,
            })
        );
    }

    #[test]
    fn test_search_result_decodes_sparse_payload() {
        // The backend omits empty arrays; only `results` is guaranteed.
        let result: SearchResult = serde_json::from_str(r#"{"results": 0}"#).unwrap();
        assert_eq!(result.results, 0);
        assert!(result.products.is_empty());
        assert!(result.filters.is_empty());
        assert!(result.nutrient_bounds.is_empty());
    }

    #[test]
    fn test_search_result_decodes_nutrient_bounds() {
        let payload = r#"{
            "results": 12,
            "voedingswaardes": [
                {"id": 1, "name": "Zout", "minValue": 0.0, "maxValue": 25.0}
            ]
        }"#;
        let result: SearchResult = serde_json::from_str(payload).unwrap();
        assert_eq!(result.nutrient_bounds.len(), 1);
        assert_eq!(result.nutrient_bounds[0].name, "Zout");
    }
}
