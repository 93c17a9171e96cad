//! Facet model: filter definitions supplied by the catalog API and the
//! visitor's active selections.
//!
//! Definitions are read-only to the storefront; they are fetched once per
//! page load and replaced only on hard navigation. Selections are mutated
//! exclusively through [`ActiveFilters`], which owns the set invariants.

use serde::{Deserialize, Serialize};

use crate::types::id::{NutrientId, OptionId};

/// How a facet is presented and narrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterType {
    /// A set of selectable options.
    Checkbox,
    /// A numeric range narrowed via a slider.
    Range,
}

/// A facet exposed by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefinition {
    pub id: i32,
    /// Stable facet name, e.g. `"Brand"`.
    pub key: String,
    /// Localized display name.
    pub name: String,
    pub filter_type: FilterType,
    #[serde(default)]
    pub options: Vec<FilterOption>,
}

/// One selectable value within a facet.
///
/// `count` is recomputed by the backend on every search and is purely
/// informational; it never gates whether an option is selectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: OptionId,
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

/// An inclusive numeric range for one nutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientRange {
    pub id: NutrientId,
    pub minimal: f64,
    pub maximum: f64,
}

/// The visitor's current choice for one facet: either a set of option ids
/// (checkbox facets) or a nutrient range (range facets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveFilterSelection {
    pub key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<OptionId>,
    #[serde(rename = "itemBetween", default, skip_serializing_if = "Vec::is_empty")]
    pub item_between: Vec<NutrientRange>,
}

/// The set of facets the visitor has engaged.
///
/// Invariants, maintained by every mutation:
/// - at most one selection per distinct `key`;
/// - a checkbox selection whose `values` empties is removed entirely, never
///   left in place with an empty array;
/// - a range update for an already-present key replaces the previous range
///   wholesale rather than merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveFilters(Vec<ActiveFilterSelection>);

impl ActiveFilters {
    /// Create an empty selection set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Restore a selection set from a persisted snapshot, re-applying every
    /// entry so the invariants hold even if the snapshot was tampered with.
    #[must_use]
    pub fn from_selections(selections: Vec<ActiveFilterSelection>) -> Self {
        let mut set = Self::new();
        for selection in selections {
            for value in &selection.values {
                set.toggle(&selection.key, *value, true);
            }
            if let Some(range) = selection.item_between.into_iter().next() {
                set.set_range(&selection.key, range);
            }
        }
        set
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ActiveFilterSelection] {
        &self.0
    }

    /// Clone the selections into an owned list (used to build requests that
    /// must not alias controller-owned state).
    #[must_use]
    pub fn to_vec(&self) -> Vec<ActiveFilterSelection> {
        self.0.clone()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActiveFilterSelection> {
        self.0.iter()
    }

    /// Look up the selection for a facet key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ActiveFilterSelection> {
        self.0.iter().find(|s| s.key == key)
    }

    /// Whether an option is currently selected under a facet key.
    #[must_use]
    pub fn contains(&self, key: &str, option: OptionId) -> bool {
        self.get(key).is_some_and(|s| s.values.contains(&option))
    }

    /// Select (`selected = true`) or deselect an option under a facet key.
    ///
    /// Selecting an already-selected option is a no-op; deselecting the last
    /// option removes the facet's entry from the set entirely.
    pub fn toggle(&mut self, key: &str, option: OptionId, selected: bool) {
        let pos = self.0.iter().position(|s| s.key == key);
        if selected {
            if let Some(selection) = pos.and_then(|i| self.0.get_mut(i)) {
                if !selection.values.contains(&option) {
                    selection.values.push(option);
                }
            } else {
                self.0.push(ActiveFilterSelection {
                    key: key.to_owned(),
                    values: vec![option],
                    item_between: Vec::new(),
                });
            }
        } else if let Some(i) = pos {
            let now_empty = self.0.get_mut(i).is_some_and(|selection| {
                selection.values.retain(|v| *v != option);
                selection.values.is_empty() && selection.item_between.is_empty()
            });
            if now_empty {
                self.0.remove(i);
            }
        }
    }

    /// Set the range for a facet key, replacing any previous selection under
    /// that key wholesale.
    pub fn set_range(&mut self, key: &str, range: NutrientRange) {
        if let Some(selection) = self.0.iter_mut().find(|s| s.key == key) {
            selection.values.clear();
            selection.item_between = vec![range];
        } else {
            self.0.push(ActiveFilterSelection {
                key: key.to_owned(),
                values: Vec::new(),
                item_between: vec![range],
            });
        }
    }

    /// Drop every selection.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<'a> IntoIterator for &'a ActiveFilters {
    type Item = &'a ActiveFilterSelection;
    type IntoIter = std::slice::Iter<'a, ActiveFilterSelection>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Slider state for one nutrient facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionalValue {
    pub id: NutrientId,
    pub name: String,
    pub min_value: f64,
    pub max_value: f64,
    /// Slider position. Sitting at `max_value` means "no restriction".
    pub current_value: f64,
}

impl NutritionalValue {
    /// Create a slider resting at its maximum, i.e. unrestricted.
    #[must_use]
    pub fn unrestricted(id: NutrientId, name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            id,
            name: name.into(),
            min_value: min,
            max_value: max,
            current_value: max,
        }
    }

    /// Move the slider back to its maximum.
    pub fn reset(&mut self) {
        self.current_value = self.max_value;
    }

    /// Whether the slider actually narrows the facet.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        self.current_value < self.max_value
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn brand(id: i32) -> OptionId {
        OptionId::new(id)
    }

    #[test]
    fn test_toggle_select_and_deselect() {
        let mut active = ActiveFilters::new();
        active.toggle("Brand", brand(3), true);
        active.toggle("Brand", brand(5), true);
        assert_eq!(active.len(), 1);
        assert!(active.contains("Brand", brand(3)));
        assert!(active.contains("Brand", brand(5)));

        active.toggle("Brand", brand(3), false);
        assert!(!active.contains("Brand", brand(3)));
        assert!(active.contains("Brand", brand(5)));
    }

    #[test]
    fn test_never_two_entries_per_key() {
        let mut active = ActiveFilters::new();
        for id in [1, 2, 3, 2, 1] {
            active.toggle("Category", brand(id), true);
        }
        assert_eq!(active.len(), 1);
        assert_eq!(active.get("Category").unwrap().values.len(), 3);
    }

    #[test]
    fn test_emptied_selection_is_removed_not_left_empty() {
        let mut active = ActiveFilters::new();
        active.toggle("Brand", brand(3), true);
        active.toggle("Brand", brand(3), false);
        assert!(active.is_empty());
        assert!(active.get("Brand").is_none());
    }

    #[test]
    fn test_deselect_unknown_key_is_noop() {
        let mut active = ActiveFilters::new();
        active.toggle("Brand", brand(3), false);
        assert!(active.is_empty());
    }

    #[test]
    fn test_select_is_idempotent() {
        let mut active = ActiveFilters::new();
        active.toggle("Brand", brand(3), true);
        active.toggle("Brand", brand(3), true);
        assert_eq!(active.get("Brand").unwrap().values, vec![brand(3)]);
    }

    #[test]
    fn test_range_replaces_not_merges() {
        let mut active = ActiveFilters::new();
        active.set_range(
            "Nutrient",
            NutrientRange {
                id: NutrientId::new(5),
                minimal: 0.0,
                maximum: 10.0,
            },
        );
        active.set_range(
            "Nutrient",
            NutrientRange {
                id: NutrientId::new(5),
                minimal: 2.0,
                maximum: 8.0,
            },
        );

        assert_eq!(active.len(), 1);
        let selection = active.get("Nutrient").unwrap();
        assert_eq!(
            selection.item_between,
            vec![NutrientRange {
                id: NutrientId::new(5),
                minimal: 2.0,
                maximum: 8.0,
            }]
        );
    }

    #[test]
    fn test_from_selections_reapplies_invariants() {
        // Two entries for the same key and an empty values array must not
        // survive a snapshot restore.
        let snapshot = vec![
            ActiveFilterSelection {
                key: "Brand".to_owned(),
                values: vec![brand(1)],
                item_between: Vec::new(),
            },
            ActiveFilterSelection {
                key: "Brand".to_owned(),
                values: vec![brand(2)],
                item_between: Vec::new(),
            },
            ActiveFilterSelection {
                key: "Category".to_owned(),
                values: Vec::new(),
                item_between: Vec::new(),
            },
        ];

        let active = ActiveFilters::from_selections(snapshot);
        assert_eq!(active.len(), 1);
        assert_eq!(active.get("Brand").unwrap().values, vec![brand(1), brand(2)]);
    }

    #[test]
    fn test_selection_wire_shape() {
        let mut active = ActiveFilters::new();
        active.set_range(
            "Nutrient",
            NutrientRange {
                id: NutrientId::new(5),
                minimal: 2.0,
                maximum: 8.0,
            },
        );

        let json = serde_json::to_value(&active).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "key": "Nutrient",
                "itemBetween": [{"id": 5, "minimal": 2.0, "maximum": 8.0}],
            }])
        );
    }

    #[test]
    fn test_nutritional_value_reset() {
        let mut nutrient = NutritionalValue::unrestricted(NutrientId::new(1), "Zout", 0.0, 25.0);
        assert!(!nutrient.is_restricted());
        nutrient.current_value = 4.0;
        assert!(nutrient.is_restricted());
        nutrient.reset();
        assert!((nutrient.current_value - 25.0).abs() < f64::EPSILON);
    }
}
