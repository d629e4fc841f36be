//! Search and filter state for the product list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use storefront_core::StockAvailability;

use crate::property::{Property, Value};
use crate::queries;
use crate::query::{DataQuery, Predicate};

/// Which slot a criterion occupies. A model holds at most one per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CriterionKind {
    Category,
    PriceRange,
    Stock,
}

/// A structured filter the user picked on the filter screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterCriterion {
    /// Only products whose main category equals this name.
    Category(String),

    /// Inclusive price bounds; a missing bound is open.
    PriceRange {
        min: Option<Decimal>,
        max: Option<Decimal>,
    },

    /// Only products at this stock level.
    Stock(StockAvailability),
}

impl FilterCriterion {
    pub fn kind(&self) -> CriterionKind {
        match self {
            FilterCriterion::Category(_) => CriterionKind::Category,
            FilterCriterion::PriceRange { .. } => CriterionKind::PriceRange,
            FilterCriterion::Stock(_) => CriterionKind::Stock,
        }
    }

    /// A default criterion filters nothing and is not stored.
    pub fn is_default(&self) -> bool {
        match self {
            FilterCriterion::Category(name) => name.trim().is_empty(),
            FilterCriterion::PriceRange { min, max } => min.is_none() && max.is_none(),
            FilterCriterion::Stock(_) => false,
        }
    }

    fn predicates(&self) -> Vec<Predicate> {
        match self {
            FilterCriterion::Category(name) => vec![Predicate::Eq(
                Property::ProductMainCategoryName,
                Value::from(name.as_str()),
            )],
            FilterCriterion::PriceRange { min, max } => {
                let mut predicates = Vec::new();
                if let Some(min) = min {
                    predicates.push(Predicate::Ge(Property::ProductPrice, Value::Decimal(*min)));
                }
                if let Some(max) = max {
                    predicates.push(Predicate::Le(Property::ProductPrice, Value::Decimal(*max)));
                }
                predicates
            }
            FilterCriterion::Stock(stock) => vec![Predicate::Eq(
                Property::ProductStockAvailability,
                Value::Integer(stock.code()),
            )],
        }
    }
}

/// Current search text and filter criteria of the product list.
///
/// Two models with equal fields derive equal queries; the presentation layer
/// relies on this to decide whether a filter round trip changed anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterModel {
    search_text: String,
    criteria: BTreeMap<CriterionKind, FilterCriterion>,
}

impl FilterModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search text, trimming surrounding whitespace.
    pub fn set_search_text(&mut self, text: &str) {
        self.search_text = text.trim().to_string();
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Replace the criterion of the same kind. A default criterion clears it.
    pub fn set_filter(&mut self, criterion: FilterCriterion) {
        let criterion = match criterion {
            FilterCriterion::Category(name) => FilterCriterion::Category(name.trim().to_string()),
            other => other,
        };
        if criterion.is_default() {
            self.criteria.remove(&criterion.kind());
        } else {
            self.criteria.insert(criterion.kind(), criterion);
        }
    }

    pub fn clear_filter(&mut self, kind: CriterionKind) {
        self.criteria.remove(&kind);
    }

    pub fn criterion(&self, kind: CriterionKind) -> Option<&FilterCriterion> {
        self.criteria.get(&kind)
    }

    /// Number of non-default criteria, for the filter button badge.
    pub fn number_of_active_filters(&self) -> usize {
        self.criteria.len()
    }

    /// Title of the filter button: `"Filter"` or `"Filter (n)"`.
    pub fn filter_button_title(&self) -> String {
        match self.number_of_active_filters() {
            0 => "Filter".to_string(),
            n => format!("Filter ({})", n),
        }
    }

    /// The product list query for the current state.
    pub fn to_query(&self) -> DataQuery {
        let mut query = queries::product_list();

        if !self.search_text.is_empty() {
            query = query.search(self.search_text.clone());
        }

        for criterion in self.criteria.values() {
            for predicate in criterion.predicates() {
                query = query.filter(predicate);
            }
        }

        query
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn price(min: Option<i64>, max: Option<i64>) -> FilterCriterion {
        FilterCriterion::PriceRange {
            min: min.map(Decimal::from),
            max: max.map(Decimal::from),
        }
    }

    #[test]
    fn test_equal_models_derive_equal_queries() {
        let mut a = FilterModel::new();
        a.set_search_text("notebook");
        a.set_filter(FilterCriterion::Category("Notebooks".into()));
        a.set_filter(price(Some(100), None));

        // Same state reached in a different order.
        let mut b = FilterModel::new();
        b.set_filter(price(Some(100), None));
        b.set_search_text("  notebook ");
        b.set_filter(FilterCriterion::Category("Notebooks".into()));

        assert_eq!(a, b);
        assert_eq!(a.to_query(), b.to_query());
    }

    #[test]
    fn test_different_models_derive_different_queries() {
        let mut a = FilterModel::new();
        a.set_filter(FilterCriterion::Stock(StockAvailability::InStock));
        let mut b = FilterModel::new();
        b.set_filter(FilterCriterion::Stock(StockAvailability::LowStock));

        assert_ne!(a.to_query(), b.to_query());
    }

    #[test]
    fn test_default_model_is_the_plain_list_query() {
        assert_eq!(FilterModel::new().to_query(), queries::product_list());
    }

    #[test]
    fn test_search_text_is_trimmed() {
        let mut model = FilterModel::new();
        model.set_search_text("  printer\t");
        assert_eq!(model.search_text(), "printer");
        assert_eq!(model.to_query().search_text(), Some("printer"));

        model.set_search_text("   ");
        assert_eq!(model.to_query().search_text(), None);
    }

    #[test]
    fn test_active_filter_count() {
        let mut model = FilterModel::new();
        assert_eq!(model.number_of_active_filters(), 0);
        assert_eq!(model.filter_button_title(), "Filter");

        model.set_filter(FilterCriterion::Category("Printers".into()));
        model.set_filter(price(None, Some(500)));
        assert_eq!(model.number_of_active_filters(), 2);
        assert_eq!(model.filter_button_title(), "Filter (2)");

        // Search text is not a filter.
        model.set_search_text("laser");
        assert_eq!(model.number_of_active_filters(), 2);
    }

    #[test]
    fn test_default_criterion_clears_slot() {
        let mut model = FilterModel::new();
        model.set_filter(FilterCriterion::Category("Printers".into()));
        model.set_filter(FilterCriterion::Category(String::new()));
        assert_eq!(model.number_of_active_filters(), 0);
        assert!(model.criterion(CriterionKind::Category).is_none());

        model.set_filter(price(Some(1), Some(2)));
        model.set_filter(price(None, None));
        assert_eq!(model, FilterModel::new());
    }

    #[test]
    fn test_setting_same_kind_replaces() {
        let mut model = FilterModel::new();
        model.set_filter(FilterCriterion::Category("Printers".into()));
        model.set_filter(FilterCriterion::Category("Notebooks".into()));
        assert_eq!(model.number_of_active_filters(), 1);
        assert_eq!(
            model.criterion(CriterionKind::Category),
            Some(&FilterCriterion::Category("Notebooks".into()))
        );
    }

    #[test]
    fn test_criteria_become_conjunctive_predicates() {
        let mut model = FilterModel::new();
        model.set_filter(FilterCriterion::Category("Notebooks".into()));
        model.set_filter(price(Some(100), Some(1000)));
        model.set_filter(FilterCriterion::Stock(StockAvailability::InStock));

        let query = model.to_query();
        assert_eq!(query.predicates().count(), 4);
        insta::assert_snapshot!(
            query.to_string(),
            @"$select=Id,Name,Description,Price,CurrencyCode,MainCategoryName,StockAvailability&$expand=PrimaryImage&$filter=MainCategoryName eq 'Notebooks' and StockAvailability eq 1 and Price ge 100 and Price le 1000&$orderby=Name"
        );
    }

    #[test]
    fn test_price_scale_does_not_change_request() {
        let mut a = FilterModel::new();
        a.set_filter(price(Some(100), Some(1000)));
        let mut b = FilterModel::new();
        b.set_filter(FilterCriterion::PriceRange {
            min: Some(Decimal::new(10000, 2)),
            max: Some(Decimal::new(1_000_000, 3)),
        });

        assert_eq!(a, b);
        assert_eq!(a.to_query().to_string(), b.to_query().to_string());
    }

    #[test]
    fn test_clear_filter() {
        let mut model = FilterModel::new();
        model.set_filter(FilterCriterion::Stock(StockAvailability::OutOfStock));
        model.clear_filter(CriterionKind::Stock);
        assert_eq!(model.number_of_active_filters(), 0);
    }
}
