//! Client-side evaluation of a `DataQuery` over in-memory records.
//!
//! Ordering uses a stable sort: records that compare equal on every ordering
//! key keep the order they were fetched in. This is the tie-break rule for
//! "top N most helpful reviews".

use std::cmp::Ordering;

use storefront_core::{Product, ProductImage, Review, ShoppingCart, ShoppingCartItem};

use crate::property::{EntityKind, Property, Value};
use crate::query::{DataQuery, Predicate, SortDirection};

/// A record a `DataQuery` can be evaluated against.
pub trait Record {
    const ENTITY: EntityKind;

    /// Value of `property`, or `None` if this record has no such value.
    fn property(&self, property: Property) -> Option<Value>;

    /// Text fields matched by `$search`.
    fn search_fields(&self) -> Vec<&str> {
        Vec::new()
    }
}

impl DataQuery {
    /// Whether `record` satisfies the key, filter and search of this query.
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        debug_assert_eq!(R::ENTITY, self.entity());

        if let Some(key) = self.key() {
            if record.property(R::ENTITY.key_property()).as_ref() != Some(key) {
                return false;
            }
        }

        if !self.predicates().all(|p| predicate_holds(p, record)) {
            return false;
        }

        match self.search_text() {
            Some(text) => {
                let needle = text.to_lowercase();
                record
                    .search_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// Filter, order and page `records` the way the service would.
    pub fn apply<R, I>(&self, records: I) -> Vec<R>
    where
        R: Record,
        I: IntoIterator<Item = R>,
    {
        let mut matched: Vec<R> = records.into_iter().filter(|r| self.matches(r)).collect();

        if !self.ordering().is_empty() {
            matched.sort_by(|a, b| self.compare(a, b));
        }

        let skip = self.skip_count().unwrap_or(0);
        let top = self.top_count().unwrap_or(usize::MAX);
        matched.into_iter().skip(skip).take(top).collect()
    }

    fn compare<R: Record>(&self, a: &R, b: &R) -> Ordering {
        for key in self.ordering() {
            let ord = a.property(key.property).cmp(&b.property(key.property));
            let ord = match key.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn predicate_holds<R: Record>(predicate: &Predicate, record: &R) -> bool {
    match predicate {
        Predicate::Eq(p, v) => record.property(*p).as_ref() == Some(v),
        Predicate::Ge(p, v) => record.property(*p).is_some_and(|actual| &actual >= v),
        Predicate::Le(p, v) => record.property(*p).is_some_and(|actual| &actual <= v),
    }
}

// =============================================================================
// Record impls
// =============================================================================

impl Record for Product {
    const ENTITY: EntityKind = EntityKind::Product;

    fn property(&self, property: Property) -> Option<Value> {
        match property {
            Property::ProductId => Some(Value::from(self.id.0.as_str())),
            Property::ProductName => Some(Value::from(self.name.as_str())),
            Property::ProductDescription => Some(Value::from(self.description.as_str())),
            Property::ProductPrice => Some(Value::Decimal(self.price)),
            Property::ProductCurrencyCode => Some(Value::from(self.currency_code.as_str())),
            Property::ProductMainCategoryName => {
                Some(Value::from(self.main_category_name.as_str()))
            }
            Property::ProductStockAvailability => {
                Some(Value::Integer(self.stock_availability.code()))
            }
            _ => None,
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.description.as_str()]
    }
}

impl Record for Review {
    const ENTITY: EntityKind = EntityKind::Review;

    fn property(&self, property: Property) -> Option<Value> {
        match property {
            Property::ReviewId => Some(Value::from(self.id.as_str())),
            Property::ReviewHelpfulCount => Some(Value::Integer(self.helpful_count)),
            Property::ReviewComment => Some(Value::from(self.comment.as_str())),
            _ => None,
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.comment.as_str()]
    }
}

impl Record for ProductImage {
    const ENTITY: EntityKind = EntityKind::ProductImage;

    fn property(&self, property: Property) -> Option<Value> {
        match property {
            Property::ImageId => Some(Value::from(self.id.as_str())),
            Property::ImageUrl => Some(Value::from(self.url.as_str())),
            _ => None,
        }
    }
}

impl Record for ShoppingCartItem {
    const ENTITY: EntityKind = EntityKind::ShoppingCartItem;

    fn property(&self, property: Property) -> Option<Value> {
        match property {
            Property::ShoppingCartItemId => Some(Value::from(self.id.0.as_str())),
            Property::ShoppingCartItemProductId => Some(Value::from(self.product_id.0.as_str())),
            Property::ShoppingCartItemQuantity => Some(Value::Integer(i64::from(self.quantity))),
            _ => None,
        }
    }
}

impl Record for ShoppingCart {
    const ENTITY: EntityKind = EntityKind::ShoppingCart;

    fn property(&self, property: Property) -> Option<Value> {
        match property {
            Property::ShoppingCartId => Some(Value::Integer(self.id)),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
