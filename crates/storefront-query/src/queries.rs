//! The queries each screen issues.

use storefront_core::{ProductId, CURRENT_USER_CART_ID};

use crate::property::{EntityKind, Property, Relation};
use crate::query::{DataQuery, SortDirection};

/// Base query for the product list: the fields a row shows plus the primary
/// image, ordered by name.
pub fn product_list() -> DataQuery {
    DataQuery::new(EntityKind::Product)
        .select([
            Property::ProductId,
            Property::ProductName,
            Property::ProductDescription,
            Property::ProductPrice,
            Property::ProductCurrencyCode,
            Property::ProductMainCategoryName,
            Property::ProductStockAvailability,
        ])
        .expand(Relation::ProductPrimaryImage)
        .order_by(Property::ProductName, SortDirection::Ascending)
}

/// One product with all images and its `top_reviews` most helpful reviews.
pub fn product_detail(id: &ProductId, top_reviews: usize) -> DataQuery {
    let reviews = DataQuery::new(EntityKind::Review)
        .order_by(Property::ReviewHelpfulCount, SortDirection::Descending)
        .top(top_reviews);

    DataQuery::new(EntityKind::Product)
        .with_key(id.0.as_str())
        .expand(Relation::ProductImages)
        .expand_with(Relation::ProductReviews, reviews)
}

/// The current user's cart with every item, its product and the product's
/// primary image, fetched in one request.
pub fn shopping_cart() -> DataQuery {
    let product = DataQuery::new(EntityKind::Product)
        .select([
            Property::ProductId,
            Property::ProductName,
            Property::ProductDescription,
            Property::ProductPrice,
            Property::ProductCurrencyCode,
        ])
        .expand(Relation::ProductPrimaryImage);

    let items = DataQuery::new(EntityKind::ShoppingCartItem)
        .expand_with(Relation::ShoppingCartItemProduct, product);

    DataQuery::new(EntityKind::ShoppingCart)
        .with_key(CURRENT_USER_CART_ID)
        .expand_with(Relation::ShoppingCartItems, items)
}

/// Just enough of the cart to count items for a badge.
pub fn cart_item_count() -> DataQuery {
    let items = DataQuery::new(EntityKind::ShoppingCartItem)
        .select([Property::ShoppingCartItemQuantity]);

    DataQuery::new(EntityKind::ShoppingCart)
        .with_key(CURRENT_USER_CART_ID)
        .expand_with(Relation::ShoppingCartItems, items)
}
