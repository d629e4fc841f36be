//! Query descriptors for the storefront data service.
//!
//! A [`DataQuery`] is plain data: building one has no side effects, and the
//! same descriptor can be issued any number of times. Gateways render it with
//! [`DataQuery::resource_path`] and its `Display` impl (OData system query
//! options), or evaluate it locally with [`DataQuery::apply`].
//!
//! ```text
//! FilterModel ──to_query()──▶ DataQuery ──▶ Gateway
//!                                 ▲
//! queries::{product_detail, shopping_cart, ...}
//! ```

mod eval;
mod filter;
mod property;
pub mod queries;
mod query;

pub use eval::Record;
pub use filter::{CriterionKind, FilterCriterion, FilterModel};
pub use property::{EntityKind, Property, Relation, Value};
pub use query::{DataQuery, OrderBy, Predicate, SortDirection};
