//! The `DataQuery` builder.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::property::{EntityKind, Property, Relation, Value};

/// Characters escaped inside free-form option values, so a value can never
/// end its own option (`&`), its nested option list (`;`, `)`) or the query
/// string (`#`).
const OPTION_VALUE: &AsciiSet = &CONTROLS
    .add(b'%')
    .add(b'&')
    .add(b';')
    .add(b'#')
    .add(b'+')
    .add(b'(')
    .add(b')');

fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, OPTION_VALUE).to_string()
}

/// `$search` term: bare when it is a single word, otherwise a quoted phrase
/// with `"` and `\` backslash-escaped.
fn search_term(text: &str) -> String {
    if !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return text.to_string();
    }
    let mut phrase = String::with_capacity(text.len() + 2);
    phrase.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            phrase.push('\\');
        }
        phrase.push(c);
    }
    phrase.push('"');
    phrase
}

/// Sort direction for `order_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    pub property: Property,
    pub direction: SortDirection,
}

/// A comparison between a property and a literal.
///
/// A query's predicates are combined conjunctively.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Predicate {
    Eq(Property, Value),
    Ge(Property, Value),
    Le(Property, Value),
}

impl Predicate {
    pub fn property(&self) -> Property {
        match self {
            Predicate::Eq(p, _) | Predicate::Ge(p, _) | Predicate::Le(p, _) => *p,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq(p, v) => write!(f, "{} eq {}", p.name(), v),
            Predicate::Ge(p, v) => write!(f, "{} ge {}", p.name(), v),
            Predicate::Le(p, v) => write!(f, "{} le {}", p.name(), v),
        }
    }
}

// =============================================================================
// DataQuery
// =============================================================================

/// A structured, serializable request descriptor for one entity kind.
///
/// `select`, `expand` and `filter` are set-like, so the order in which they
/// are called never affects equality or rendering. Ordering keys keep their
/// call order because it is significant.
///
/// Composition errors (selecting a property of another entity, expanding a
/// relation that starts elsewhere) are programmer errors and trip a debug
/// assertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataQuery {
    entity: EntityKind,
    key: Option<Value>,
    select: BTreeSet<Property>,
    expand: BTreeMap<Relation, DataQuery>,
    filter: BTreeSet<Predicate>,
    search: Option<String>,
    order_by: Vec<OrderBy>,
    skip: Option<usize>,
    top: Option<usize>,
}

impl DataQuery {
    /// An unrestricted query over `entity`.
    pub fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            key: None,
            select: BTreeSet::new(),
            expand: BTreeMap::new(),
            filter: BTreeSet::new(),
            search: None,
            order_by: Vec::new(),
            skip: None,
            top: None,
        }
    }

    /// Restrict to the single instance with this key.
    pub fn with_key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Restrict returned properties. No selection means all properties.
    pub fn select<I>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = Property>,
    {
        for property in properties {
            debug_assert_eq!(
                property.entity(),
                self.entity,
                "cannot select {:?} on a {:?} query",
                property,
                self.entity
            );
            self.select.insert(property);
        }
        self
    }

    /// Include a related entity or collection with all its properties.
    pub fn expand(self, relation: Relation) -> Self {
        let sub = DataQuery::new(relation.target());
        self.expand_with(relation, sub)
    }

    /// Include a related entity or collection shaped by `sub`.
    pub fn expand_with(mut self, relation: Relation, sub: DataQuery) -> Self {
        debug_assert_eq!(
            relation.source(),
            self.entity,
            "cannot expand {:?} on a {:?} query",
            relation,
            self.entity
        );
        debug_assert_eq!(
            sub.entity,
            relation.target(),
            "sub-query for {:?} must target {:?}",
            relation,
            relation.target()
        );
        self.expand.insert(relation, sub);
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        debug_assert_eq!(predicate.property().entity(), self.entity);
        self.filter.insert(predicate);
        self
    }

    /// Free-text search. An empty term clears the search.
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = if text.is_empty() { None } else { Some(text) };
        self
    }

    pub fn order_by(mut self, property: Property, direction: SortDirection) -> Self {
        debug_assert_eq!(property.entity(), self.entity);
        self.order_by.push(OrderBy {
            property,
            direction,
        });
        self
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.skip = Some(n);
        self
    }

    pub fn top(mut self, n: usize) -> Self {
        self.top = Some(n);
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn key(&self) -> Option<&Value> {
        self.key.as_ref()
    }

    pub fn selected(&self) -> &BTreeSet<Property> {
        &self.select
    }

    /// Whether `property` will be returned.
    pub fn includes(&self, property: Property) -> bool {
        self.select.is_empty() || self.select.contains(&property)
    }

    pub fn expansion(&self, relation: Relation) -> Option<&DataQuery> {
        self.expand.get(&relation)
    }

    pub fn expansions(&self) -> impl Iterator<Item = (Relation, &DataQuery)> {
        self.expand.iter().map(|(r, q)| (*r, q))
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.filter.iter()
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn ordering(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn skip_count(&self) -> Option<usize> {
        self.skip
    }

    pub fn top_count(&self) -> Option<usize> {
        self.top
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Entity-set path, with the key segment when the query is keyed.
    pub fn resource_path(&self) -> String {
        match &self.key {
            Some(key) => format!("{}({})", self.entity.entity_set(), key),
            None => self.entity.entity_set().to_string(),
        }
    }

    /// System query options, joined with `separator`.
    fn options(&self, separator: &str) -> String {
        let mut parts = Vec::new();

        if !self.select.is_empty() {
            let names: Vec<_> = self.select.iter().map(|p| p.name()).collect();
            parts.push(format!("$select={}", names.join(",")));
        }

        if !self.expand.is_empty() {
            let items: Vec<_> = self
                .expand
                .iter()
                .map(|(relation, sub)| {
                    let nested = sub.options(";");
                    if nested.is_empty() {
                        relation.name().to_string()
                    } else {
                        format!("{}({})", relation.name(), nested)
                    }
                })
                .collect();
            parts.push(format!("$expand={}", items.join(",")));
        }

        if !self.filter.is_empty() {
            let clauses: Vec<_> = self.filter.iter().map(|p| p.to_string()).collect();
            parts.push(format!("$filter={}", encode_value(&clauses.join(" and "))));
        }

        if let Some(search) = &self.search {
            parts.push(format!("$search={}", encode_value(&search_term(search))));
        }

        if !self.order_by.is_empty() {
            let keys: Vec<_> = self
                .order_by
                .iter()
                .map(|o| match o.direction {
                    SortDirection::Ascending => o.property.name().to_string(),
                    SortDirection::Descending => format!("{} desc", o.property.name()),
                })
                .collect();
            parts.push(format!("$orderby={}", keys.join(",")));
        }

        if let Some(skip) = self.skip {
            parts.push(format!("$skip={}", skip));
        }

        if let Some(top) = self.top {
            parts.push(format!("$top={}", top));
        }

        parts.join(separator)
    }
}

impl fmt::Display for DataQuery {
    /// Top-level system query options, e.g. `$select=Id,Name&$top=3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.options("&"))
    }
}

// =============================================================================
// Tests
// =============================================================================
