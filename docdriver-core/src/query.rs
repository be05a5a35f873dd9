//! Equality queries over records.
//!
//! A [`Query`] is a conjunction of field equality predicates. An empty query matches
//! every record in a collection. Backends execute queries by implementing
//! [`QueryVisitor`], which walks the query and produces a backend-native filter.
//!
//! ```ignore
//! use docdriver::query::Query;
//!
//! let query = Query::new()
//!     .eq("status", "active")
//!     .eq("age", 30);
//! ```

use crate::{error::DriverError, record::ID_FIELD, value::Value};

/// A single `field == value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// The field name to compare.
    pub field: String,
    /// The value the field must equal.
    pub value: Value,
}

/// A conjunction of equality predicates.
///
/// Predicates are kept in insertion order. Setting the same field twice keeps
/// the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<FieldFilter>,
}

impl Query {
    /// Creates an empty query, which matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias of [`Query::new`] that reads better at call sites.
    pub fn all() -> Self {
        Self::default()
    }

    /// A query selecting one record by identifier.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().eq(ID_FIELD, id.into())
    }

    /// Adds a `field == value` predicate.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Adds a `field == value` predicate in place.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();

        match self.filters.iter_mut().find(|f| f.field == field) {
            Some(existing) => existing.value = value,
            None => self.filters.push(FieldFilter { field, value }),
        }
    }

    /// The predicate value for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.filters
            .iter()
            .find(|f| f.field == field)
            .map(|f| &f.value)
    }

    /// The identifier this query looks up directly, if it names `_id` with a string.
    pub fn id(&self) -> Option<&str> {
        self.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True if this query matches every record.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Query::new();
        for (field, value) in iter {
            query.set(field, value);
        }
        query
    }
}

/// Walks a [`Query`] to produce a backend-specific result.
///
/// Implementors get [`QueryVisitor::visit_query`] for free, which dispatches on the
/// number of predicates.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DriverError>;

    /// Called for an empty query.
    fn visit_match_all(&mut self) -> Result<Self::Output, Self::Error>;
    /// Called for a single predicate.
    fn visit_eq(&mut self, field: &str, value: &Value) -> Result<Self::Output, Self::Error>;
    /// Called for two or more predicates that must all hold.
    fn visit_and(&mut self, filters: &[FieldFilter]) -> Result<Self::Output, Self::Error>;

    fn visit_query(&mut self, query: &Query) -> Result<Self::Output, Self::Error> {
        match query.filters() {
            [] => self.visit_match_all(),
            [single] => self.visit_eq(&single.field, &single.value),
            filters => self.visit_and(filters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Describe;

    impl QueryVisitor for Describe {
        type Output = String;
        type Error = DriverError;

        fn visit_match_all(&mut self) -> Result<String, DriverError> {
            Ok("*".into())
        }

        fn visit_eq(&mut self, field: &str, value: &Value) -> Result<String, DriverError> {
            Ok(format!("{field}={value:?}"))
        }

        fn visit_and(&mut self, filters: &[FieldFilter]) -> Result<String, DriverError> {
            filters
                .iter()
                .map(|f| self.visit_eq(&f.field, &f.value))
                .collect::<Result<Vec<_>, _>>()
                .map(|parts| parts.join(" AND "))
        }
    }

    #[test]
    fn test_empty_query_matches_all() {
        assert!(Query::all().is_empty());
        assert_eq!(Describe.visit_query(&Query::new()).unwrap(), "*");
    }

    #[test]
    fn test_visitor_dispatch() {
        let single = Query::new().eq("a", 1);
        assert_eq!(Describe.visit_query(&single).unwrap(), "a=Integer(1)");

        let both = Query::new().eq("a", 1).eq("b", "x");
        assert_eq!(
            Describe.visit_query(&both).unwrap(),
            r#"a=Integer(1) AND b=String("x")"#
        );
    }

    #[test]
    fn test_same_field_keeps_last_value() {
        let query = Query::new().eq("a", 1).eq("a", 2);

        assert_eq!(query.len(), 1);
        assert_eq!(query.get("a"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_id_lookup() {
        assert_eq!(Query::by_id("abc").id(), Some("abc"));
        assert_eq!(Query::new().eq("_id", 7).id(), None);
        assert_eq!(Query::new().eq("name", "x").id(), None);
    }

    #[test]
    fn test_from_iterator() {
        let query: Query = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(query.len(), 2);
    }
}
