//! Translation of driver queries into Firestore structured queries.

use docdriver_core::{
    query::{FieldFilter as Predicate, Query, QueryVisitor},
    value::Value as DriverValue,
};

use crate::{
    error::{FirestoreError, FirestoreResult},
    types::{
        CollectionSelector, CompositeFilter, CompositeOperator, FieldFilter, FieldOperator,
        FieldReference, Filter, StructuredQuery, UnaryFilter, UnaryOperator, Value,
    },
};

/// Builds the `where` clause of a structured query.
///
/// Null and NaN cannot be compared with `EQUAL` in Firestore, so they become unary
/// `IS_NULL` / `IS_NAN` filters.
#[derive(Debug, Default)]
pub struct FirestoreQueryTranslator;

impl FirestoreQueryTranslator {
    pub fn new() -> Self {
        Self
    }

    pub fn build(query: &Query) -> FirestoreResult<Option<Filter>> {
        Self::new().visit_query(query)
    }

    fn predicate(field: &str, value: &DriverValue) -> Filter {
        let unary = |op| {
            Filter::UnaryFilter(UnaryFilter {
                op,
                field: FieldReference::new(field),
            })
        };

        if value.is_null() {
            unary(UnaryOperator::IsNull)
        } else if value.is_nan() {
            unary(UnaryOperator::IsNan)
        } else {
            Filter::FieldFilter(FieldFilter {
                field: FieldReference::new(field),
                op: FieldOperator::Equal,
                value: Value::from(value),
            })
        }
    }
}

impl QueryVisitor for FirestoreQueryTranslator {
    type Output = Option<Filter>;
    type Error = FirestoreError;

    fn visit_match_all(&mut self) -> FirestoreResult<Self::Output> {
        Ok(None)
    }

    fn visit_eq(&mut self, field: &str, value: &DriverValue) -> FirestoreResult<Self::Output> {
        Ok(Some(Self::predicate(field, value)))
    }

    fn visit_and(&mut self, filters: &[Predicate]) -> FirestoreResult<Self::Output> {
        Ok(Some(Filter::CompositeFilter(CompositeFilter {
            op: CompositeOperator::And,
            filters: filters
                .iter()
                .map(|filter| Self::predicate(&filter.field, &filter.value))
                .collect(),
        })))
    }
}

/// Builds a structured query over `collection_id` for `query`.
pub fn structured_query(collection_id: &str, query: &Query) -> FirestoreResult<StructuredQuery> {
    Ok(StructuredQuery {
        from: vec![CollectionSelector {
            collection_id: collection_id.to_string(),
        }],
        filter: FirestoreQueryTranslator::build(query)?,
    })
}
