//! Query evaluation for in-memory record filtering.
//!
//! This module evaluates equality queries against records held in memory, using the
//! same numeric equality rules a remote document store applies.

use docdriver_core::{
    error::DriverError,
    query::{FieldFilter, Query, QueryVisitor},
    record::Record,
    value::Value,
};

pub(crate) struct RecordEvaluator<'a> {
    record: &'a Record,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(record: &'a Record) -> Self {
        Self { record }
    }

    pub fn evaluate(&mut self, query: &Query) -> bool {
        self.visit_query(query).unwrap_or(false)
    }

    pub fn filter_records(
        records: impl IntoIterator<Item = &'a Record>,
        query: &Query,
    ) -> Vec<Record> {
        records
            .into_iter()
            .filter(|record| RecordEvaluator::new(record).evaluate(query))
            .cloned()
            .collect()
    }
}

impl<'a> QueryVisitor for RecordEvaluator<'a> {
    type Output = bool;
    type Error = DriverError;

    fn visit_match_all(&mut self) -> Result<Self::Output, Self::Error> {
        Ok(true)
    }

    fn visit_eq(&mut self, field: &str, value: &Value) -> Result<Self::Output, Self::Error> {
        // A missing field never equals anything, not even null
        Ok(self
            .record
            .get(field)
            .is_some_and(|stored| stored.matches(value)))
    }

    fn visit_and(&mut self, filters: &[FieldFilter]) -> Result<Self::Output, Self::Error> {
        for filter in filters {
            if !self.visit_eq(&filter.field, &filter.value)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdriver_core::fields;

    fn record() -> Record {
        Record::from(fields! { "name" => "a", "age" => 30, "score" => 1.5, "gone" => Value::Null })
    }

    #[test]
    fn test_empty_query_matches() {
        assert!(RecordEvaluator::new(&record()).evaluate(&Query::all()));
    }

    #[test]
    fn test_all_predicates_must_hold() {
        let record = record();

        assert!(RecordEvaluator::new(&record).evaluate(&Query::new().eq("name", "a").eq("age", 30)));
        assert!(!RecordEvaluator::new(&record).evaluate(&Query::new().eq("name", "a").eq("age", 31)));
    }

    #[test]
    fn test_numeric_types_compare_by_value() {
        let record = record();

        assert!(RecordEvaluator::new(&record).evaluate(&Query::new().eq("age", 30.0)));
        assert!(!RecordEvaluator::new(&record).evaluate(&Query::new().eq("age", "30")));
    }

    #[test]
    fn test_null_matches_only_stored_null() {
        let record = record();

        assert!(RecordEvaluator::new(&record).evaluate(&Query::new().eq("gone", Value::Null)));
        assert!(!RecordEvaluator::new(&record).evaluate(&Query::new().eq("missing", Value::Null)));
    }

    #[test]
    fn test_filter_records() {
        let records = vec![
            Record::from(fields! { "kind" => "x" }),
            Record::from(fields! { "kind" => "y" }),
            Record::from(fields! { "kind" => "x" }),
        ];

        let matched = RecordEvaluator::filter_records(&records, &Query::new().eq("kind", "x"));
        assert_eq!(matched.len(), 2);
    }
}
