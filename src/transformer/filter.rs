//! Record filtering
//!
//! A filter set is a list of predicates. Each predicate maps field names to
//! the exact JSON value a record must carry. A record is selected when it
//! satisfies at least one predicate (OR), and it satisfies a predicate when
//! every field of that predicate is present with an equal value (AND).
//!
//! # Example
//!
//! ```ignore
//! use rabbitmq_zabbix::transformer::FilterSet;
//!
//! let filters = FilterSet::parse(r#"[{"vhost": "/"}, {"durable": true}]"#)?;
//! let selected = filters.select(&queues);
//! ```

use serde_json::{Map, Value};

use crate::api::Record;
use crate::error::FilterError;

/// Anything that exposes its raw API fields for matching
pub trait Fields {
    fn fields(&self) -> &Map<String, Value>;
}

impl<T> Fields for Record<T> {
    fn fields(&self) -> &Map<String, Value> {
        Record::fields(self)
    }
}

impl Fields for Map<String, Value> {
    fn fields(&self) -> &Map<String, Value> {
        self
    }
}

/// A single exact-match predicate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    required: Map<String, Value>,
}

impl Predicate {
    /// Create a predicate from required field values
    pub fn new(required: Map<String, Value>) -> Self {
        Self { required }
    }

    /// Number of required fields
    pub fn len(&self) -> usize {
        self.required.len()
    }

    /// Whether the predicate has no required fields
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    /// Check a record against this predicate
    ///
    /// Counts the required fields the record carries with an equal value and
    /// compares the count to the predicate size. An empty predicate matches
    /// every record through the same comparison (0 == 0).
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        let shared = self
            .required
            .iter()
            .filter(|(key, expected)| record.get(key.as_str()) == Some(*expected))
            .count();

        shared == self.required.len()
    }
}

/// Ordered list of predicates combined with OR
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl Default for FilterSet {
    /// A single empty predicate, which selects every record
    fn default() -> Self {
        Self {
            predicates: vec![Predicate::default()],
        }
    }
}

impl FilterSet {
    /// Build a filter set; an empty list becomes the match-all default
    pub fn new(predicates: Vec<Predicate>) -> Self {
        if predicates.is_empty() {
            return Self::default();
        }
        Self { predicates }
    }

    /// Parse the `--filters` argument
    ///
    /// Accepts a single JSON object or an array of objects.
    ///
    /// # Errors
    /// Returns `FilterError` for invalid JSON or non-object elements
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Parse an optional `--filters` argument, defaulting to match-all
    pub fn parse_optional(input: Option<&str>) -> Result<Self, FilterError> {
        match input.map(str::trim) {
            Some(s) if !s.is_empty() => Self::parse(s),
            _ => Ok(Self::default()),
        }
    }

    /// Normalize a decoded JSON value into a filter set
    pub fn from_value(value: Value) -> Result<Self, FilterError> {
        let items = match value {
            Value::Array(items) => items,
            other => vec![other],
        };

        let predicates = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(Predicate::new(map)),
                other => Err(FilterError::NotAnObject {
                    index,
                    found: json_kind(&other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(predicates))
    }

    /// Predicates in evaluation order
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Check whether a record satisfies any predicate
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        self.predicates.iter().any(|p| p.matches(record))
    }

    /// Keep the records that satisfy any predicate, preserving order
    pub fn select<'a, R: Fields>(&self, records: &'a [R]) -> Vec<&'a R> {
        records
            .iter()
            .filter(|record| {
                let selected = self.matches(record.fields());
                tracing::debug!(
                    name = ?record.fields().get("name"),
                    selected,
                    "Checked record against filters"
                );
                selected
            })
            .collect()
    }
}

/// Free-function form of [`FilterSet::matches`]
pub fn matches(record: &Map<String, Value>, filters: &FilterSet) -> bool {
    filters.matches(record)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
