//! Raw input access
//!
//! The builder pulls user-supplied values field by field through
//! [`InputSource`]; nothing is pushed into the engine.

use serde_json::{Map, Value};

/// Pull-based accessor over a batch of input records
pub trait InputSource {
    /// Number of records in the batch
    fn len(&self) -> usize;

    /// Raw value of `field` for record `index`, `None` when absent
    fn get(&self, field: &str, index: usize) -> Option<Value>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw value or `default` when absent or null
    fn get_or(&self, field: &str, index: usize, default: Value) -> Value {
        match self.get(field, index) {
            Some(Value::Null) | None => default,
            Some(value) => value,
        }
    }
}

/// Input records held as JSON objects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonInput {
    records: Vec<Map<String, Value>>,
}

impl JsonInput {
    pub fn new(records: Vec<Map<String, Value>>) -> Self {
        Self { records }
    }

    /// Single-record input
    pub fn single(record: Map<String, Value>) -> Self {
        Self {
            records: vec![record],
        }
    }

    /// Accepts either one object or an array of objects
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::single(map)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Self::new),
            _ => None,
        }
    }
}

impl InputSource for JsonInput {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn get(&self, field: &str, index: usize) -> Option<Value> {
        self.records.get(index)?.get(field).cloned()
    }
}
