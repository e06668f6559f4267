//! Parameter Builder
//!
//! Turns raw input for one record into a [`RequestParameters`] bag: generic
//! pagination/sort fields first, then only the fields the active
//! (resource, operation) schema entry declares.

use super::composite;
use super::registry::{schema, FieldDescriptor, FieldEncoding, FieldKind, FieldLocation};
use super::types::{Operation, ResourceType, SortOption};
use crate::error::DispatchError;
use crate::input::InputSource;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Page size used when the input does not set `limit`
pub const DEFAULT_LIMIT: u32 = 25;

/// Largest page the remote API serves
pub const MAX_PAGE_SIZE: u32 = 250;

/// Timestamp layout the remote API expects
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Parameter bag for one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParameters {
    pub resource: ResourceType,
    pub operation: Operation,
    pub return_all: bool,
    pub limit: u32,
    pub page: u32,
    pub sort: SortOption,
    pub cursor: String,
    pub offset: u32,
    pub additional_fields: Map<String, Value>,
    /// Resource/operation-specific fields, keyed by schema name
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
    /// Names in `fields` that hold a schema default rather than user input
    #[serde(skip)]
    pub defaulted: BTreeSet<String>,
}

impl RequestParameters {
    /// Parameters with every generic field at its default
    pub fn new(resource: ResourceType, operation: Operation) -> Self {
        Self {
            resource,
            operation,
            return_all: false,
            limit: DEFAULT_LIMIT,
            page: 0,
            sort: SortOption::default(),
            cursor: String::new(),
            offset: 0,
            additional_fields: Map::new(),
            fields: BTreeMap::new(),
            defaulted: BTreeSet::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.defaulted.remove(name);
        self.fields.insert(name.to_string(), value);
    }

    /// Whether `name` was filled from its schema default
    pub fn is_defaulted(&self, name: &str) -> bool {
        self.defaulted.contains(name)
    }

    /// Value at a dot path inside `additionalFields`
    pub fn additional(&self, path: &str) -> Option<&Value> {
        let (head, rest) = path.split_once('.').unwrap_or((path, ""));
        self.additional_fields
            .get(head)
            .and_then(|v| super::json_path::get_path(v, rest))
    }
}

/// Build the parameters for record `index` of `input`
pub fn build(
    resource: ResourceType,
    operation: Operation,
    input: &dyn InputSource,
    index: usize,
) -> Result<RequestParameters, DispatchError> {
    let mut params = RequestParameters::new(resource, operation);

    params.return_all = match input.get("returnAll", index) {
        Some(value) if !is_empty_value(&value) => {
            encode_boolean("returnAll", value)?.as_bool().unwrap_or(false)
        },
        _ => false,
    };

    let limit = read_integer(input, "limit", index, i64::from(DEFAULT_LIMIT))?;
    params.limit = limit.clamp(1, i64::from(MAX_PAGE_SIZE)) as u32;
    params.page = clamp_non_negative(read_integer(input, "page", index, 0)?);
    params.offset = clamp_non_negative(read_integer(input, "offset", index, 0)?);

    params.sort = match input.get("sort", index) {
        Some(Value::String(tag)) if !tag.is_empty() => tag.parse()?,
        Some(Value::String(_)) | Some(Value::Null) | None => SortOption::default(),
        Some(other) => {
            return Err(DispatchError::invalid_field(
                "sort",
                format!("expected a sort tag, got {}", other),
            ))
        },
    };

    params.cursor = match input.get_or("cursor", index, Value::String(String::new())) {
        Value::String(s) => s,
        other => other.to_string(),
    };

    params.additional_fields = match input.get("additionalFields", index) {
        Some(Value::Object(map)) => map,
        Some(Value::String(s)) if !s.trim().is_empty() => match serde_json::from_str(&s) {
            Ok(Value::Object(map)) => map,
            _ => {
                return Err(DispatchError::invalid_field(
                    "additionalFields",
                    "expected a JSON object",
                ))
            },
        },
        Some(Value::String(_)) | Some(Value::Null) | None => Map::new(),
        Some(_) => {
            return Err(DispatchError::invalid_field(
                "additionalFields",
                "expected a JSON object",
            ))
        },
    };

    for field in schema(resource, operation) {
        if field.location == FieldLocation::Composite {
            continue;
        }
        if let Some(value) = read_field(input, field, index)? {
            params.set(&field.name, value);
            if !is_provided(input, field, index) {
                params.defaulted.insert(field.name.clone());
            }
        }
    }

    composite::assemble(resource, operation, input, index, &mut params.additional_fields)?;

    tracing::debug!(
        "built parameters for {} {}: {} specific fields",
        resource,
        operation,
        params.fields.len()
    );

    Ok(params)
}

/// Read and encode one schema field. Null and empty strings count as absent
/// and fall back to the field's default; `None` means omit the field.
pub(crate) fn read_field(
    input: &dyn InputSource,
    field: &FieldDescriptor,
    index: usize,
) -> Result<Option<Value>, DispatchError> {
    match input.get(&field.name, index) {
        Some(value) if !is_empty_value(&value) => encode_value(field, value).map(Some),
        _ => match &field.default {
            Some(default) => encode_value(field, default.clone()).map(Some),
            None => Ok(None),
        },
    }
}

/// Whether the input carries a usable value for `field`
pub(crate) fn is_provided(input: &dyn InputSource, field: &FieldDescriptor, index: usize) -> bool {
    input
        .get(&field.name, index)
        .is_some_and(|v| !is_empty_value(&v))
}

/// Empty-string, null: both count as "not provided"
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Convert a raw input value according to the field's kind and encoding
pub(crate) fn encode_value(field: &FieldDescriptor, raw: Value) -> Result<Value, DispatchError> {
    match field.kind {
        FieldKind::List => match raw {
            Value::Array(_) => Ok(raw),
            Value::String(s) => match serde_json::from_str(&s) {
                Ok(list @ Value::Array(_)) => Ok(list),
                _ => Err(DispatchError::invalid_field(&field.name, "expected a JSON list")),
            },
            _ => Err(DispatchError::invalid_field(&field.name, "expected a list")),
        },
        FieldKind::NestedObject => match raw {
            Value::Object(_) => Ok(raw),
            Value::String(s) => match serde_json::from_str(&s) {
                Ok(obj @ Value::Object(_)) => Ok(obj),
                _ => Err(DispatchError::invalid_field(&field.name, "expected a JSON object")),
            },
            _ => Err(DispatchError::invalid_field(&field.name, "expected an object")),
        },
        FieldKind::Scalar => match field.encoding {
            FieldEncoding::Plain => Ok(raw),
            FieldEncoding::Integer => encode_integer(&field.name, raw),
            FieldEncoding::Number => encode_number(&field.name, raw),
            FieldEncoding::Boolean => encode_boolean(&field.name, raw),
            FieldEncoding::Date => encode_date(&field.name, raw),
            FieldEncoding::KeyedObject => match raw {
                Value::String(key) => {
                    let mut map = Map::new();
                    map.insert(key, Value::Object(Map::new()));
                    Ok(Value::Object(map))
                },
                Value::Object(_) => Ok(raw),
                _ => Err(DispatchError::invalid_field(&field.name, "expected a role name")),
            },
        },
    }
}

fn read_integer(
    input: &dyn InputSource,
    name: &str,
    index: usize,
    default: i64,
) -> Result<i64, DispatchError> {
    match input.get(name, index) {
        Some(value) if !is_empty_value(&value) => encode_integer(name, value)?
            .as_i64()
            .ok_or_else(|| DispatchError::invalid_field(name, "out of range")),
        _ => Ok(default),
    }
}

fn clamp_non_negative(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

fn encode_integer(name: &str, raw: Value) -> Result<Value, DispatchError> {
    let parsed = match &raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .map(Value::from)
        .ok_or_else(|| DispatchError::invalid_field(name, format!("expected an integer, got {}", raw)))
}

fn encode_number(name: &str, raw: Value) -> Result<Value, DispatchError> {
    let parsed = match &raw {
        Value::Number(_) => return Ok(raw),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(Number::from_f64),
        _ => None,
    };
    parsed
        .map(Value::Number)
        .ok_or_else(|| DispatchError::invalid_field(name, format!("expected a number, got {}", raw)))
}

fn encode_boolean(name: &str, raw: Value) -> Result<Value, DispatchError> {
    match &raw {
        Value::Bool(_) => Ok(raw),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        _ => Err(DispatchError::invalid_field(
            name,
            format!("expected a boolean, got {}", raw),
        )),
    }
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` and plain dates.
/// Naive values are taken as UTC.
fn encode_date(name: &str, raw: Value) -> Result<Value, DispatchError> {
    let Value::String(s) = &raw else {
        return Err(DispatchError::invalid_field(name, "expected a date string"));
    };
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Value::String(dt.format(DATE_FORMAT).to_string()));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Value::String(naive.and_utc().format(DATE_FORMAT).to_string()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        return Ok(Value::String(midnight.and_utc().format(DATE_FORMAT).to_string()));
    }

    Err(DispatchError::invalid_field(
        name,
        format!("unrecognized date '{}'", s),
    ))
}
