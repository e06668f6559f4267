//! Dot-path access into JSON values

use serde_json::{Map, Value};

/// Follow a dot path (`a.b.0.c`); an empty path returns the value itself
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        current = match part.parse::<usize>() {
            Ok(idx) if current.is_array() => current.get(idx)?,
            _ => current.get(part)?,
        };
    }
    Some(current)
}

/// Write `value` at a dot path, creating intermediate objects.
///
/// Only the addressed leaf is replaced; siblings along the way are kept. An
/// intermediate that is not an object is replaced by an empty one.
pub fn set_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut parts = path.split('.').peekable();
    let mut current = root;

    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            current.insert(part.to_string(), value);
            return;
        }

        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(map) = entry else {
            return;
        };
        current = map;
    }
}

/// Whether anything non-null exists at a dot path
pub fn has_path(root: &Map<String, Value>, path: &str) -> bool {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, rest),
        None => (path, ""),
    };
    root.get(head)
        .and_then(|v| get_path(v, rest))
        .is_some_and(|v| !v.is_null())
}

/// Split `a.b.c` into (`a.b`, `c`); `None` for a single segment
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    path.rsplit_once('.')
}
