//! JSON payloads: locate the record list and flatten each entry.

use super::{Extracted, FieldRecord};
use crate::error::ExtractError;
use crate::progress::RunObserver;
use serde_json::Value;

/// Parse `body` and flatten the records found at `records_path`.
///
/// A root-level array is accepted whatever the path says; upstream endpoints
/// flip between `[...]` and `{"data": [...]}` without notice.
pub fn extract(
    body: &str,
    records_path: Option<&str>,
    observer: &RunObserver,
) -> Result<Extracted, ExtractError> {
    let root: Value =
        serde_json::from_str(body).map_err(|e| ExtractError::MalformedJson(e.to_string()))?;

    let entries = locate(&root, records_path)?;
    let mut out = Extracted::default();
    for (index, entry) in entries.iter().enumerate() {
        match entry {
            Value::Object(_) => out.records.push(flatten(entry)),
            other => {
                out.skipped += 1;
                observer.row_skipped(index, &format!("entry is {}, not an object", kind(other)));
            }
        }
    }
    Ok(out)
}

fn locate<'a>(root: &'a Value, records_path: Option<&str>) -> Result<&'a Vec<Value>, ExtractError> {
    if let Value::Array(items) = root {
        return Ok(items);
    }

    let path = records_path.unwrap_or("$");
    let target = match records_path {
        Some(path) => path.split('.').try_fold(root, |node, key| node.get(key)),
        None => None,
    };
    match target {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ExtractError::UnexpectedShape {
            path: path.to_string(),
            found: kind(other).to_string(),
        }),
        None => Err(ExtractError::UnexpectedShape {
            path: path.to_string(),
            found: if records_path.is_some() {
                "nothing".to_string()
            } else {
                kind(root).to_string()
            },
        }),
    }
}

/// Flatten nested arrays and objects into dotted keys; `null`s are dropped.
pub fn flatten(value: &Value) -> FieldRecord {
    let mut record = FieldRecord::new();
    flatten_into(&mut record, None, value);
    record
}

fn flatten_into(record: &mut FieldRecord, prefix: Option<&str>, value: &Value) {
    let join = |key: &str| match prefix {
        Some(p) => format!("{p}.{key}"),
        None => key.to_string(),
    };
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(record, Some(&join(key)), child);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(record, Some(&join(&i.to_string())), child);
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                record.insert(key, s.clone());
            }
        }
        Value::Bool(_) | Value::Number(_) => {
            if let Some(key) = prefix {
                record.insert(key, value.to_string());
            }
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
