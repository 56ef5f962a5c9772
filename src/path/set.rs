//! Path writes.

use serde_json::{Map, Value};

use crate::error::PathError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct WriteSegment {
    key: String,
    slot: Option<Slot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Index(usize),
    Append,
}

fn parse(path: &str) -> Result<Vec<WriteSegment>, PathError> {
    if path.is_empty() {
        return Err(PathError::EmptyPath);
    }
    let mut keys = vec![(String::new(), false)];
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        if c == '.' {
            keys.push((String::new(), false));
            continue;
        }
        let Some((current, forced)) = keys.last_mut() else {
            break;
        };
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ':' if current.is_empty() && !*forced => *forced = true,
            c => current.push(c),
        }
    }

    Ok(keys
        .into_iter()
        .map(|(key, forced)| {
            let slot = if forced {
                None
            } else if key == "-1" {
                Some(Slot::Append)
            } else if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
                key.parse().ok().map(Slot::Index)
            } else {
                None
            };
            WriteSegment { key, slot }
        })
        .collect())
}

/// Sets `value` at `path` inside `doc`, creating missing containers.
///
/// A numeric component indexes an array (padding with `null`), `-1` appends
/// and a `:` prefix forces an object key. Missing or `null` intermediates
/// become arrays when the next component is numeric and objects otherwise.
///
/// # Errors
///
/// Returns `PathError::EmptyPath` for an empty path, `PathError::NotAContainer`
/// when the path runs through a scalar and `PathError::InvalidIndex` when a
/// non-numeric component addresses an array.
pub fn set(doc: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    let segments = parse(path)?;
    let mut current = doc;
    for segment in &segments {
        current = step(current, segment, path)?;
    }
    *current = value;
    Ok(())
}

fn step<'a>(current: &'a mut Value, segment: &WriteSegment, path: &str) -> Result<&'a mut Value, PathError> {
    if current.is_null() {
        *current = if segment.slot.is_some() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }
    match current {
        Value::Object(map) => Ok(map.entry(segment.key.clone()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = match segment.slot {
                Some(Slot::Append) => {
                    items.push(Value::Null);
                    items.len() - 1
                }
                Some(Slot::Index(index)) => {
                    if index >= items.len() {
                        items.resize(index + 1, Value::Null);
                    }
                    index
                }
                None => {
                    return Err(PathError::InvalidIndex {
                        path: path.to_string(),
                        segment: segment.key.clone(),
                    })
                }
            };
            Ok(&mut items[index])
        }
        _ => Err(PathError::NotAContainer {
            path: path.to_string(),
            segment: segment.key.clone(),
        }),
    }
}
