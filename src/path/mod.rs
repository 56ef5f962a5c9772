//! JSON path addressing.
//!
//! Reads use a dotted syntax with a few extensions:
//!
//! - `name.first` walks object keys, `children.1` indexes arrays
//! - `\.` escapes a literal dot, `*` and `?` match keys by wildcard
//! - `friends.#` is the array length, `friends.#.first` maps over elements
//! - `friends.#(last=="Murphy").first` selects the first matching element,
//!   `friends.#(age>45)#` every matching element
//! - `[a,b.c]` and `{a,"n":b.c}` build a new array or object from several paths
//!
//! Writes ([`set`]) accept dotted keys and array indices, `-1` to append and a
//! leading `:` to force an object key.

mod query;
mod set;

pub use set::set;

use serde_json::{Map, Value};

use query::Query;

/// Looks up `path` in `doc`. Returns `None` when nothing is addressed.
#[must_use]
pub fn get(doc: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return None;
    }
    if path.starts_with('[') || path.starts_with('{') {
        return get_multipath(doc, path);
    }
    let segments: Vec<Segment> = split_components(path)
        .into_iter()
        .map(Segment::from)
        .collect();
    walk(doc, &segments)
}

/// One dotted component as written.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Component {
    /// Text with escapes kept.
    raw: String,
    /// Text with escapes resolved.
    name: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Pattern(String),
    Count,
    Query(Query),
    Invalid,
}

impl From<Component> for Segment {
    fn from(c: Component) -> Self {
        if c.raw == "#" {
            Self::Count
        } else if c.raw.starts_with("#(") {
            Query::parse(&c.raw).map_or(Self::Invalid, Self::Query)
        } else if query::has_wildcard(&c.raw) {
            Self::Pattern(c.raw)
        } else {
            Self::Key(c.name)
        }
    }
}

fn split_components(path: &str) -> Vec<Component> {
    let mut components = Vec::new();
    let mut raw = String::new();
    let mut name = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                raw.push(c);
                if let Some(next) = chars.next() {
                    raw.push(next);
                    name.push(next);
                }
            }
            '"' if depth > 0 => {
                in_string = !in_string;
                raw.push(c);
                name.push(c);
            }
            '(' if !in_string && raw.starts_with('#') => {
                depth += 1;
                raw.push(c);
                name.push(c);
            }
            ')' if !in_string && depth > 0 => {
                depth -= 1;
                raw.push(c);
                name.push(c);
            }
            '.' if depth == 0 => {
                components.push(Component {
                    raw: std::mem::take(&mut raw),
                    name: std::mem::take(&mut name),
                });
            }
            _ => {
                raw.push(c);
                name.push(c);
            }
        }
    }
    components.push(Component { raw, name });
    components
}

fn walk(value: &Value, segments: &[Segment]) -> Option<Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(value.clone());
    };
    match segment {
        Segment::Key(name) => match value {
            Value::Object(map) => walk(map.get(name)?, rest),
            Value::Array(items) => walk(items.get(name.parse::<usize>().ok()?)?, rest),
            _ => None,
        },
        Segment::Pattern(pattern) => {
            let map = value.as_object()?;
            let (_, child) = map.iter().find(|(key, _)| query::wildcard_match(pattern, key))?;
            walk(child, rest)
        }
        Segment::Count => {
            let items = value.as_array()?;
            if rest.is_empty() {
                return Some(Value::from(items.len()));
            }
            Some(Value::Array(
                items.iter().filter_map(|item| walk(item, rest)).collect(),
            ))
        }
        Segment::Query(q) => {
            let items = value.as_array()?;
            if q.all {
                let matched = items.iter().filter(|item| q.matches(item));
                Some(Value::Array(
                    matched.filter_map(|item| walk(item, rest)).collect(),
                ))
            } else {
                walk(items.iter().find(|item| q.matches(item))?, rest)
            }
        }
        Segment::Invalid => None,
    }
}

fn get_multipath(doc: &Value, path: &str) -> Option<Value> {
    let close = matching_bracket(path)?;
    let as_object = path.starts_with('{');
    let inner = &path[1..close];

    let mut array = Vec::new();
    let mut object = Map::new();
    for entry in split_top_level(inner) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if as_object {
            let (key, sub_path) = object_entry(entry);
            if let Some(found) = get(doc, sub_path) {
                object.insert(key, found);
            }
        } else if let Some(found) = get(doc, entry) {
            array.push(found);
        }
    }

    let built = if as_object {
        Value::Object(object)
    } else {
        Value::Array(array)
    };
    match &path[close + 1..] {
        "" => Some(built),
        rest => get(&built, rest.strip_prefix('.').or_else(|| rest.strip_prefix('|'))?),
    }
}

/// Splits `"name":path` or derives the key from the last path component.
fn object_entry(entry: &str) -> (String, &str) {
    if entry.starts_with('"') {
        if let Some(end) = entry[1..].find('"').map(|i| i + 1) {
            let key = &entry[1..end];
            if let Some(sub_path) = entry[end + 1..].trim_start().strip_prefix(':') {
                return (key.to_string(), sub_path.trim());
            }
        }
    }
    let key = split_components(entry)
        .pop()
        .map(|c| c.name)
        .unwrap_or_default();
    (key, entry)
}

fn matching_bracket(path: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in path.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            '[' | '{' | '(' if !in_string => depth += 1,
            ']' | '}' | ')' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            '[' | '{' | '(' if !in_string => depth += 1,
            ']' | '}' | ')' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[start..]);
    parts
}
