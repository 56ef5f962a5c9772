//! Array queries (`#(cond)` / `#(cond)#`) and key wildcards.

use std::cmp::Ordering;

use serde_json::Value;

use crate::value;

/// Comparison operator inside a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
}

impl Op {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
            Self::Like | Self::NotLike => false,
        }
    }
}

/// A parsed `#(...)` component.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Query {
    /// Path evaluated against each element; empty means the element itself.
    pub(crate) path: String,
    /// Operator and literal; `None` is an existence check.
    pub(crate) condition: Option<(Op, Value)>,
    /// `#(...)#` selects every match instead of the first.
    pub(crate) all: bool,
}

impl Query {
    /// Parses a raw component starting with `#(`.
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        let body = raw.strip_prefix("#(")?;
        let close = closing_paren(body)?;
        let inner = &body[..close];
        let all = match &body[close + 1..] {
            "" => false,
            "#" => true,
            _ => return None,
        };

        let Some((at, op, len)) = find_operator(inner) else {
            return Some(Self {
                path: inner.trim().to_string(),
                condition: None,
                all,
            });
        };
        let path = inner[..at].trim().to_string();
        let literal = parse_literal(inner[at + len..].trim());
        Some(Self {
            path,
            condition: Some((op, literal)),
            all,
        })
    }

    /// Whether an array element satisfies the condition.
    pub(crate) fn matches(&self, element: &Value) -> bool {
        let target = if self.path.is_empty() {
            Some(element.clone())
        } else {
            super::get(element, &self.path)
        };
        let Some(target) = target else {
            return false;
        };
        match &self.condition {
            None => true,
            Some((op, literal)) => compare(&target, *op, literal),
        }
    }
}

fn compare(target: &Value, op: Op, literal: &Value) -> bool {
    match (target, literal) {
        (Value::String(a), Value::String(b)) => match op {
            Op::Like => wildcard_match(b, a),
            Op::NotLike => !wildcard_match(b, a),
            _ => op.holds(a.as_str().cmp(b.as_str())),
        },
        (Value::Number(_), Value::Number(_)) => value::number(target)
            .partial_cmp(&value::number(literal))
            .is_some_and(|ordering| op.holds(ordering)),
        (Value::Bool(a), Value::Bool(b)) => match op {
            Op::Eq => a == b,
            Op::Ne => a != b,
            _ => false,
        },
        (Value::Null, Value::Null) => op == Op::Eq,
        _ => false,
    }
}

fn closing_paren(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

fn find_operator(inner: &str) -> Option<(usize, Op, usize)> {
    let bytes = inner.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'"' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => depth = depth.saturating_sub(1),
            b'=' | b'!' | b'<' | b'>' | b'%' if !in_string && depth == 0 => {
                let next = bytes.get(i + 1).copied();
                let found = match (b, next) {
                    (b'=', Some(b'=')) => (Op::Eq, 2),
                    (b'=', _) => (Op::Eq, 1),
                    (b'!', Some(b'=')) => (Op::Ne, 2),
                    (b'!', Some(b'%')) => (Op::NotLike, 2),
                    (b'<', Some(b'=')) => (Op::Le, 2),
                    (b'<', _) => (Op::Lt, 1),
                    (b'>', Some(b'=')) => (Op::Ge, 2),
                    (b'>', _) => (Op::Gt, 1),
                    (b'%', _) => (Op::Like, 1),
                    _ => continue,
                };
                return Some((i, found.0, found.1));
            }
            _ => {}
        }
    }
    None
}

fn parse_literal(s: &str) -> Value {
    if s.starts_with('"') {
        return serde_json::from_str::<String>(s)
            .map_or_else(|_| Value::String(s.trim_matches('"').to_string()), Value::String);
    }
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

/// Matches `text` against a pattern where `*` is any run of characters,
/// `?` is one character and `\` escapes the next character.
pub(crate) fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '\\' => Token::Char(chars.next().unwrap_or('\\')),
            '*' => Token::Star,
            '?' => Token::Any,
            c => Token::Char(c),
        });
    }
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(Token::Star) => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(Token::Any) => {
                p += 1;
                t += 1;
            }
            Some(Token::Char(c)) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, from)) => {
                    p = star + 1;
                    t = from + 1;
                    backtrack = Some((star, from + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|token| *token == Token::Star)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Char(char),
    Star,
    Any,
}

/// Whether a raw key component contains an unescaped wildcard.
pub(crate) fn has_wildcard(raw: &str) -> bool {
    let mut escaped = false;
    for c in raw.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '*' | '?' => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_first_match() {
        let q = Query::parse(r#"#(k2=="v2")"#).unwrap();
        assert_eq!(q.path, "k2");
        assert_eq!(q.condition, Some((Op::Eq, json!("v2"))));
        assert!(!q.all);
    }

    #[test]
    fn test_parse_all_matches() {
        let q = Query::parse("#(age>=40)#").unwrap();
        assert_eq!(q.condition, Some((Op::Ge, json!(40))));
        assert!(q.all);
    }

    #[test]
    fn test_parse_existence() {
        let q = Query::parse("#(nets)").unwrap();
        assert_eq!(q.path, "nets");
        assert!(q.condition.is_none());
    }

    #[test]
    fn test_parse_rejects_trailing_text() {
        assert!(Query::parse("#(a==1)x").is_none());
        assert!(Query::parse("#(a==1").is_none());
    }

    #[test]
    fn test_matches_numbers_and_strings() {
        let q = Query::parse("#(age>45)").unwrap();
        assert!(q.matches(&json!({"age": 47})));
        assert!(!q.matches(&json!({"age": 44})));
        assert!(!q.matches(&json!({"age": "47"})));

        let q = Query::parse(r#"#(last!="Murphy")"#).unwrap();
        assert!(q.matches(&json!({"last": "Craig"})));
        assert!(!q.matches(&json!({"last": "Murphy"})));
    }

    #[test]
    fn test_matches_like() {
        let q = Query::parse(r#"#(first%"D*")"#).unwrap();
        assert!(q.matches(&json!({"first": "Dale"})));
        assert!(!q.matches(&json!({"first": "Roger"})));

        let q = Query::parse(r#"#(first!%"D*")"#).unwrap();
        assert!(q.matches(&json!({"first": "Roger"})));
    }

    #[test]
    fn test_matches_element_itself() {
        let q = Query::parse(r#"#(=="fb")"#).unwrap();
        assert!(q.matches(&json!("fb")));
        assert!(!q.matches(&json!("tw")));
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("fav*", "fav.movie"));
        assert!(wildcard_match("c?t", "cat"));
        assert!(!wildcard_match("c?t", "cart"));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match(r"a\*", "a*"));
        assert!(!wildcard_match(r"a\*", "ab"));
        assert!(wildcard_match("*b*d", "abcbd"));
    }

    #[test]
    fn test_has_wildcard() {
        assert!(has_wildcard("na*e"));
        assert!(!has_wildcard(r"na\*e"));
        assert!(!has_wildcard("name"));
    }
}
