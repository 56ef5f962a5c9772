//! Text templates for data filters and parameter sources.
//!
//! Templates are Handlebars with HTML escaping disabled. The value being
//! templated is bound as `Input`:
//!
//! ```text
//! {{Input.name.first}}
//! {{upper (b64dec Input)}}
//! {{default "anonymous" Input.user}}
//! ```
//!
//! A small string and encoding helper library is registered on every
//! registry. Each render builds its own registry so no template state is
//! shared between calls.

use handlebars::Handlebars;
use serde_json::{json, Value};

use crate::error::TemplateError;

/// Renders `template` with `input` bound as `Input`.
///
/// # Errors
///
/// Returns `TemplateError::Render` when the template does not parse or a
/// helper fails, and `TemplateError::Empty` when the output is empty.
pub fn render(template: &str, input: &Value) -> Result<String, TemplateError> {
    let registry = registry();
    let out = registry
        .render_template(template, &json!({ "Input": input }))
        .map_err(|e| TemplateError::Render {
            template: template.to_string(),
            message: e.to_string(),
        })?;
    if out.is_empty() {
        return Err(TemplateError::Empty {
            template: template.to_string(),
        });
    }
    Ok(out)
}

fn registry() -> Handlebars<'static> {
    let mut hb = Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);

    hb.register_helper("upper", Box::new(helpers::upper));
    hb.register_helper("lower", Box::new(helpers::lower));
    hb.register_helper("title", Box::new(helpers::title));
    hb.register_helper("trim", Box::new(helpers::trim));
    hb.register_helper("trimPrefix", Box::new(helpers::trim_prefix));
    hb.register_helper("trimSuffix", Box::new(helpers::trim_suffix));
    hb.register_helper("replace", Box::new(helpers::replace));
    hb.register_helper("contains", Box::new(helpers::contains));
    hb.register_helper("hasPrefix", Box::new(helpers::has_prefix));
    hb.register_helper("hasSuffix", Box::new(helpers::has_suffix));
    hb.register_helper("b64enc", Box::new(helpers::b64enc));
    hb.register_helper("b64dec", Box::new(helpers::b64dec));
    hb.register_helper("toJson", Box::new(helpers::to_json));
    hb.register_helper("quote", Box::new(helpers::quote));
    hb.register_helper("default", Box::new(helpers::default));
    hb.register_helper("join", Box::new(helpers::join));
    hb.register_helper("repeat", Box::new(helpers::repeat));
    hb.register_helper("substr", Box::new(helpers::substr));
    hb.register_helper("trunc", Box::new(helpers::trunc));
    hb
}

mod helpers {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use handlebars::handlebars_helper;
    use serde_json::Value;

    use crate::value::text;

    handlebars_helper!(upper: |v: Json| text(v).to_uppercase());
    handlebars_helper!(lower: |v: Json| text(v).to_lowercase());
    handlebars_helper!(title: |v: Json| title_case(&text(v)));
    handlebars_helper!(trim: |v: Json| text(v).trim().to_string());
    handlebars_helper!(trim_prefix: |prefix: str, v: Json| {
        let s = text(v);
        s.strip_prefix(prefix).map_or_else(|| s.clone(), str::to_string)
    });
    handlebars_helper!(trim_suffix: |suffix: str, v: Json| {
        let s = text(v);
        s.strip_suffix(suffix).map_or_else(|| s.clone(), str::to_string)
    });
    handlebars_helper!(replace: |old: str, new: str, v: Json| text(v).replace(old, new));
    handlebars_helper!(contains: |needle: str, v: Json| text(v).contains(needle));
    handlebars_helper!(has_prefix: |prefix: str, v: Json| text(v).starts_with(prefix));
    handlebars_helper!(has_suffix: |suffix: str, v: Json| text(v).ends_with(suffix));
    handlebars_helper!(b64enc: |v: Json| STANDARD.encode(text(v)));
    // Undecodable input renders the decoder error, like sprig.
    handlebars_helper!(b64dec: |v: Json| match STANDARD.decode(text(v)) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => e.to_string(),
    });
    handlebars_helper!(to_json: |v: Json| v.to_string());
    handlebars_helper!(quote: |v: Json| Value::String(text(v)).to_string());
    handlebars_helper!(default: |fallback: Json, v: Json| if is_empty(v) { fallback.clone() } else { v.clone() });
    handlebars_helper!(join: |sep: str, v: Json| match v {
        Value::Array(items) => items.iter().map(text).collect::<Vec<_>>().join(sep),
        other => text(other),
    });
    /// Output cap for `repeat`, in bytes.
    const MAX_REPEAT_BYTES: usize = 64 * 1024;

    handlebars_helper!(repeat: |count: u64, v: Json| {
        let s = text(v);
        let limit = MAX_REPEAT_BYTES / s.len().max(1);
        s.repeat(usize::try_from(count).unwrap_or(usize::MAX).min(limit))
    });
    handlebars_helper!(substr: |start: u64, end: u64, v: Json| {
        let chars: Vec<char> = text(v).chars().collect();
        let end = usize::try_from(end).unwrap_or(usize::MAX).min(chars.len());
        let start = usize::try_from(start).unwrap_or(usize::MAX).min(end);
        chars[start..end].iter().collect::<String>()
    });
    handlebars_helper!(trunc: |len: u64, v: Json| {
        text(v).chars().take(usize::try_from(len).unwrap_or(usize::MAX)).collect::<String>()
    });

    fn is_empty(v: &Value) -> bool {
        match v {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64().map_or(true, |f| f.abs() < f64::EPSILON),
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
        }
    }

    fn title_case(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut at_word_start = true;
        for c in s.chars() {
            if at_word_start && c.is_alphabetic() {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = c.is_whitespace();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_input_path() {
        let input = json!({"name": {"first": "fake", "last": "user"}});
        assert_eq!(render("{{Input.name.first}}", &input).unwrap(), "fake");
    }

    #[test]
    fn test_render_no_escape() {
        let input = json!("<a & b>");
        assert_eq!(render("{{Input}}", &input).unwrap(), "<a & b>");
    }

    #[test]
    fn test_render_empty_is_error() {
        let input = json!({"name": "x"});
        let err = render("{{Input.missing}}", &input).unwrap_err();
        assert!(matches!(err, TemplateError::Empty { .. }));
    }

    #[test]
    fn test_render_parse_error() {
        let err = render("{{#if Input}}", &json!(true)).unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
    }

    #[test]
    fn test_b64_helpers() {
        assert_eq!(
            render("{{upper (b64dec Input)}}", &json!("aGVsbG8gd29ybGQ=")).unwrap(),
            "HELLO WORLD"
        );
        assert_eq!(render("{{b64enc Input}}", &json!("hello")).unwrap(), "aGVsbG8=");
        let bad = render("{{b64dec Input}}", &json!("aGVsbG8gd29ybGQ")).unwrap();
        assert_ne!(bad, "hello world");
    }

    #[test]
    fn test_string_helpers() {
        let input = json!("  hello world  ");
        assert_eq!(render("{{trim Input}}", &input).unwrap(), "hello world");
        assert_eq!(render("{{title (trim Input)}}", &input).unwrap(), "Hello World");
        assert_eq!(
            render(r#"{{replace "world" "there" (trim Input)}}"#, &input).unwrap(),
            "hello there"
        );
        assert_eq!(render(r#"{{trimPrefix "refs/heads/" Input}}"#, &json!("refs/heads/main")).unwrap(), "main");
        assert_eq!(render(r#"{{trimSuffix ".git" Input}}"#, &json!("repo.git")).unwrap(), "repo");
        assert_eq!(render("{{substr 1 3 Input}}", &json!("abcdef")).unwrap(), "bc");
        assert_eq!(render("{{trunc 2 Input}}", &json!("abcdef")).unwrap(), "ab");
        assert_eq!(render("{{repeat 3 Input}}", &json!("ab")).unwrap(), "ababab");
    }

    #[test]
    fn test_repeat_output_is_capped() {
        let out = render("{{repeat 18446744073709551615 Input}}", &json!("ab")).unwrap();
        assert_eq!(out.len(), 64 * 1024);
        assert!(out.starts_with("abab"));

        let out = render("{{repeat 1000000 Input}}", &json!("xyz")).unwrap();
        assert!(out.len() <= 64 * 1024);
        assert_eq!(out.len() % 3, 0);
    }

    #[test]
    fn test_predicate_helpers() {
        assert_eq!(render(r#"{{contains "ell" Input}}"#, &json!("hello")).unwrap(), "true");
        assert_eq!(render(r#"{{hasPrefix "he" Input}}"#, &json!("hello")).unwrap(), "true");
        assert_eq!(render(r#"{{hasSuffix "he" Input}}"#, &json!("hello")).unwrap(), "false");
    }

    #[test]
    fn test_json_helpers() {
        let input = json!({"tags": ["a", "b"], "user": ""});
        assert_eq!(render("{{toJson Input.tags}}", &input).unwrap(), r#"["a","b"]"#);
        assert_eq!(render(r#"{{join "," Input.tags}}"#, &input).unwrap(), "a,b");
        assert_eq!(render(r#"{{default "anonymous" Input.user}}"#, &input).unwrap(), "anonymous");
        assert_eq!(render("{{quote Input.tags.[0]}}", &input).unwrap(), r#""a""#);
    }
}
