//! `${path}` interpolation
//!
//! Configuration strings such as device addresses may reference other
//! configuration values with `${app.env.HOST}`. Markers are resolved when the
//! string is consumed, against the canonical tree of the effective document.
//! A resolved value that itself contains markers is evaluated in turn.

use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::Value;
use tracing::warn;

use crate::core::node;
use crate::error::ExpressionError;

fn marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("marker pattern is valid"))
}

/// Replace every `${path}` in `raw` with the value found at `path`
///
/// A circular chain of references evaluates to the empty string and is
/// reported with a warning. A path that does not resolve is an error.
pub fn evaluate(raw: &str, context: &Value) -> Result<String, ExpressionError> {
    let mut visiting = Vec::new();
    evaluate_in(raw, context, &mut visiting)
}

fn evaluate_in(raw: &str, context: &Value, visiting: &mut Vec<String>) -> Result<String, ExpressionError> {
    let mut last_end = 0;
    let mut output = String::new();

    for cap in marker().captures_iter(raw) {
        let Some(whole) = cap.get(0) else { continue };
        let path = cap[1].trim();
        output.push_str(&raw[last_end..whole.start()]);
        last_end = whole.end();

        if visiting.iter().any(|seen| seen == path) {
            warn!(
                "Circular expression reference: {} -> {}",
                visiting.join(" -> "),
                path
            );
            continue;
        }

        let value = node::read(context, path).map_err(|source| ExpressionError::Unresolved {
            expression: path.to_string(),
            source,
        })?;
        let text = to_text(&value);
        if marker().is_match(&text) {
            visiting.push(path.to_string());
            let nested = evaluate_in(&text, context, visiting);
            visiting.pop();
            output.push_str(&nested?);
        } else {
            output.push_str(&text);
        }
    }

    output.push_str(&raw[last_end..]);
    Ok(output)
}

fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    fn ctx(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(evaluate("ssh://root@10.0.0.1", &Value::Null).unwrap(), "ssh://root@10.0.0.1");
    }

    #[test]
    fn test_single_marker() {
        let context = ctx("{app: {env: {HOST: 10.0.0.7}}}");
        assert_eq!(
            evaluate("ssh://root@${app.env.HOST}:22", &context).unwrap(),
            "ssh://root@10.0.0.7:22"
        );
    }

    #[test]
    fn test_multiple_markers_and_scalars() {
        let context = ctx("{app: {name: demo}, port: 8080, secure: true}");
        assert_eq!(
            evaluate("${app.name}:${port}/${ secure }", &context).unwrap(),
            "demo:8080/true"
        );
    }

    #[test]
    fn test_indirection_chain() {
        let context = ctx("{app: {env: {HOST: '${app.env.IP}', IP: 192.168.1.2}}}");
        assert_eq!(evaluate("${app.env.HOST}", &context).unwrap(), "192.168.1.2");
    }

    #[test]
    fn test_circular_reference_is_empty() {
        let context = ctx("{a: 'x${b}', b: 'y${a}'}");
        assert_eq!(evaluate("[${a}]", &context).unwrap(), "[xy]");
    }

    #[test]
    fn test_self_reference_is_empty() {
        let context = ctx("{a: '${a}'}");
        assert_eq!(evaluate("${a}", &context).unwrap(), "");
    }

    #[test]
    fn test_unresolved_path_is_error() {
        let context = ctx("{app: {name: demo}}");
        match evaluate("${app.nope}", &context) {
            Err(ExpressionError::Unresolved { expression, source }) => {
                assert_eq!(expression, "app.nope");
                assert!(matches!(source, FieldError::InvalidField { .. }));
            }
            other => panic!("Expected Unresolved, got {other:?}"),
        }
    }

    #[test]
    fn test_same_marker_twice_is_not_a_cycle() {
        let context = ctx("{h: '${ip}', ip: 1.2.3.4}");
        assert_eq!(evaluate("${h} ${h}", &context).unwrap(), "1.2.3.4 1.2.3.4");
    }
}
