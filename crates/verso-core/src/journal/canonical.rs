//! Canonical JSON: compact, with object keys sorted at every depth.
//!
//! Record hashes are computed over this form, so the same event always
//! produces the same bytes regardless of map iteration order.

use serde_json::Value;

/// Canonical string form of `value`.
///
/// ```
/// use serde_json::json;
/// use verso_core::journal::canonical::canonicalize_json;
///
/// let val = json!({"z": 1, "a": {"c": 3, "b": 2}});
/// assert_eq!(canonicalize_json(&val), r#"{"a":{"b":2,"c":3},"z":1}"#);
/// ```
#[must_use]
pub fn canonicalize_json(value: &Value) -> String {
    let mut buf = String::new();
    write_canonical(value, &mut buf);
    buf
}

fn write_canonical(value: &Value, buf: &mut String) {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            // Scalars have a single compact form; Display handles escaping.
            buf.push_str(&value.to_string());
        }
        Value::Array(items) => {
            buf.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                write_canonical(item, buf);
            }
            buf.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            buf.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                buf.push_str(&Value::String(key.clone()).to_string());
                buf.push(':');
                write_canonical(val, buf);
            }
            buf.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(canonicalize_json(&json!(null)), "null");
        assert_eq!(canonicalize_json(&json!(false)), "false");
        assert_eq!(canonicalize_json(&json!(-7)), "-7");
        assert_eq!(canonicalize_json(&json!(0.7)), "0.7");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(
            canonicalize_json(&json!("tab\there \"q\"\nnl")),
            r#""tab\there \"q\"\nnl""#
        );
    }

    #[test]
    fn nested_keys_sorted_arrays_kept() {
        let val = json!({"z": [3, 1, {"y": 1, "b": 2}], "a": {"c": 3, "b": 2}});
        assert_eq!(
            canonicalize_json(&val),
            r#"{"a":{"b":2,"c":3},"z":[3,1,{"b":2,"y":1}]}"#
        );
    }

    #[test]
    fn output_has_no_newlines() {
        let val = json!({"text": "line one\nline two"});
        assert!(!canonicalize_json(&val).contains('\n'));
    }
}
