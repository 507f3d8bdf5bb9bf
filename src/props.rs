//! Attribute/property coercion.
//!
//! Pure string <-> typed-value conversion, no state. Attribute parsing
//! follows the loose semantics the attribute domain has always had:
//!
//! - boolean: `"false"` is false, everything else present is true
//!   (including the empty string - a bare `bool` attribute means true);
//!   a missing attribute is `Undefined`, not false
//! - number: leading-prefix float parse, garbage yields NaN
//! - string: passthrough
//!
//! Reflection serializes back: `true` becomes a present empty attribute,
//! `false`/`Undefined`/`Null` remove the attribute, numbers print the
//! shortest round-trip form (`2`, `-12.2`).

use crate::types::{PropType, PropValue};

// =============================================================================
// Parsing (attribute -> property)
// =============================================================================

/// Convert a serialized attribute value to a typed property value.
///
/// `None` (attribute absent) is `Undefined` regardless of declared type.
pub fn parse_property_value(raw: Option<&str>, prop_type: PropType) -> PropValue {
    let Some(raw) = raw else {
        return PropValue::Undefined;
    };
    match prop_type {
        PropType::Boolean => PropValue::Bool(raw != "false"),
        PropType::Number => PropValue::Number(parse_float(raw)),
        PropType::String => PropValue::Str(raw.to_string()),
    }
}

/// Leading-prefix float parse: `"88"` -> 88, `"12px"` -> 12, `"x"` -> NaN.
///
/// Accepts an optional sign, decimal digits with an optional fraction,
/// an optional exponent, and the `Infinity` spellings.
fn parse_float(raw: &str) -> f64 {
    let s = raw.trim_start();

    for (literal, value) in [
        ("Infinity", f64::INFINITY),
        ("+Infinity", f64::INFINITY),
        ("-Infinity", f64::NEG_INFINITY),
    ] {
        if s.starts_with(literal) {
            return value;
        }
    }

    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    // No digits at all: not a number.
    if !s[digits_start..end].bytes().any(|b| b.is_ascii_digit()) {
        return f64::NAN;
    }
    // Optional exponent; only kept if it carries digits.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

// =============================================================================
// Serialization (property -> attribute)
// =============================================================================

/// Convert a property value to its reflected attribute form.
///
/// `None` means the attribute should be removed.
pub fn serialize_property_value(value: &PropValue) -> Option<String> {
    match value {
        PropValue::Undefined | PropValue::Null => None,
        PropValue::Bool(true) => Some(String::new()),
        PropValue::Bool(false) => None,
        PropValue::Number(n) => Some(format_number(*n)),
        PropValue::Str(s) => Some(s.clone()),
    }
}

/// Shortest round-trip decimal form: `2.0` -> `"2"`, `-12.2` -> `"-12.2"`.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boolean() {
        let parse = |raw| parse_property_value(raw, PropType::Boolean);
        assert_eq!(parse(Some("true")), PropValue::Bool(true));
        assert_eq!(parse(Some("false")), PropValue::Bool(false));
        // A present-but-empty attribute means true.
        assert_eq!(parse(Some("")), PropValue::Bool(true));
        assert_eq!(parse(Some("anything")), PropValue::Bool(true));
        // A missing attribute is undefined, not false.
        assert_eq!(parse(None), PropValue::Undefined);
    }

    #[test]
    fn test_parse_number() {
        let parse = |raw| parse_property_value(raw, PropType::Number);
        assert_eq!(parse(Some("0")), PropValue::Number(0.0));
        assert_eq!(parse(Some("88")), PropValue::Number(88.0));
        assert_eq!(parse(Some("-12.2")), PropValue::Number(-12.2));
        assert_eq!(parse(Some("1e3")), PropValue::Number(1000.0));
        assert_eq!(parse(Some("12px")), PropValue::Number(12.0));
        assert_eq!(parse(Some(" 4")), PropValue::Number(4.0));
        assert_eq!(parse(Some("Infinity")), PropValue::Number(f64::INFINITY));
        assert!(matches!(parse(Some("abc")), PropValue::Number(n) if n.is_nan()));
        assert!(matches!(parse(Some("")), PropValue::Number(n) if n.is_nan()));
        assert!(matches!(parse(Some("e5")), PropValue::Number(n) if n.is_nan()));
        assert_eq!(parse(None), PropValue::Undefined);
    }

    #[test]
    fn test_parse_string() {
        let parse = |raw| parse_property_value(raw, PropType::String);
        assert_eq!(parse(Some("string")), PropValue::Str("string".into()));
        assert_eq!(parse(Some("")), PropValue::Str(String::new()));
        assert_eq!(parse(None), PropValue::Undefined);
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serialize_property_value(&PropValue::Str("single".into())), Some("single".into()));
        assert_eq!(serialize_property_value(&PropValue::Number(2.0)), Some("2".into()));
        assert_eq!(serialize_property_value(&PropValue::Number(-12.2)), Some("-12.2".into()));
        assert_eq!(serialize_property_value(&PropValue::Number(123.0)), Some("123".into()));
        // Present empty attribute for true, removal for false and nullish.
        assert_eq!(serialize_property_value(&PropValue::Bool(true)), Some(String::new()));
        assert_eq!(serialize_property_value(&PropValue::Bool(false)), None);
        assert_eq!(serialize_property_value(&PropValue::Undefined), None);
        assert_eq!(serialize_property_value(&PropValue::Null), None);
    }

    #[test]
    fn test_parse_trailing_exponent_junk() {
        // "1e" keeps the mantissa, drops the dangling exponent marker.
        assert_eq!(parse_property_value(Some("1e"), PropType::Number), PropValue::Number(1.0));
        assert_eq!(parse_property_value(Some("1e+"), PropType::Number), PropValue::Number(1.0));
    }
}
