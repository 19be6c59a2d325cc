//! Plain-scalar classification: mapping scalar text to typed values.
//!
//! Applied only to plain (unquoted) scalars, with the node's resolved
//! tag and the document's YAML version in hand. Quoted and block
//! scalars are always strings.

use crate::context::{TAG_FLOAT, TAG_INT, TAG_STR};
use crate::value::Value;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::str::FromStr;

/// The floating-special literals that stay strings but carry the float
/// tag so consumers can detect them.
const FLOAT_SPECIALS: &[&str] = &[
    ".nan", ".NaN", ".NAN", ".inf", ".Inf", ".INF", "+.inf", "+.Inf", "+.INF", "-.inf", "-.Inf",
    "-.INF",
];

/// Classify a plain scalar.
///
/// Returns the value and, for the floating-special literals, the tag
/// the resolver should record for the node.
pub(crate) fn classify(
    text: &str,
    tag: Option<&str>,
    version: (u32, u32),
) -> (Value, Option<&'static str>) {
    if tag == Some(TAG_STR) {
        return (Value::String(text.to_string()), None);
    }

    if tag == Some(TAG_FLOAT) && is_integer_shape(text) {
        if let Ok(d) = BigDecimal::from_str(text) {
            return (Value::Decimal(d), None);
        }
    }

    if tag == Some(TAG_INT) && !is_integer_shape(text) && is_decimal_shape(text) {
        if let Some(d) = parse_decimal(text) {
            if d.is_integer() {
                let value = match d.to_i64() {
                    Some(n) => narrow(n),
                    None => Value::Decimal(d.with_scale(0)),
                };
                return (value, None);
            }
        }
    }

    // YAML 1.1 keeps the larger boolean vocabulary and bare octals.
    if version.1 < 2 {
        match text {
            "yes" | "Yes" | "YES" | "on" | "On" | "ON" => return (Value::Bool(true), None),
            "no" | "No" | "NO" | "off" | "Off" | "OFF" => return (Value::Bool(false), None),
            _ => {}
        }
        if text.len() > 1 && text.starts_with('0') && is_octal(&text[1..]) {
            return (radix_integer(&text[1..], 8), None);
        }
    }

    match text {
        "" | "null" | "Null" | "NULL" | "~" => return (Value::Null, None),
        "true" | "True" | "TRUE" => return (Value::Bool(true), None),
        "false" | "False" | "FALSE" => return (Value::Bool(false), None),
        _ => {}
    }

    if let Some(digits) = text.strip_prefix("0o") {
        if !digits.is_empty() && is_octal(digits) {
            return (radix_integer(digits, 8), None);
        }
    }

    if let Some(digits) = text.strip_prefix("0x") {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return (radix_integer(digits, 16), None);
        }
    }

    if is_integer_shape(text) {
        return (parse_integer(text), None);
    }

    if is_decimal_shape(text) {
        if let Some(d) = parse_decimal(text) {
            return (Value::Decimal(d), None);
        }
    }

    if tag.is_none() && FLOAT_SPECIALS.contains(&text) {
        return (Value::String(text.to_string()), Some(TAG_FLOAT));
    }

    (Value::String(text.to_string()), None)
}

/// Coerce a mapping key to its string form.
///
/// String keys pass through; anything else is coerced via its JSON
/// stringification, so `123: x` yields the key `"123"`.
pub(crate) fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_json_string(),
    }
}

/// Optional sign followed by one or more decimal digits.
fn is_integer_shape(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Optional sign, digits with an optional fractional part or a bare
/// fractional part, and an optional exponent. Must carry a digit.
fn is_decimal_shape(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };
    if let Some(exp) = exponent {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if exp.is_empty() || !exp.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    let (whole, frac) = match mantissa.find('.') {
        Some(pos) => (&mantissa[..pos], Some(&mantissa[pos + 1..])),
        None => (mantissa, None),
    };
    if !whole.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match frac {
        Some(frac) if !frac.bytes().all(|b| b.is_ascii_digit()) => false,
        Some(frac) => !whole.is_empty() || !frac.is_empty(),
        None => !whole.is_empty(),
    }
}

fn is_octal(s: &str) -> bool {
    s.bytes().all(|b| (b'0'..=b'7').contains(&b))
}

/// Parse an integer-shaped literal, narrowing to 32 bits when it fits
/// and widening into the decimal type past 64 bits.
fn parse_integer(text: &str) -> Value {
    match text.parse::<i64>() {
        Ok(n) => narrow(n),
        Err(_) => match BigInt::from_str(text) {
            Ok(big) => Value::Decimal(BigDecimal::from(big)),
            Err(_) => Value::String(text.to_string()),
        },
    }
}

/// Parse unsigned digits in a radix, with the same widening path.
fn radix_integer(digits: &str, radix: u32) -> Value {
    match i64::from_str_radix(digits, radix) {
        Ok(n) => narrow(n),
        Err(_) => match BigInt::parse_bytes(digits.as_bytes(), radix) {
            Some(big) => Value::Decimal(BigDecimal::from(big)),
            None => Value::String(digits.to_string()),
        },
    }
}

fn narrow(n: i64) -> Value {
    match i32::try_from(n) {
        Ok(small) => Value::Int(small),
        Err(_) => Value::Long(n),
    }
}

/// Parse a decimal-shaped literal, padding the forms (`1.`, `.5`)
/// that the decimal parser does not take directly.
fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    };
    let mut normalized = String::with_capacity(text.len() + 2);
    normalized.push_str(sign);
    if mantissa.starts_with('.') {
        normalized.push('0');
    }
    normalized.push_str(mantissa);
    if mantissa.ends_with('.') {
        normalized.push('0');
    }
    normalized.push_str(exponent);
    BigDecimal::from_str(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const V12: (u32, u32) = (1, 2);
    const V11: (u32, u32) = (1, 1);

    fn value(text: &str) -> Value {
        classify(text, None, V12).0
    }

    #[test]
    fn test_null_literals() {
        for text in ["", "null", "Null", "NULL", "~"] {
            assert_eq!(value(text), Value::Null, "{:?}", text);
        }
    }

    #[test]
    fn test_booleans() {
        assert_eq!(value("true"), Value::Bool(true));
        assert_eq!(value("False"), Value::Bool(false));
        // The 1.1 vocabulary is plain text under 1.2 rules.
        assert_eq!(value("yes"), Value::String("yes".to_string()));
        assert_eq!(classify("on", None, V11).0, Value::Bool(true));
        assert_eq!(classify("Off", None, V11).0, Value::Bool(false));
    }

    #[test]
    fn test_integers_narrow_and_widen() {
        assert_eq!(value("65"), Value::Int(65));
        assert_eq!(value("-7"), Value::Int(-7));
        assert_eq!(value("+3"), Value::Int(3));
        assert_eq!(value("4294967296"), Value::Long(4294967296));
        let huge = "123456789012345678901234567890";
        match value(huge) {
            Value::Decimal(d) => assert_eq!(d.to_string(), huge),
            other => panic!("expected decimal, got {:?}", other),
        }
    }

    #[test]
    fn test_radix_integers() {
        assert_eq!(value("0o17"), Value::Int(15));
        assert_eq!(value("0x1F"), Value::Int(31));
        assert_eq!(value("0x"), Value::String("0x".to_string()));
        assert_eq!(value("0o9"), Value::String("0o9".to_string()));
    }

    #[test]
    fn test_legacy_octal() {
        assert_eq!(classify("0644", None, V11).0, Value::Int(0o644));
        // Under 1.2 a leading zero is just a decimal integer.
        assert_eq!(value("0644"), Value::Int(644));
    }

    #[test]
    fn test_decimals() {
        let d = |s: &str| Value::Decimal(BigDecimal::from_str(s).unwrap());
        assert_eq!(value("0.278"), d("0.278"));
        assert_eq!(value("-1.5e3"), d("-1.5e3"));
        assert_eq!(value(".5"), d("0.5"));
        assert_eq!(value("1."), d("1.0"));
        assert_eq!(value("1e2"), d("1e2"));
    }

    #[test]
    fn test_float_specials_keep_text() {
        let (v, tag) = classify(".nan", None, V12);
        assert_eq!(v, Value::String(".nan".to_string()));
        assert_eq!(tag, Some(TAG_FLOAT));
        let (v, tag) = classify("-.inf", None, V12);
        assert_eq!(v, Value::String("-.inf".to_string()));
        assert_eq!(tag, Some(TAG_FLOAT));
        // An explicit tag suppresses the implied one.
        let (_, tag) = classify(".nan", Some(TAG_STR), V12);
        assert_eq!(tag, None);
    }

    #[test]
    fn test_tag_overrides() {
        assert_eq!(
            classify("65", Some(TAG_STR), V12).0,
            Value::String("65".to_string())
        );
        assert_eq!(
            classify("65", Some(TAG_FLOAT), V12).0,
            Value::Decimal(BigDecimal::from_str("65").unwrap())
        );
        assert_eq!(classify("3.0", Some(TAG_INT), V12).0, Value::Int(3));
        // Non-zero fraction cannot honor the int tag.
        assert_eq!(
            classify("3.5", Some(TAG_INT), V12).0,
            Value::Decimal(BigDecimal::from_str("3.5").unwrap())
        );
    }

    #[test]
    fn test_fallback_strings() {
        assert_eq!(value("hello"), Value::String("hello".to_string()));
        assert_eq!(value("1.2.3"), Value::String("1.2.3".to_string()));
        assert_eq!(value("-"), Value::String("-".to_string()));
        assert_eq!(value("."), Value::String(".".to_string()));
    }
}
