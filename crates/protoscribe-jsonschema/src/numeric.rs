//! Integer and float schema builders.
//!
//! Two protobuf JSON realities drive the shape of these schemas:
//!
//! - 64-bit integers are not exactly representable as JSON numbers beyond
//!   2^53-1 (RFC 8259 interoperability), so wide kinds get a decimal-string
//!   alternative and never emit numeric bounds outside the safe window.
//! - `buf.validate` allows a lower bound above the upper bound to mean
//!   "outside this hole"; such pairs become a union of two half-bounded
//!   sub-schemas instead of an impossible intersection.

use protoscribe_descriptor::{FloatRule, IntRule, UintRule};
use serde_json::{json, Map, Value};

/// Largest integer magnitude exactly representable in a JSON number.
pub const SAFE_INT_MAX: i64 = (1 << 53) - 1;
pub const SAFE_INT_MIN: i64 = -SAFE_INT_MAX;
pub const SAFE_UINT_MAX: u64 = (1 << 53) - 1;

pub(crate) const SIGNED_DIGITS_PATTERN: &str = "^-?[0-9]+$";
pub(crate) const UNSIGNED_DIGITS_PATTERN: &str = "^[0-9]+$";
const DECIMAL_PATTERN: &str = "^-?[0-9]+([.][0-9]+)?([eE][+-]?[0-9]+)?$";

/// Conflicting bound pairs are read as a union, not an empty interval.
/// Detection: `lower_exclusive ? upper <= lower : upper < lower`.
fn or_interval<T: PartialOrd>(lower: Option<(T, bool)>, upper: Option<(T, bool)>) -> bool {
    match (lower, upper) {
        (Some((lower, true)), Some((upper, _))) => upper <= lower,
        (Some((lower, false)), Some((upper, _))) => upper < lower,
        _ => false,
    }
}

fn collapse(mut alternatives: Vec<Value>) -> Value {
    if alternatives.len() == 1 {
        alternatives.remove(0)
    } else {
        json!({ "anyOf": alternatives })
    }
}

// ----------------------------------------------------------------------------
// Signed integers
// ----------------------------------------------------------------------------

pub(crate) fn signed_schema(bits: u32, rule: Option<&IntRule>, strict: bool) -> Value {
    let wide = bits > 53;
    let domain = if wide {
        (i64::MIN, i64::MAX)
    } else {
        (i64::from(i32::MIN), i64::from(i32::MAX))
    };

    if let Some(rule) = rule {
        if let Some(value) = rule.const_ {
            return signed_const(value, wide, strict);
        }
        if !rule.in_.is_empty() {
            return signed_in(&rule.in_, wide, strict);
        }
    }

    let lower = rule.and_then(|r| exclusive_or_inclusive(r.gt, r.gte));
    let upper = rule.and_then(|r| exclusive_or_inclusive(r.lt, r.lte));
    let not_in = rule.map_or(&[][..], |r| r.not_in.as_slice());

    let mut alternatives = Vec::new();
    if or_interval(lower, upper) {
        alternatives.push(signed_fragment(lower, None, domain, wide, not_in));
        alternatives.push(signed_fragment(None, upper, domain, wide, not_in));
    } else {
        alternatives.push(signed_fragment(lower, upper, domain, wide, not_in));
    }
    if wide && !strict {
        alternatives.push(digit_string_fragment(
            SIGNED_DIGITS_PATTERN,
            not_in.iter().map(i64::to_string),
        ));
    }
    collapse(alternatives)
}

fn exclusive_or_inclusive<T>(exclusive: Option<T>, inclusive: Option<T>) -> Option<(T, bool)> {
    match (exclusive, inclusive) {
        (Some(value), _) => Some((value, true)),
        (None, Some(value)) => Some((value, false)),
        (None, None) => None,
    }
}

fn signed_fragment(
    lower: Option<(i64, bool)>,
    upper: Option<(i64, bool)>,
    domain: (i64, i64),
    wide: bool,
    not_in: &[i64],
) -> Value {
    let mut fragment = Map::new();
    fragment.insert("type".into(), json!("integer"));
    let lower = lower.or(Some((domain.0, false)));
    let upper = upper.or(Some((domain.1, false)));
    if let Some((value, exclusive)) = lower {
        if !wide || (SAFE_INT_MIN..=SAFE_INT_MAX).contains(&value) {
            let key = if exclusive { "exclusiveMinimum" } else { "minimum" };
            fragment.insert(key.into(), json!(value));
        }
    }
    if let Some((value, exclusive)) = upper {
        if !wide || (SAFE_INT_MIN..=SAFE_INT_MAX).contains(&value) {
            let key = if exclusive { "exclusiveMaximum" } else { "maximum" };
            fragment.insert(key.into(), json!(value));
        }
    }
    if !not_in.is_empty() {
        fragment.insert("not".into(), json!({ "enum": not_in }));
    }
    Value::Object(fragment)
}

fn signed_const(value: i64, wide: bool, strict: bool) -> Value {
    let in_window = (SAFE_INT_MIN..=SAFE_INT_MAX).contains(&value);
    let mut alternatives = Vec::new();
    if !wide || in_window || strict {
        alternatives.push(json!({ "type": "integer", "const": value }));
    }
    if wide && !strict {
        alternatives.push(json!({ "type": "string", "const": value.to_string() }));
    }
    collapse(alternatives)
}

fn signed_in(values: &[i64], wide: bool, strict: bool) -> Value {
    if !wide || strict {
        return json!({ "type": "integer", "enum": values });
    }
    let numeric: Vec<i64> = values
        .iter()
        .copied()
        .filter(|v| (SAFE_INT_MIN..=SAFE_INT_MAX).contains(v))
        .collect();
    let strings: Vec<String> = values.iter().map(i64::to_string).collect();
    let mut alternatives = Vec::new();
    if !numeric.is_empty() {
        alternatives.push(json!({ "type": "integer", "enum": numeric }));
    }
    alternatives.push(json!({ "type": "string", "enum": strings }));
    collapse(alternatives)
}

// ----------------------------------------------------------------------------
// Unsigned integers
// ----------------------------------------------------------------------------

pub(crate) fn unsigned_schema(bits: u32, rule: Option<&UintRule>, strict: bool) -> Value {
    let wide = bits > 53;
    let domain_max = if wide { u64::MAX } else { u64::from(u32::MAX) };

    if let Some(rule) = rule {
        if let Some(value) = rule.const_ {
            return unsigned_const(value, wide, strict);
        }
        if !rule.in_.is_empty() {
            return unsigned_in(&rule.in_, wide, strict);
        }
    }

    let lower = rule.and_then(|r| exclusive_or_inclusive(r.gt, r.gte));
    let upper = rule.and_then(|r| exclusive_or_inclusive(r.lt, r.lte));
    let not_in = rule.map_or(&[][..], |r| r.not_in.as_slice());

    let mut alternatives = Vec::new();
    if or_interval(lower, upper) {
        alternatives.push(unsigned_fragment(lower, None, domain_max, wide, not_in));
        alternatives.push(unsigned_fragment(None, upper, domain_max, wide, not_in));
    } else {
        alternatives.push(unsigned_fragment(lower, upper, domain_max, wide, not_in));
    }
    if wide && !strict {
        alternatives.push(digit_string_fragment(
            UNSIGNED_DIGITS_PATTERN,
            not_in.iter().map(u64::to_string),
        ));
    }
    collapse(alternatives)
}

fn unsigned_fragment(
    lower: Option<(u64, bool)>,
    upper: Option<(u64, bool)>,
    domain_max: u64,
    wide: bool,
    not_in: &[u64],
) -> Value {
    let mut fragment = Map::new();
    fragment.insert("type".into(), json!("integer"));
    let lower = lower.or(Some((0, false)));
    let upper = upper.or(Some((domain_max, false)));
    if let Some((value, exclusive)) = lower {
        if !wide || value <= SAFE_UINT_MAX {
            let key = if exclusive { "exclusiveMinimum" } else { "minimum" };
            fragment.insert(key.into(), json!(value));
        }
    }
    if let Some((value, exclusive)) = upper {
        if !wide || value <= SAFE_UINT_MAX {
            let key = if exclusive { "exclusiveMaximum" } else { "maximum" };
            fragment.insert(key.into(), json!(value));
        }
    }
    if !not_in.is_empty() {
        fragment.insert("not".into(), json!({ "enum": not_in }));
    }
    Value::Object(fragment)
}

fn unsigned_const(value: u64, wide: bool, strict: bool) -> Value {
    let in_window = value <= SAFE_UINT_MAX;
    let mut alternatives = Vec::new();
    if !wide || in_window || strict {
        alternatives.push(json!({ "type": "integer", "const": value }));
    }
    if wide && !strict {
        alternatives.push(json!({ "type": "string", "const": value.to_string() }));
    }
    collapse(alternatives)
}

fn unsigned_in(values: &[u64], wide: bool, strict: bool) -> Value {
    if !wide || strict {
        return json!({ "type": "integer", "enum": values });
    }
    let numeric: Vec<u64> = values
        .iter()
        .copied()
        .filter(|v| *v <= SAFE_UINT_MAX)
        .collect();
    let strings: Vec<String> = values.iter().map(u64::to_string).collect();
    let mut alternatives = Vec::new();
    if !numeric.is_empty() {
        alternatives.push(json!({ "type": "integer", "enum": numeric }));
    }
    alternatives.push(json!({ "type": "string", "enum": strings }));
    collapse(alternatives)
}

fn digit_string_fragment(
    pattern: &str,
    excluded: impl Iterator<Item = String>,
) -> Value {
    let excluded: Vec<String> = excluded.collect();
    let mut fragment = Map::new();
    fragment.insert("type".into(), json!("string"));
    fragment.insert("pattern".into(), json!(pattern));
    if !excluded.is_empty() {
        fragment.insert("not".into(), json!({ "enum": excluded }));
    }
    Value::Object(fragment)
}

// ----------------------------------------------------------------------------
// Floats
// ----------------------------------------------------------------------------

pub(crate) fn float_schema(rule: Option<&FloatRule>, strict: bool) -> Value {
    let finite_only = rule.is_some_and(|r| r.finite);

    if let Some(rule) = rule {
        if let Some(value) = rule.const_ {
            return float_const(value, strict);
        }
        if !rule.in_.is_empty() {
            return float_in(&rule.in_, strict);
        }
    }

    let lower = rule.and_then(|r| exclusive_or_inclusive(r.gt, r.gte));
    let upper = rule.and_then(|r| exclusive_or_inclusive(r.lt, r.lte));
    let not_in = rule.map_or(&[][..], |r| r.not_in.as_slice());

    let mut alternatives = Vec::new();
    if or_interval(lower, upper) {
        alternatives.push(float_fragment(lower, None, not_in));
        alternatives.push(float_fragment(None, upper, not_in));
    } else {
        alternatives.push(float_fragment(lower, upper, not_in));
    }
    if !strict {
        alternatives.push(json!({ "type": "string", "pattern": DECIMAL_PATTERN }));
        if !finite_only {
            alternatives.push(json!({
                "type": "string",
                "enum": ["NaN", "Infinity", "-Infinity"],
            }));
        }
    }
    collapse(alternatives)
}

fn float_fragment(lower: Option<(f64, bool)>, upper: Option<(f64, bool)>, not_in: &[f64]) -> Value {
    let mut fragment = Map::new();
    fragment.insert("type".into(), json!("number"));
    if let Some((value, exclusive)) = lower {
        if value.is_finite() {
            let key = if exclusive { "exclusiveMinimum" } else { "minimum" };
            fragment.insert(key.into(), json!(value));
        }
    }
    if let Some((value, exclusive)) = upper {
        if value.is_finite() {
            let key = if exclusive { "exclusiveMaximum" } else { "maximum" };
            fragment.insert(key.into(), json!(value));
        }
    }
    let excluded: Vec<f64> = not_in.iter().copied().filter(|v| v.is_finite()).collect();
    if !excluded.is_empty() {
        fragment.insert("not".into(), json!({ "enum": excluded }));
    }
    Value::Object(fragment)
}

fn float_const(value: f64, strict: bool) -> Value {
    let mut alternatives = Vec::new();
    if value.is_finite() {
        alternatives.push(json!({ "type": "number", "const": value }));
    }
    if !strict || !value.is_finite() {
        alternatives.push(json!({ "type": "string", "const": float_string(value) }));
    }
    collapse(alternatives)
}

fn float_in(values: &[f64], strict: bool) -> Value {
    let numeric: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let mut alternatives = Vec::new();
    if !numeric.is_empty() {
        alternatives.push(json!({ "type": "number", "enum": numeric }));
    }
    if !strict || numeric.is_empty() {
        let strings: Vec<String> = values.iter().map(|v| float_string(*v)).collect();
        alternatives.push(json!({ "type": "string", "enum": strings }));
    }
    collapse(alternatives)
}

fn float_string(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{value}")
    }
}
