//! String and bytes schema builders.

use protoscribe_descriptor::{BytesRule, StringRule, WellKnownFormat};
use serde_json::{json, Map, Value};

/// Base64 alphabet with optional padding, the protobuf JSON form of bytes.
pub(crate) const BASE64_PATTERN: &str = "^[A-Za-z0-9+/]*={0,2}$";

// Reusable regex cores for the well-known format table. All patterns are
// ECMA-regex compatible, since that is what JSON Schema consumers run.
const HOSTNAME_CORE: &str =
    "[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*";
const IPV4_CORE: &str =
    "(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)";
const IPV6_CORE: &str =
    "(?:(?:[0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4}|(?:[0-9A-Fa-f]{1,4}:)*:(?:[0-9A-Fa-f]{1,4}:)*[0-9A-Fa-f]{0,4})";
const EMAIL_LOCAL_CORE: &str = "[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+";
const UUID_CORE: &str =
    "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";
const V4_PREFIXLEN_CORE: &str = "(?:[0-9]|[12][0-9]|3[0-2])";
const V6_PREFIXLEN_CORE: &str = "(?:[0-9]|[1-9][0-9]|1[01][0-9]|12[0-8])";
const PORT_CORE: &str = "[0-9]{1,5}";

/// The closed well-known format table: JSON Schema `format` token (when one
/// exists) plus a named pattern.
pub(crate) fn well_known_fragment(format: WellKnownFormat) -> (Option<&'static str>, String) {
    match format {
        WellKnownFormat::Email => (
            Some("email"),
            format!("^{EMAIL_LOCAL_CORE}@{HOSTNAME_CORE}$"),
        ),
        WellKnownFormat::Hostname => (Some("hostname"), format!("^{HOSTNAME_CORE}$")),
        WellKnownFormat::Ip => (None, format!("^(?:{IPV4_CORE}|{IPV6_CORE})$")),
        WellKnownFormat::Ipv4 => (Some("ipv4"), format!("^{IPV4_CORE}$")),
        WellKnownFormat::Ipv6 => (Some("ipv6"), format!("^{IPV6_CORE}$")),
        WellKnownFormat::Uri => (Some("uri"), "^[A-Za-z][A-Za-z0-9+.-]*:\\S*$".to_string()),
        WellKnownFormat::UriRef => (Some("uri-reference"), "^\\S*$".to_string()),
        WellKnownFormat::Address => (
            None,
            format!("^(?:{HOSTNAME_CORE}|{IPV4_CORE}|{IPV6_CORE})$"),
        ),
        WellKnownFormat::Uuid => (Some("uuid"), format!("^{UUID_CORE}$")),
        WellKnownFormat::Tuuid => (None, "^[0-9a-fA-F]{32}$".to_string()),
        WellKnownFormat::IpWithPrefixlen | WellKnownFormat::IpPrefix => (
            None,
            format!("^(?:{IPV4_CORE}/{V4_PREFIXLEN_CORE}|{IPV6_CORE}/{V6_PREFIXLEN_CORE})$"),
        ),
        WellKnownFormat::Ipv4WithPrefixlen | WellKnownFormat::Ipv4Prefix => {
            (None, format!("^{IPV4_CORE}/{V4_PREFIXLEN_CORE}$"))
        }
        WellKnownFormat::Ipv6WithPrefixlen | WellKnownFormat::Ipv6Prefix => {
            (None, format!("^{IPV6_CORE}/{V6_PREFIXLEN_CORE}$"))
        }
        WellKnownFormat::HostAndPort => (
            None,
            format!("^(?:{HOSTNAME_CORE}|{IPV4_CORE}|\\[{IPV6_CORE}\\]):{PORT_CORE}$"),
        ),
        WellKnownFormat::HttpHeaderName => {
            (None, "^:?[0-9a-zA-Z!#$%&'*+\\-.^_`|~]+$".to_string())
        }
        WellKnownFormat::HttpHeaderValue => {
            (None, "^[^\\u0000-\\u0008\\u000A-\\u001F\\u007F]*$".to_string())
        }
    }
}

pub(crate) fn string_schema(rule: Option<&StringRule>) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), json!("string"));
    let Some(rule) = rule else {
        return Value::Object(schema);
    };

    if let Some(value) = &rule.const_ {
        schema.insert("const".into(), json!(value));
        return Value::Object(schema);
    }
    if !rule.in_.is_empty() {
        schema.insert("enum".into(), json!(rule.in_));
        return Value::Object(schema);
    }

    // Character-count bounds. Byte-length rules only cap the maximum:
    // UTF-8 character count never exceeds byte count, and a byte floor
    // implies no character floor.
    let min_length = rule.len.or(rule.min_len);
    let max_length = [rule.len, rule.max_len, rule.len_bytes, rule.max_bytes]
        .into_iter()
        .flatten()
        .min();
    if let Some(min) = min_length {
        schema.insert("minLength".into(), json!(min));
    }
    if let Some(max) = max_length {
        schema.insert("maxLength".into(), json!(max));
    }

    if let Some(pattern) = &rule.pattern {
        schema.insert("pattern".into(), json!(pattern));
    } else if let Some(pattern) = affix_pattern(rule) {
        schema.insert("pattern".into(), json!(pattern));
    }

    if let Some(well_known) = rule.well_known {
        let (format, pattern) = well_known_fragment(well_known);
        if let Some(format) = format {
            schema.insert("format".into(), json!(format));
        }
        if !schema.contains_key("pattern") {
            schema.insert("pattern".into(), json!(pattern));
        }
    }

    let mut negatives = Vec::new();
    if !rule.not_in.is_empty() {
        negatives.push(json!({ "enum": rule.not_in }));
    }
    if let Some(not_contains) = &rule.not_contains {
        negatives.push(json!({ "pattern": regex::escape(not_contains) }));
    }
    match negatives.len() {
        0 => {}
        1 => {
            schema.insert("not".into(), negatives.remove(0));
        }
        _ => {
            schema.insert("not".into(), json!({ "anyOf": negatives }));
        }
    }

    Value::Object(schema)
}

/// Combine prefix/contains/suffix into one anchored, `.*`-joined pattern.
fn affix_pattern(rule: &StringRule) -> Option<String> {
    let mut segments = Vec::new();
    if let Some(prefix) = &rule.prefix {
        segments.push(format!("^{}", regex::escape(prefix)));
    }
    if let Some(contains) = &rule.contains {
        segments.push(regex::escape(contains));
    }
    if let Some(suffix) = &rule.suffix {
        segments.push(format!("{}$", regex::escape(suffix)));
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join(".*"))
    }
}

/// Unpadded base64 length for `n` raw bytes: `ceil(4n/3)`.
pub(crate) fn base64_unpadded(raw: u64) -> u64 {
    (4 * raw).div_ceil(3)
}

/// Padded base64 length: unpadded rounded up to the next multiple of 4.
pub(crate) fn base64_padded(raw: u64) -> u64 {
    let unpadded = base64_unpadded(raw);
    unpadded + (4 - unpadded % 4) % 4
}

pub(crate) fn bytes_schema(rule: Option<&BytesRule>) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), json!("string"));
    schema.insert("pattern".into(), json!(BASE64_PATTERN));
    let Some(rule) = rule else {
        return Value::Object(schema);
    };

    if let Some(value) = &rule.const_ {
        schema.insert("const".into(), json!(value));
        return Value::Object(schema);
    }

    // All bounds are against the encoded form. An exact raw length spans
    // the padding variance; a floor omits padding, a cap includes it.
    if let Some(len) = rule.len {
        schema.insert("minLength".into(), json!(base64_unpadded(len)));
        schema.insert("maxLength".into(), json!(base64_padded(len)));
    } else {
        if let Some(min) = rule.min_len {
            schema.insert("minLength".into(), json!(base64_unpadded(min)));
        }
        if let Some(max) = rule.max_len {
            schema.insert("maxLength".into(), json!(base64_padded(max)));
        }
    }

    Value::Object(schema)
}
