//! `buf.validate` rule model.
//!
//! Rules arrive as bracketed extension keys inside descriptor option maps
//! (`"[buf.validate.field]"`, `"[buf.validate.oneof]"`,
//! `"[buf.validate.message]"`). This module parses that JSON into a closed,
//! typed rule model. Protobuf JSON renders 64-bit integers as decimal
//! strings, so every numeric accessor accepts both forms.

use crate::error::DescriptorError;
use serde_json::Value;

/// Option key carrying field-level rules.
pub const FIELD_RULES_KEY: &str = "[buf.validate.field]";
/// Option key carrying oneof-level rules.
pub const ONEOF_RULES_KEY: &str = "[buf.validate.oneof]";
/// Option key carrying message-level rules.
pub const MESSAGE_RULES_KEY: &str = "[buf.validate.message]";

/// How a rule participates in validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ignore {
    #[default]
    None,
    /// The rule is disabled outright.
    Always,
    /// Skip validation when the field is unset.
    IfUnset,
    /// Skip validation when the field holds its default value.
    IfDefault,
}

/// The effective validation rule for a single field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRule {
    pub required: bool,
    pub ignore: Ignore,
    pub value: Option<ValueRule>,
}

/// Kind-specific rule payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueRule {
    Bool(BoolRule),
    Int(IntRule),
    Uint(UintRule),
    Float(FloatRule),
    Str(StringRule),
    Bytes(BytesRule),
    Enum(EnumRule),
    Repeated(RepeatedRule),
    Map(MapRule),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolRule {
    pub const_: Option<bool>,
}

/// Signed integer rules (int32/int64/sint*/sfixed* families).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntRule {
    pub const_: Option<i64>,
    pub lt: Option<i64>,
    pub lte: Option<i64>,
    pub gt: Option<i64>,
    pub gte: Option<i64>,
    pub in_: Vec<i64>,
    pub not_in: Vec<i64>,
}

/// Unsigned integer rules (uint32/uint64/fixed* families).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UintRule {
    pub const_: Option<u64>,
    pub lt: Option<u64>,
    pub lte: Option<u64>,
    pub gt: Option<u64>,
    pub gte: Option<u64>,
    pub in_: Vec<u64>,
    pub not_in: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatRule {
    pub const_: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub in_: Vec<f64>,
    pub not_in: Vec<f64>,
    pub finite: bool,
}

/// Well-known string formats, a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownFormat {
    Email,
    Hostname,
    Ip,
    Ipv4,
    Ipv6,
    Uri,
    UriRef,
    Address,
    Uuid,
    Tuuid,
    IpWithPrefixlen,
    Ipv4WithPrefixlen,
    Ipv6WithPrefixlen,
    IpPrefix,
    Ipv4Prefix,
    Ipv6Prefix,
    HostAndPort,
    HttpHeaderName,
    HttpHeaderValue,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRule {
    pub const_: Option<String>,
    pub len: Option<u64>,
    pub min_len: Option<u64>,
    pub max_len: Option<u64>,
    pub len_bytes: Option<u64>,
    pub min_bytes: Option<u64>,
    pub max_bytes: Option<u64>,
    pub pattern: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub contains: Option<String>,
    pub not_contains: Option<String>,
    pub in_: Vec<String>,
    pub not_in: Vec<String>,
    pub well_known: Option<WellKnownFormat>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BytesRule {
    /// Base64 form, as rendered by protobuf JSON.
    pub const_: Option<String>,
    pub len: Option<u64>,
    pub min_len: Option<u64>,
    pub max_len: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumRule {
    pub const_: Option<i32>,
    pub defined_only: bool,
    pub in_: Vec<i32>,
    pub not_in: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepeatedRule {
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique: bool,
    pub items: Option<Box<FieldRule>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapRule {
    pub min_pairs: Option<u64>,
    pub max_pairs: Option<u64>,
    pub keys: Option<Box<FieldRule>>,
    pub values: Option<Box<FieldRule>>,
}

/// Parse the `[buf.validate.field]` payload for the named field.
pub fn parse_field_rule(field: &str, value: &Value) -> Result<FieldRule, DescriptorError> {
    let obj = expect_object(field, value)?;
    let mut rule = FieldRule {
        required: obj.get("required").and_then(Value::as_bool).unwrap_or(false),
        ignore: parse_ignore(obj.get("ignore")),
        value: None,
    };
    for (key, payload) in obj {
        let parsed = match key.as_str() {
            "bool" => Some(ValueRule::Bool(parse_bool_rule(payload))),
            "int32" | "int64" | "sint32" | "sint64" | "sfixed32" | "sfixed64" => {
                Some(ValueRule::Int(parse_int_rule(field, payload)?))
            }
            "uint32" | "uint64" | "fixed32" | "fixed64" => {
                Some(ValueRule::Uint(parse_uint_rule(field, payload)?))
            }
            "float" | "double" => Some(ValueRule::Float(parse_float_rule(field, payload)?)),
            "string" => Some(ValueRule::Str(parse_string_rule(field, payload)?)),
            "bytes" => Some(ValueRule::Bytes(parse_bytes_rule(field, payload)?)),
            "enum" => Some(ValueRule::Enum(parse_enum_rule(field, payload)?)),
            "repeated" => Some(ValueRule::Repeated(parse_repeated_rule(field, payload)?)),
            "map" => Some(ValueRule::Map(parse_map_rule(field, payload)?)),
            _ => None,
        };
        if let Some(parsed) = parsed {
            if rule.value.is_some() {
                return Err(malformed(field, "more than one kind-specific rule payload"));
            }
            rule.value = Some(parsed);
        }
    }
    Ok(rule)
}

/// Parse the `[buf.validate.oneof]` payload: currently just `required`.
pub fn parse_oneof_required(value: &Value) -> bool {
    value
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Parse the `[buf.validate.message]` payload: currently just `disabled`.
pub fn parse_message_disabled(value: &Value) -> bool {
    value
        .get("disabled")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn parse_ignore(value: Option<&Value>) -> Ignore {
    match value {
        Some(Value::String(s)) => match s.as_str() {
            "IGNORE_ALWAYS" => Ignore::Always,
            "IGNORE_IF_UNPOPULATED" | "IGNORE_IF_UNSET" => Ignore::IfUnset,
            "IGNORE_IF_DEFAULT_VALUE" => Ignore::IfDefault,
            _ => Ignore::None,
        },
        // The numeric enum form, if a tool serialized it raw.
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => Ignore::IfUnset,
            Some(2) => Ignore::IfDefault,
            Some(3) => Ignore::Always,
            _ => Ignore::None,
        },
        _ => Ignore::None,
    }
}

fn parse_bool_rule(value: &Value) -> BoolRule {
    BoolRule {
        const_: value.get("const").and_then(Value::as_bool),
    }
}

fn parse_int_rule(field: &str, value: &Value) -> Result<IntRule, DescriptorError> {
    let obj = expect_object(field, value)?;
    let get = |name: &str| -> Result<Option<i64>, DescriptorError> {
        obj.get(name).map(|v| as_i64(field, name, v)).transpose()
    };
    Ok(IntRule {
        const_: get("const")?,
        lt: get("lt")?,
        lte: get("lte")?,
        gt: get("gt")?,
        gte: get("gte")?,
        in_: list(obj.get("in"), |v| as_i64(field, "in", v))?,
        not_in: list(obj.get("notIn"), |v| as_i64(field, "notIn", v))?,
    })
}

fn parse_uint_rule(field: &str, value: &Value) -> Result<UintRule, DescriptorError> {
    let obj = expect_object(field, value)?;
    let get = |name: &str| -> Result<Option<u64>, DescriptorError> {
        obj.get(name).map(|v| as_u64(field, name, v)).transpose()
    };
    Ok(UintRule {
        const_: get("const")?,
        lt: get("lt")?,
        lte: get("lte")?,
        gt: get("gt")?,
        gte: get("gte")?,
        in_: list(obj.get("in"), |v| as_u64(field, "in", v))?,
        not_in: list(obj.get("notIn"), |v| as_u64(field, "notIn", v))?,
    })
}

fn parse_float_rule(field: &str, value: &Value) -> Result<FloatRule, DescriptorError> {
    let obj = expect_object(field, value)?;
    let get = |name: &str| -> Result<Option<f64>, DescriptorError> {
        obj.get(name).map(|v| as_f64(field, name, v)).transpose()
    };
    Ok(FloatRule {
        const_: get("const")?,
        lt: get("lt")?,
        lte: get("lte")?,
        gt: get("gt")?,
        gte: get("gte")?,
        in_: list(obj.get("in"), |v| as_f64(field, "in", v))?,
        not_in: list(obj.get("notIn"), |v| as_f64(field, "notIn", v))?,
        finite: obj.get("finite").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn parse_string_rule(field: &str, value: &Value) -> Result<StringRule, DescriptorError> {
    let obj = expect_object(field, value)?;
    let len = |name: &str| -> Result<Option<u64>, DescriptorError> {
        obj.get(name).map(|v| as_u64(field, "string", v)).transpose()
    };
    let text = |name: &str| -> Option<String> {
        obj.get(name).and_then(Value::as_str).map(str::to_owned)
    };
    let mut rule = StringRule {
        const_: text("const"),
        len: len("len")?,
        min_len: len("minLen")?,
        max_len: len("maxLen")?,
        len_bytes: len("lenBytes")?,
        min_bytes: len("minBytes")?,
        max_bytes: len("maxBytes")?,
        pattern: text("pattern"),
        prefix: text("prefix"),
        suffix: text("suffix"),
        contains: text("contains"),
        not_contains: text("notContains"),
        in_: list(obj.get("in"), |v| {
            v.as_str()
                .map(str::to_owned)
                .ok_or_else(|| malformed(field, "non-string entry in string `in` list"))
        })?,
        not_in: list(obj.get("notIn"), |v| {
            v.as_str()
                .map(str::to_owned)
                .ok_or_else(|| malformed(field, "non-string entry in string `notIn` list"))
        })?,
        well_known: None,
    };
    rule.well_known = parse_well_known(obj);
    Ok(rule)
}

fn parse_well_known(obj: &serde_json::Map<String, Value>) -> Option<WellKnownFormat> {
    const FLAGS: &[(&str, WellKnownFormat)] = &[
        ("email", WellKnownFormat::Email),
        ("hostname", WellKnownFormat::Hostname),
        ("ip", WellKnownFormat::Ip),
        ("ipv4", WellKnownFormat::Ipv4),
        ("ipv6", WellKnownFormat::Ipv6),
        ("uri", WellKnownFormat::Uri),
        ("uriRef", WellKnownFormat::UriRef),
        ("address", WellKnownFormat::Address),
        ("uuid", WellKnownFormat::Uuid),
        ("tuuid", WellKnownFormat::Tuuid),
        ("ipWithPrefixlen", WellKnownFormat::IpWithPrefixlen),
        ("ipv4WithPrefixlen", WellKnownFormat::Ipv4WithPrefixlen),
        ("ipv6WithPrefixlen", WellKnownFormat::Ipv6WithPrefixlen),
        ("ipPrefix", WellKnownFormat::IpPrefix),
        ("ipv4Prefix", WellKnownFormat::Ipv4Prefix),
        ("ipv6Prefix", WellKnownFormat::Ipv6Prefix),
        ("hostAndPort", WellKnownFormat::HostAndPort),
    ];
    for (key, format) in FLAGS {
        if obj.get(*key).and_then(Value::as_bool) == Some(true) {
            return Some(*format);
        }
    }
    match obj.get("wellKnownRegex").and_then(Value::as_str) {
        Some("KNOWN_REGEX_HTTP_HEADER_NAME") => Some(WellKnownFormat::HttpHeaderName),
        Some("KNOWN_REGEX_HTTP_HEADER_VALUE") => Some(WellKnownFormat::HttpHeaderValue),
        _ => None,
    }
}

fn parse_bytes_rule(field: &str, value: &Value) -> Result<BytesRule, DescriptorError> {
    let obj = expect_object(field, value)?;
    let len = |name: &str| -> Result<Option<u64>, DescriptorError> {
        obj.get(name).map(|v| as_u64(field, "bytes", v)).transpose()
    };
    Ok(BytesRule {
        const_: obj.get("const").and_then(Value::as_str).map(str::to_owned),
        len: len("len")?,
        min_len: len("minLen")?,
        max_len: len("maxLen")?,
    })
}

fn parse_enum_rule(field: &str, value: &Value) -> Result<EnumRule, DescriptorError> {
    let obj = expect_object(field, value)?;
    let num = |v: &Value| -> Result<i32, DescriptorError> {
        as_i64(field, "enum", v)?
            .try_into()
            .map_err(|_| malformed(field, "enum value out of int32 range"))
    };
    Ok(EnumRule {
        const_: obj.get("const").map(num).transpose()?,
        defined_only: obj
            .get("definedOnly")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        in_: list(obj.get("in"), num)?,
        not_in: list(obj.get("notIn"), num)?,
    })
}

fn parse_repeated_rule(field: &str, value: &Value) -> Result<RepeatedRule, DescriptorError> {
    let obj = expect_object(field, value)?;
    let len = |name: &str| -> Result<Option<u64>, DescriptorError> {
        obj.get(name)
            .map(|v| as_u64(field, "repeated", v))
            .transpose()
    };
    Ok(RepeatedRule {
        min_items: len("minItems")?,
        max_items: len("maxItems")?,
        unique: obj.get("unique").and_then(Value::as_bool).unwrap_or(false),
        items: obj
            .get("items")
            .map(|v| parse_field_rule(field, v).map(Box::new))
            .transpose()?,
    })
}

fn parse_map_rule(field: &str, value: &Value) -> Result<MapRule, DescriptorError> {
    let obj = expect_object(field, value)?;
    let len = |name: &str| -> Result<Option<u64>, DescriptorError> {
        obj.get(name).map(|v| as_u64(field, "map", v)).transpose()
    };
    Ok(MapRule {
        min_pairs: len("minPairs")?,
        max_pairs: len("maxPairs")?,
        keys: obj
            .get("keys")
            .map(|v| parse_field_rule(field, v).map(Box::new))
            .transpose()?,
        values: obj
            .get("values")
            .map(|v| parse_field_rule(field, v).map(Box::new))
            .transpose()?,
    })
}

fn expect_object<'v>(
    field: &str,
    value: &'v Value,
) -> Result<&'v serde_json::Map<String, Value>, DescriptorError> {
    value
        .as_object()
        .ok_or_else(|| malformed(field, "rule payload is not a JSON object"))
}

fn list<T>(
    value: Option<&Value>,
    parse: impl Fn(&Value) -> Result<T, DescriptorError>,
) -> Result<Vec<T>, DescriptorError> {
    match value {
        Some(Value::Array(items)) => items.iter().map(parse).collect(),
        _ => Ok(Vec::new()),
    }
}

fn as_i64(field: &str, key: &str, value: &Value) -> Result<i64, DescriptorError> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| malformed(field, &format!("`{key}` bound is not a signed integer")))
}

fn as_u64(field: &str, key: &str, value: &Value) -> Result<u64, DescriptorError> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| malformed(field, &format!("`{key}` bound is not an unsigned integer")))
}

fn as_f64(field: &str, key: &str, value: &Value) -> Result<f64, DescriptorError> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse().ok(),
        },
        _ => None,
    }
    .ok_or_else(|| malformed(field, &format!("`{key}` bound is not a number")))
}

fn malformed(field: &str, detail: &str) -> DescriptorError {
    DescriptorError::MalformedRule {
        field: field.to_string(),
        key: FIELD_RULES_KEY,
        detail: detail.to_string(),
    }
}
