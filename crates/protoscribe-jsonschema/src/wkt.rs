//! Well-known library types.
//!
//! These bypass the generic message builder: their protobuf JSON encodings
//! are special forms, not objects-of-fields. The table is statically
//! constructed and passed to the engine at construction, never a global
//! registry; callers can extend or replace it via
//! [`Generator::with_custom_types`](crate::Generator::with_custom_types).

use crate::error::GenerateError;
use crate::generator::Generator;
use crate::{numeric, text};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Fragment builder for one well-known type.
pub type WktBuilder<'p> = fn(&mut Generator<'p>) -> Result<Map<String, Value>, GenerateError>;

/// The built-in table.
pub fn builtin<'p>() -> BTreeMap<&'static str, WktBuilder<'p>> {
    let mut table: BTreeMap<&'static str, WktBuilder<'p>> = BTreeMap::new();
    table.insert("google.protobuf.Any", any_fragment);
    table.insert("google.protobuf.Duration", duration_fragment);
    table.insert("google.protobuf.Timestamp", timestamp_fragment);
    table.insert("google.protobuf.Value", value_fragment);
    table.insert("google.protobuf.ListValue", list_value_fragment);
    table.insert("google.protobuf.Struct", struct_fragment);
    table.insert("google.protobuf.BoolValue", bool_value_fragment);
    table.insert("google.protobuf.BytesValue", bytes_value_fragment);
    table.insert("google.protobuf.DoubleValue", double_value_fragment);
    table.insert("google.protobuf.FloatValue", double_value_fragment);
    table.insert("google.protobuf.Int32Value", int32_value_fragment);
    table.insert("google.protobuf.Int64Value", int64_value_fragment);
    table.insert("google.protobuf.StringValue", string_value_fragment);
    table.insert("google.protobuf.UInt32Value", uint32_value_fragment);
    table.insert("google.protobuf.UInt64Value", uint64_value_fragment);
    table
}

fn object(value: Value) -> Result<Map<String, Value>, GenerateError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(GenerateError::invariant(
            "google.protobuf",
            "wrapper fragment was not an object",
        )),
    }
}

fn any_fragment(_generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(json!({
        "type": "object",
        "properties": { "@type": { "type": "string" } },
    }))
}

fn duration_fragment(_generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(json!({ "type": "string", "format": "duration" }))
}

fn timestamp_fragment(_generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(json!({ "type": "string", "format": "date-time" }))
}

/// `google.protobuf.Value` accepts any JSON value: an empty schema.
fn value_fragment(_generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    Ok(Map::new())
}

fn list_value_fragment(_generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(json!({ "type": "array" }))
}

fn struct_fragment(_generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(json!({ "type": "object" }))
}

// Wrapper types carry their wrapped scalar's schema with explicit presence
// and no rule.

fn bool_value_fragment(_generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(json!({ "type": "boolean" }))
}

fn string_value_fragment(
    _generator: &mut Generator<'_>,
) -> Result<Map<String, Value>, GenerateError> {
    object(json!({ "type": "string" }))
}

fn bytes_value_fragment(_generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(text::bytes_schema(None))
}

fn double_value_fragment(generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(numeric::float_schema(None, generator.options.strict))
}

fn int32_value_fragment(generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(numeric::signed_schema(32, None, generator.options.strict))
}

fn int64_value_fragment(generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(numeric::signed_schema(64, None, generator.options.strict))
}

fn uint32_value_fragment(generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(numeric::unsigned_schema(32, None, generator.options.strict))
}

fn uint64_value_fragment(generator: &mut Generator<'_>) -> Result<Map<String, Value>, GenerateError> {
    object(numeric::unsigned_schema(64, None, generator.options.strict))
}
