//! Per-field schema assembly.
//!
//! A field schema is the kind-specific fragment under the field's
//! structural modifier (list or map), plus its documentation and, for
//! fields with an implicit default, the default value protobuf would
//! otherwise leave implicit.

use crate::enums::{self, EnumFieldContext};
use crate::error::GenerateError;
use crate::generator::Generator;
use crate::naming;
use crate::{numeric, text};
use protoscribe_descriptor::{
    BoolRule, BytesRule, EnumRule, FieldDescriptor, FieldRule, FloatRule, IntRule, MapInfo,
    MapRule, MessageDescriptor, StringRule, TypeKind, UintRule, ValueRule,
};
use serde_json::{json, Map, Value};

impl<'p> Generator<'p> {
    pub(crate) fn build_field(
        &mut self,
        message: &MessageDescriptor,
        field: &FieldDescriptor,
        rule: Option<&FieldRule>,
        refs: &mut Vec<String>,
    ) -> Result<Value, GenerateError> {
        let qualified = format!("{}.{}", message.full_name, field.name);
        let mut schema = Map::new();
        let (title, description) = naming::split_comment(field.comment.as_deref());
        if let Some(title) = title {
            schema.insert("title".into(), json!(title));
        }
        if let Some(description) = description {
            schema.insert("description".into(), json!(description));
        }

        let required = rule.is_some_and(|r| r.required);
        let implicit_default = !field.explicit_presence && !required;

        if let Some(map_info) = &field.map {
            let map_rule = match rule.and_then(|r| r.value.as_ref()) {
                Some(ValueRule::Map(map_rule)) => Some(map_rule),
                None => None,
                Some(_) => {
                    return Err(GenerateError::constraint(
                        &qualified,
                        "non-map rule payload on a map field",
                    ))
                }
            };
            self.build_map(&mut schema, map_info, map_rule, &qualified, refs)?;
            if !self.options.strict && implicit_default {
                schema.insert("default".into(), json!({}));
            }
        } else if field.is_list {
            let repeated = match rule.and_then(|r| r.value.as_ref()) {
                Some(ValueRule::Repeated(repeated)) => Some(repeated),
                None => None,
                Some(_) => {
                    return Err(GenerateError::constraint(
                        &qualified,
                        "non-repeated rule payload on a repeated field",
                    ))
                }
            };
            schema.insert("type".into(), json!("array"));
            let item_rule = repeated.and_then(|r| r.items.as_deref());
            let items = self.build_value(field, item_rule, false, &qualified, refs)?;
            schema.insert("items".into(), items);
            if let Some(repeated) = repeated {
                if let Some(min) = repeated.min_items {
                    schema.insert("minItems".into(), json!(min));
                }
                if let Some(max) = repeated.max_items {
                    schema.insert("maxItems".into(), json!(max));
                }
                if repeated.unique {
                    schema.insert("uniqueItems".into(), json!(true));
                }
            }
            if !self.options.strict && implicit_default {
                schema.insert("default".into(), json!([]));
            }
        } else {
            let top_level_scalar = !field.explicit_presence;
            let value = self.build_value(field, rule, top_level_scalar, &qualified, refs)?;
            merge(&mut schema, value, &qualified)?;
            if !self.options.strict && implicit_default {
                if let Some(default) = self.zero_value(field, &qualified)? {
                    schema.insert("default".into(), default);
                }
            }
        }
        Ok(Value::Object(schema))
    }

    /// Kind-specific schema for a single value position (a scalar field, a
    /// list item, or a map value).
    fn build_value(
        &mut self,
        field: &FieldDescriptor,
        rule: Option<&FieldRule>,
        top_level_scalar: bool,
        qualified: &str,
        refs: &mut Vec<String>,
    ) -> Result<Value, GenerateError> {
        let strict = self.options.strict;
        let payload = rule.and_then(|r| r.value.as_ref());
        let required = rule.is_some_and(|r| r.required);
        let pool = self.pool;

        let schema = match field.kind {
            TypeKind::Bool => {
                let rule = bool_payload(payload, qualified)?;
                let mut fragment = Map::new();
                fragment.insert("type".into(), json!("boolean"));
                if let Some(value) = rule.and_then(|r| r.const_) {
                    fragment.insert("const".into(), json!(value));
                }
                Value::Object(fragment)
            }
            kind if kind.is_int32_family() => {
                numeric::signed_schema(32, int_payload(payload, qualified)?, strict)
            }
            kind if kind.is_int64_family() => {
                numeric::signed_schema(64, int_payload(payload, qualified)?, strict)
            }
            kind if kind.is_uint32_family() => {
                numeric::unsigned_schema(32, uint_payload(payload, qualified)?, strict)
            }
            kind if kind.is_uint64_family() => {
                numeric::unsigned_schema(64, uint_payload(payload, qualified)?, strict)
            }
            kind if kind.is_float_family() => {
                numeric::float_schema(float_payload(payload, qualified)?, strict)
            }
            TypeKind::String => text::string_schema(string_payload(payload, qualified)?),
            TypeKind::Bytes => text::bytes_schema(bytes_payload(payload, qualified)?),
            TypeKind::Enum => {
                let type_name = type_name(field, qualified)?;
                if type_name == "google.protobuf.NullValue" {
                    json!({ "type": "null" })
                } else {
                    let enumeration = pool.enum_type(type_name).ok_or_else(|| {
                        GenerateError::UnresolvedType {
                            type_name: type_name.to_string(),
                            referrer: qualified.to_string(),
                        }
                    })?;
                    let context = EnumFieldContext {
                        top_level_scalar,
                        required,
                    };
                    enums::enum_schema(
                        enumeration,
                        enum_payload(payload, qualified)?,
                        context,
                        &self.options,
                    )
                }
            }
            TypeKind::Message => {
                let type_name = type_name(field, qualified)?;
                let identifier = self.resolve_message(type_name, qualified)?;
                if !refs.iter().any(|r| r == type_name) {
                    refs.push(type_name.to_string());
                }
                let reference = if self.options.bundle {
                    format!("#/$defs/{identifier}")
                } else {
                    identifier
                };
                json!({ "$ref": reference })
            }
            TypeKind::Group => {
                return Err(GenerateError::UnsupportedKind {
                    field: qualified.to_string(),
                    kind: "group",
                })
            }
            kind => {
                return Err(GenerateError::UnsupportedKind {
                    field: qualified.to_string(),
                    kind: kind.wire_name(),
                })
            }
        };
        Ok(schema)
    }

    fn build_map(
        &mut self,
        schema: &mut Map<String, Value>,
        map_info: &MapInfo,
        map_rule: Option<&MapRule>,
        qualified: &str,
        refs: &mut Vec<String>,
    ) -> Result<(), GenerateError> {
        schema.insert("type".into(), json!("object"));
        let key_rule = map_rule.and_then(|m| m.keys.as_deref());
        let property_names = self.map_key_schema(&map_info.key, key_rule, qualified, refs)?;
        schema.insert("propertyNames".into(), property_names);
        let value_rule = map_rule.and_then(|m| m.values.as_deref());
        let value_schema = self.build_value(&map_info.value, value_rule, false, qualified, refs)?;
        schema.insert("additionalProperties".into(), value_schema);
        if let Some(map_rule) = map_rule {
            if let Some(min) = map_rule.min_pairs {
                schema.insert("minProperties".into(), json!(min));
            }
            if let Some(max) = map_rule.max_pairs {
                schema.insert("maxProperties".into(), json!(max));
            }
        }
        Ok(())
    }

    /// JSON object keys are strings, whatever the protobuf key kind, so
    /// non-string keys constrain the key *shape* via a pattern.
    fn map_key_schema(
        &mut self,
        key: &FieldDescriptor,
        rule: Option<&FieldRule>,
        qualified: &str,
        refs: &mut Vec<String>,
    ) -> Result<Value, GenerateError> {
        match key.kind {
            TypeKind::String => self.build_value(key, rule, false, qualified, refs),
            TypeKind::Bool => Ok(json!({ "pattern": "^(true|false)$" })),
            kind if kind.is_int32_family() || kind.is_int64_family() => {
                Ok(json!({ "pattern": numeric::SIGNED_DIGITS_PATTERN }))
            }
            kind if kind.is_uint32_family() || kind.is_uint64_family() => {
                Ok(json!({ "pattern": numeric::UNSIGNED_DIGITS_PATTERN }))
            }
            kind => Err(GenerateError::UnsupportedKind {
                field: qualified.to_string(),
                kind: kind.wire_name(),
            }),
        }
    }

    /// The kind's zero value, used as the implicit default. Message kinds
    /// track presence, so they never carry one.
    fn zero_value(
        &self,
        field: &FieldDescriptor,
        qualified: &str,
    ) -> Result<Option<Value>, GenerateError> {
        let zero = match field.kind {
            TypeKind::Bool => Some(json!(false)),
            TypeKind::String | TypeKind::Bytes => Some(json!("")),
            kind if kind.is_int32_family()
                || kind.is_int64_family()
                || kind.is_uint32_family()
                || kind.is_uint64_family()
                || kind.is_float_family() =>
            {
                Some(json!(0))
            }
            TypeKind::Enum => {
                let type_name = type_name(field, qualified)?;
                if type_name == "google.protobuf.NullValue" {
                    Some(Value::Null)
                } else {
                    let enumeration = self.pool.enum_type(type_name).ok_or_else(|| {
                        GenerateError::UnresolvedType {
                            type_name: type_name.to_string(),
                            referrer: qualified.to_string(),
                        }
                    })?;
                    enumeration.values.first().map(|v| json!(v.name))
                }
            }
            _ => None,
        };
        Ok(zero)
    }
}

fn type_name<'f>(field: &'f FieldDescriptor, qualified: &str) -> Result<&'f str, GenerateError> {
    field
        .type_name
        .as_deref()
        .ok_or_else(|| GenerateError::invariant(qualified, "field is missing its type name"))
}

fn merge(schema: &mut Map<String, Value>, value: Value, qualified: &str) -> Result<(), GenerateError> {
    match value {
        Value::Object(map) => {
            schema.extend(map);
            Ok(())
        }
        _ => Err(GenerateError::invariant(
            qualified,
            "kind builder produced a non-object fragment",
        )),
    }
}

fn mismatch(qualified: &str) -> GenerateError {
    GenerateError::constraint(qualified, "rule payload does not match the field kind")
}

fn bool_payload<'r>(
    payload: Option<&'r ValueRule>,
    qualified: &str,
) -> Result<Option<&'r BoolRule>, GenerateError> {
    match payload {
        None => Ok(None),
        Some(ValueRule::Bool(rule)) => Ok(Some(rule)),
        Some(_) => Err(mismatch(qualified)),
    }
}

fn int_payload<'r>(
    payload: Option<&'r ValueRule>,
    qualified: &str,
) -> Result<Option<&'r IntRule>, GenerateError> {
    match payload {
        None => Ok(None),
        Some(ValueRule::Int(rule)) => Ok(Some(rule)),
        Some(_) => Err(mismatch(qualified)),
    }
}

fn uint_payload<'r>(
    payload: Option<&'r ValueRule>,
    qualified: &str,
) -> Result<Option<&'r UintRule>, GenerateError> {
    match payload {
        None => Ok(None),
        Some(ValueRule::Uint(rule)) => Ok(Some(rule)),
        Some(_) => Err(mismatch(qualified)),
    }
}

fn float_payload<'r>(
    payload: Option<&'r ValueRule>,
    qualified: &str,
) -> Result<Option<&'r FloatRule>, GenerateError> {
    match payload {
        None => Ok(None),
        Some(ValueRule::Float(rule)) => Ok(Some(rule)),
        Some(_) => Err(mismatch(qualified)),
    }
}

fn string_payload<'r>(
    payload: Option<&'r ValueRule>,
    qualified: &str,
) -> Result<Option<&'r StringRule>, GenerateError> {
    match payload {
        None => Ok(None),
        Some(ValueRule::Str(rule)) => Ok(Some(rule)),
        Some(_) => Err(mismatch(qualified)),
    }
}

fn bytes_payload<'r>(
    payload: Option<&'r ValueRule>,
    qualified: &str,
) -> Result<Option<&'r BytesRule>, GenerateError> {
    match payload {
        None => Ok(None),
        Some(ValueRule::Bytes(rule)) => Ok(Some(rule)),
        Some(_) => Err(mismatch(qualified)),
    }
}

fn enum_payload<'r>(
    payload: Option<&'r ValueRule>,
    qualified: &str,
) -> Result<Option<&'r EnumRule>, GenerateError> {
    match payload {
        None => Ok(None),
        Some(ValueRule::Enum(rule)) => Ok(Some(rule)),
        Some(_) => Err(mismatch(qualified)),
    }
}
