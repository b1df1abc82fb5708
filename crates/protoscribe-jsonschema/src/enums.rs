//! Enum schema builder.
//!
//! Protobuf JSON accepts an enum value as its declared name or its wire
//! number, so the schema is a union of a string-name branch and compacted
//! numeric ranges. Two proto3 wrinkles:
//!
//! - a required enum field must not hold the zero value, so it is removed
//!   from the allowed set outright;
//! - an implicitly-present enum field holding zero is indistinguishable
//!   from an absent one, so the zero name stays *valid* but is emitted as
//!   an equality pattern rather than an `enum` entry, keeping schema-aware
//!   editors from suggesting it.

use crate::naming;
use crate::options::GenerationOptions;
use protoscribe_descriptor::{EnumDescriptor, EnumRule, EnumValueDescriptor};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Field context the zero-value policy depends on.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EnumFieldContext {
    /// A proto3 non-optional, non-list, non-map enum field.
    pub top_level_scalar: bool,
    /// Field-level `required` rule.
    pub required: bool,
}

pub(crate) fn enum_schema(
    enumeration: &EnumDescriptor,
    rule: Option<&EnumRule>,
    context: EnumFieldContext,
    options: &GenerationOptions,
) -> Value {
    let mut allowed: Vec<&EnumValueDescriptor> = enumeration.values.iter().collect();
    let mut restricted = false;
    if let Some(rule) = rule {
        if let Some(value) = rule.const_ {
            allowed.retain(|v| v.number == value);
            restricted = true;
        }
        if !rule.in_.is_empty() {
            let keep: BTreeSet<i32> = rule.in_.iter().copied().collect();
            allowed.retain(|v| keep.contains(&v.number));
            restricted = true;
        }
        if !rule.not_in.is_empty() {
            let drop: BTreeSet<i32> = rule.not_in.iter().copied().collect();
            allowed.retain(|v| !drop.contains(&v.number));
            restricted = true;
        }
        restricted = restricted || rule.defined_only;
    }

    if context.top_level_scalar && context.required {
        allowed.retain(|v| v.number != 0);
    }

    // Wire numbers stay valid for hidden names, so collect them before the
    // zero value is hidden from the name list.
    let numbers: BTreeSet<i32> = allowed.iter().map(|v| v.number).collect();

    let mut hidden_names: Vec<&str> = Vec::new();
    if context.top_level_scalar && !context.required && !options.strict {
        hidden_names = allowed
            .iter()
            .filter(|v| v.number == 0)
            .map(|v| v.name.as_str())
            .collect();
        allowed.retain(|v| v.number != 0);
    }

    let mut names: Vec<&str> = Vec::new();
    for value in &allowed {
        if !names.contains(&value.name.as_str()) {
            names.push(value.name.as_str());
        }
    }

    let mut branches = Vec::new();
    if !names.is_empty() || (hidden_names.is_empty() && options.strict) {
        branches.push(json!({
            "type": "string",
            "enum": names,
            "title": naming::generate_title(&enumeration.name),
        }));
    }
    if !hidden_names.is_empty() {
        branches.push(json!({
            "type": "string",
            "pattern": format!("^({})$", hidden_names.join("|")),
        }));
    }
    if !options.strict {
        if restricted {
            for (min, max) in compact_ranges(&numbers) {
                branches.push(json!({ "type": "integer", "minimum": min, "maximum": max }));
            }
        } else {
            branches.push(json!({
                "type": "integer",
                "minimum": i32::MIN,
                "maximum": i32::MAX,
            }));
        }
    }

    if branches.is_empty() {
        // Everything was excluded; an empty enum matches nothing, which is
        // the faithful rendering of an unsatisfiable rule.
        return json!({ "type": "string", "enum": [] });
    }
    if branches.len() == 1 {
        return branches.remove(0);
    }
    json!({ "anyOf": branches })
}

/// Merge adjacent integers into inclusive ranges.
fn compact_ranges(numbers: &BTreeSet<i32>) -> Vec<(i32, i32)> {
    let mut ranges: Vec<(i32, i32)> = Vec::new();
    for &number in numbers {
        match ranges.last_mut() {
            Some((_, end)) if i64::from(number) - i64::from(*end) == 1 => *end = number,
            _ => ranges.push((number, number)),
        }
    }
    ranges
}
