//! Message schema builder.
//!
//! Emits the `type: object` fragment for a message: per-field schemas
//! partitioned into primary `properties` and alias `patternProperties`,
//! the `required` list, and oneof exclusivity folded into `allOf`.

use crate::error::GenerateError;
use crate::generator::Generator;
use crate::naming;
use protoscribe_descriptor::{MessageDescriptor, Visibility};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

impl<'p> Generator<'p> {
    /// Build the fragment for a message into `fragment` and return the
    /// message types it references.
    pub(crate) fn build_message(
        &mut self,
        message: &MessageDescriptor,
        fragment: &mut Map<String, Value>,
    ) -> Result<Vec<String>, GenerateError> {
        fragment.insert("type".into(), json!("object"));
        let (title, description) = naming::split_comment(message.comment.as_deref());
        if let Some(title) = title {
            fragment.insert("title".into(), json!(title));
        }
        if let Some(description) = description {
            fragment.insert("description".into(), json!(description));
        }

        let mut refs = Vec::new();
        let mut properties = Map::new();
        let mut pattern_properties = Map::new();
        let mut required: Vec<String> = Vec::new();
        // Proto field name -> primary property name, for oneof handling.
        let mut primaries: BTreeMap<String, String> = BTreeMap::new();

        for field in &message.fields {
            if field.visibility == Visibility::Ignored {
                continue;
            }
            let rule = self.resolver.field_rule(message, field)?;
            let schema = self.build_field(message, field, rule.as_ref(), &mut refs)?;
            let (primary, aliases) = naming::property_names(field, &self.options);

            if let Some(primary) = primary {
                let rule_required = rule.as_ref().is_some_and(|r| r.required);
                let implicit_default = !field.explicit_presence && !rule_required;
                if rule_required || (self.options.strict && implicit_default) {
                    required.push(primary.clone());
                }
                primaries.insert(field.name.clone(), primary.clone());
                properties.insert(primary, schema.clone());
            }
            if !aliases.is_empty() {
                let pattern = format!("^({})$", aliases.join("|"));
                pattern_properties.insert(pattern, schema);
            }
        }

        let mut all_of: Vec<Value> = Vec::new();
        for (index, oneof) in message.oneofs.iter().enumerate() {
            if oneof.synthetic {
                continue;
            }
            let declared: Vec<&str> = message
                .fields
                .iter()
                .filter(|f| f.oneof_index == Some(index))
                .map(|f| f.name.as_str())
                .collect();
            if declared.is_empty() {
                return Err(GenerateError::MalformedOneof {
                    message: message.full_name.clone(),
                    oneof: oneof.name.clone(),
                });
            }
            // Members that survived visibility filtering, by primary name.
            let members: Vec<String> = declared
                .iter()
                .filter_map(|name| primaries.get(*name).cloned())
                .collect();
            let oneof_required = self.resolver.oneof_required(message, oneof)?;
            match members.len() {
                0 => {}
                1 => {
                    if oneof_required && !required.contains(&members[0]) {
                        required.push(members[0].clone());
                    }
                }
                _ => {
                    let mut branches: Vec<Value> = members
                        .iter()
                        .map(|member| {
                            let others: Vec<&String> =
                                members.iter().filter(|m| *m != member).collect();
                            json!({
                                "required": [member],
                                "not": absent(&others),
                            })
                        })
                        .collect();
                    if !oneof_required {
                        let all: Vec<&String> = members.iter().collect();
                        branches.push(json!({ "not": absent(&all) }));
                    }
                    all_of.push(json!({ "anyOf": branches }));
                }
            }
        }

        // A required name that is not a property would silently never
        // validate; that is an internal bug, not an input error.
        for name in &required {
            if !properties.contains_key(name) {
                return Err(GenerateError::invariant(
                    &message.full_name,
                    format!("required property `{name}` is absent from the properties table"),
                ));
            }
        }

        fragment.insert("properties".into(), Value::Object(properties));
        fragment.insert(
            "additionalProperties".into(),
            json!(self.options.allow_additional_properties),
        );
        if !pattern_properties.is_empty() {
            fragment.insert("patternProperties".into(), Value::Object(pattern_properties));
        }
        if !required.is_empty() {
            fragment.insert("required".into(), json!(required));
        }
        if !all_of.is_empty() {
            fragment.insert("allOf".into(), json!(all_of));
        }
        Ok(refs)
    }
}

/// Schema asserting the given properties are (all) absent: the negation of
/// one `required` entry, or of an `anyOf` over several.
fn absent(properties: &[&String]) -> Value {
    if properties.len() == 1 {
        json!({ "required": [properties[0]] })
    } else {
        let branches: Vec<Value> = properties
            .iter()
            .map(|p| json!({ "required": [p] }))
            .collect();
        json!({ "anyOf": branches })
    }
}
