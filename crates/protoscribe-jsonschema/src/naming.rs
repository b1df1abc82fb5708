//! Naming policy: document identifiers, property names and aliases, titles.

use crate::options::GenerationOptions;
use protoscribe_descriptor::{FieldDescriptor, Visibility};

/// Deterministic document identifier for a type under the given options.
///
/// Suffix chain: `.jsonschema` (JSON-name mode) or `.schema` (proto-name
/// mode), then `.strict`, then `.bundle` for bundle-root identifiers,
/// then `.json`.
pub fn identifier(full_name: &str, options: &GenerationOptions, bundle_root: bool) -> String {
    let mut id = String::from(full_name);
    id.push_str(if options.use_json_names {
        ".jsonschema"
    } else {
        ".schema"
    });
    if options.strict {
        id.push_str(".strict");
    }
    if bundle_root {
        id.push_str(".bundle");
    }
    id.push_str(".json");
    id
}

/// Primary property name and alias names for a field.
///
/// The non-primary spelling becomes an alias unless it matches the primary.
/// Strict mode suppresses aliases entirely, which also drops hidden fields
/// (they are reachable only through aliases).
pub fn property_names(
    field: &FieldDescriptor,
    options: &GenerationOptions,
) -> (Option<String>, Vec<String>) {
    match field.visibility {
        Visibility::Ignored => (None, Vec::new()),
        Visibility::Hidden => {
            if options.strict {
                return (None, Vec::new());
            }
            let mut aliases = vec![field.name.clone()];
            if field.json_name != field.name {
                aliases.push(field.json_name.clone());
            }
            (None, aliases)
        }
        Visibility::Visible => {
            let (primary, alias) = if options.use_json_names {
                (&field.json_name, &field.name)
            } else {
                (&field.name, &field.json_name)
            };
            let aliases = if options.strict || alias == primary {
                Vec::new()
            } else {
                vec![alias.clone()]
            };
            (Some(primary.clone()), aliases)
        }
    }
}

/// Convert a PascalCase/camelCase identifier into space-separated words.
///
/// A space is inserted before an uppercase letter that is preceded by a
/// lowercase letter or followed by one; acronym runs stay joined
/// (`UInt64Value` -> "U Int64 Value", `FOOBar` -> "FOO Bar").
pub fn generate_title(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut title = String::with_capacity(name.len() + 4);
    for (i, &chr) in chars.iter().enumerate() {
        if i > 0 && chr.is_uppercase() {
            let prev_lower = chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev_lower || next_lower {
                title.push(' ');
            }
        }
        title.push(chr);
    }
    title
}

/// Split a leading comment into a title override and a description.
///
/// The first blank line separates the two; without one, the whole comment
/// is the description and the caller keeps its default title.
pub fn split_comment(comment: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(comment) = comment else {
        return (None, None);
    };
    let text = comment.trim();
    if text.is_empty() {
        return (None, None);
    }
    let mut first = Vec::new();
    let mut rest = Vec::new();
    let mut in_rest = false;
    for line in text.lines() {
        if in_rest {
            rest.push(line);
        } else if line.trim().is_empty() {
            in_rest = true;
        } else {
            first.push(line);
        }
    }
    if !in_rest {
        return (None, Some(text.to_string()));
    }
    let title = first.join("\n").trim().to_string();
    let description = rest.join("\n").trim().to_string();
    (
        (!title.is_empty()).then_some(title),
        (!description.is_empty()).then_some(description),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_split_camel_case_words() {
        assert_eq!(generate_title("Foo"), "Foo");
        assert_eq!(generate_title("FooBar"), "Foo Bar");
        assert_eq!(generate_title("fooBar"), "foo Bar");
        assert_eq!(generate_title("FooBarBaz"), "Foo Bar Baz");
        assert_eq!(generate_title("FOOBar"), "FOO Bar");
        assert_eq!(generate_title("UInt64Value"), "U Int64 Value");
        assert_eq!(generate_title("Uint64Value"), "Uint64 Value");
        assert_eq!(generate_title("FOO"), "FOO");
    }

    #[test]
    fn comment_without_blank_line_is_description_only() {
        let (title, description) = split_comment(Some("Just one paragraph\nof text."));
        assert_eq!(title, None);
        assert_eq!(description.as_deref(), Some("Just one paragraph\nof text."));
    }

    #[test]
    fn comment_with_blank_line_overrides_title() {
        let (title, description) = split_comment(Some("Short title\n\nLonger body\nhere."));
        assert_eq!(title.as_deref(), Some("Short title"));
        assert_eq!(description.as_deref(), Some("Longer body\nhere."));
    }
}
