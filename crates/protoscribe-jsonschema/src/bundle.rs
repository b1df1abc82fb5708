//! Bundler: fold a type's transitive reference closure into one document.

use crate::error::GenerateError;
use crate::generator::{SchemaEntry, SCHEMA_DIALECT};
use crate::naming;
use crate::options::GenerationOptions;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// A self-contained document for one explicitly requested type: `$schema`,
/// the bundle `$id`, a `$ref` to the type's own local definition, and a
/// `$defs` table holding the depth-first transitive closure of its
/// reference graph, keyed by local (non-bundle) identifiers.
pub(crate) fn bundle_document(
    entries: &BTreeMap<String, SchemaEntry>,
    root: &str,
    options: &GenerationOptions,
) -> Result<Value, GenerateError> {
    let root_entry = entries
        .get(root)
        .ok_or_else(|| GenerateError::invariant(root, "bundle root has no schema entry"))?;
    let mut defs = Map::new();
    let mut seen = BTreeSet::new();
    collect(entries, root, &mut defs, &mut seen)?;
    Ok(json!({
        "$schema": SCHEMA_DIALECT,
        "$id": naming::identifier(root, options, true),
        "$ref": format!("#/$defs/{}", root_entry.identifier),
        "$defs": defs,
    }))
}

fn collect(
    entries: &BTreeMap<String, SchemaEntry>,
    type_name: &str,
    defs: &mut Map<String, Value>,
    seen: &mut BTreeSet<String>,
) -> Result<(), GenerateError> {
    if !seen.insert(type_name.to_string()) {
        return Ok(());
    }
    let entry = entries
        .get(type_name)
        .ok_or_else(|| GenerateError::invariant(type_name, "referenced type has no schema entry"))?;
    defs.insert(entry.identifier.clone(), Value::Object(entry.fragment.clone()));
    for reference in &entry.refs {
        collect(entries, reference, defs, seen)?;
    }
    Ok(())
}
