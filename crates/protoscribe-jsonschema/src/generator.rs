//! Reference graph and memoizer.
//!
//! One [`SchemaEntry`] per distinct message type, keyed by fully-qualified
//! name. An entry is registered *before* its fragment is generated, which
//! is what terminates the walk on cyclic message graphs (self-referential
//! and mutually-referential types are common in protobuf schemas). The
//! `added` flag tracks explicit requests independently of entry existence:
//! a type may first appear as a dependency and be requested later, or the
//! other way around.

use crate::bundle;
use crate::error::GenerateError;
use crate::naming;
use crate::options::GenerationOptions;
use crate::resolver::{ConstraintResolver, DescriptorRules};
use crate::wkt::{self, WktBuilder};
use protoscribe_descriptor::DescriptorPool;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// The JSON Schema dialect every document declares.
pub const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Per-message-type record in the memo table.
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    /// Deterministic document identifier (non-bundle form).
    pub identifier: String,
    /// Fully-qualified source type name.
    pub type_name: String,
    /// The schema fragment for this type.
    pub fragment: Map<String, Value>,
    /// Message types this fragment references, in first-encounter order.
    pub refs: Vec<String>,
    /// Whether the type was explicitly requested (vs. pulled in
    /// transitively).
    pub added: bool,
}

/// Schema generation engine, bound to one options value for its lifetime.
pub struct Generator<'p> {
    pub(crate) pool: &'p DescriptorPool,
    pub(crate) options: GenerationOptions,
    pub(crate) resolver: Box<dyn ConstraintResolver + 'p>,
    custom: BTreeMap<&'static str, WktBuilder<'p>>,
    entries: BTreeMap<String, SchemaEntry>,
}

impl<'p> Generator<'p> {
    pub fn new(pool: &'p DescriptorPool, options: GenerationOptions) -> Self {
        Self {
            pool,
            options,
            resolver: Box::new(DescriptorRules),
            custom: wkt::builtin(),
            entries: BTreeMap::new(),
        }
    }

    /// Substitute the constraint-resolution capability.
    pub fn with_resolver(mut self, resolver: impl ConstraintResolver + 'p) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Substitute the well-known-type fragment table.
    pub fn with_custom_types(mut self, custom: BTreeMap<&'static str, WktBuilder<'p>>) -> Self {
        self.custom = custom;
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn entries(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.values()
    }

    pub fn entry(&self, type_name: &str) -> Option<&SchemaEntry> {
        self.entries.get(type_name)
    }

    /// Explicitly request a type. Its schema (and every schema it
    /// transitively references) is generated if it has not been already.
    pub fn add(&mut self, type_name: &str) -> Result<(), GenerateError> {
        debug!(type_name, "adding schema root");
        self.resolve_message(type_name, "<root>")?;
        let entry = self
            .entries
            .get_mut(type_name)
            .ok_or_else(|| GenerateError::invariant(type_name, "entry missing after resolution"))?;
        entry.added = true;
        Ok(())
    }

    /// Resolve a message type to its schema entry, generating it on first
    /// sight, and return its (non-bundle) identifier.
    pub(crate) fn resolve_message(
        &mut self,
        full_name: &str,
        referrer: &str,
    ) -> Result<String, GenerateError> {
        if let Some(entry) = self.entries.get(full_name) {
            return Ok(entry.identifier.clone());
        }
        let identifier = naming::identifier(full_name, &self.options, false);
        self.entries.insert(
            full_name.to_string(),
            SchemaEntry {
                identifier: identifier.clone(),
                type_name: full_name.to_string(),
                fragment: Map::new(),
                refs: Vec::new(),
                added: false,
            },
        );

        let short_name = full_name.rsplit('.').next().unwrap_or(full_name);
        let mut fragment = Map::new();
        fragment.insert("$id".into(), json!(identifier));
        fragment.insert("title".into(), json!(naming::generate_title(short_name)));

        let pool = self.pool;
        let refs = if let Some(builder) = self.custom.get(full_name).copied() {
            fragment.extend(builder(self)?);
            Vec::new()
        } else {
            let message =
                pool.message(full_name)
                    .ok_or_else(|| GenerateError::UnresolvedType {
                        type_name: full_name.to_string(),
                        referrer: referrer.to_string(),
                    })?;
            self.build_message(message, &mut fragment)?
        };

        let entry = self
            .entries
            .get_mut(full_name)
            .ok_or_else(|| GenerateError::invariant(full_name, "entry vanished during generation"))?;
        entry.fragment = fragment;
        entry.refs = refs;
        Ok(identifier)
    }

    /// Publish the generated documents, keyed by fully-qualified type name.
    ///
    /// Bundle mode publishes one self-contained document per explicitly
    /// requested type; split mode publishes a standalone document for every
    /// entry, so that cross-document `$ref`s resolve within the run.
    pub fn finish(self) -> Result<BTreeMap<String, Value>, GenerateError> {
        let mut documents = BTreeMap::new();
        if self.options.bundle {
            for (type_name, entry) in &self.entries {
                if !entry.added {
                    continue;
                }
                let document = bundle::bundle_document(&self.entries, type_name, &self.options)?;
                documents.insert(type_name.clone(), document);
            }
        } else {
            for (type_name, entry) in &self.entries {
                let mut document = Map::new();
                document.insert("$schema".into(), json!(SCHEMA_DIALECT));
                document.extend(entry.fragment.clone());
                documents.insert(type_name.clone(), Value::Object(document));
            }
        }
        debug!(documents = documents.len(), "generation finished");
        Ok(documents)
    }
}
