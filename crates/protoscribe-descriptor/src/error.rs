use thiserror::Error;

/// Errors raised while loading or resolving a descriptor set.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to parse descriptor set JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("field `{field}` has unknown wire type `{wire_type}`")]
    UnknownFieldType { field: String, wire_type: String },

    #[error("field `{field}` of kind {kind} is missing a type name")]
    MissingTypeName { field: String, kind: &'static str },

    #[error("field `{field}`: malformed `{key}` option: {detail}")]
    MalformedRule {
        field: String,
        key: &'static str,
        detail: String,
    },

    #[error("map entry `{entry}` referenced by `{field}` does not have key/value fields 1 and 2")]
    MalformedMapEntry { entry: String, field: String },
}
