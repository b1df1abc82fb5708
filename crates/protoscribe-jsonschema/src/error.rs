use protoscribe_descriptor::DescriptorError;
use thiserror::Error;

/// Errors raised during schema generation.
///
/// All of these are fatal to the generation request that triggered them:
/// a half-built schema could be silently wrong, so there is no
/// partial-document recovery. Each variant carries the fully-qualified
/// name of the offending type or field.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("type `{type_name}` referenced by `{referrer}` was not found in the descriptor pool")]
    UnresolvedType { type_name: String, referrer: String },

    #[error("constraint on `{field}` could not be resolved: {detail}")]
    Constraint { field: String, detail: String },

    #[error("oneof `{oneof}` in `{message}` references no known fields")]
    MalformedOneof { message: String, oneof: String },

    #[error("field `{field}` has unsupported kind `{kind}`")]
    UnsupportedKind { field: String, kind: &'static str },

    #[error("internal invariant violated for `{type_name}`: {detail}")]
    Invariant { type_name: String, detail: String },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

impl GenerateError {
    pub(crate) fn invariant(type_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Invariant {
            type_name: type_name.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn constraint(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Constraint {
            field: field.into(),
            detail: detail.into(),
        }
    }
}
