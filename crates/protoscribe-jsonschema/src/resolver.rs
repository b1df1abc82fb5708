//! Constraint resolution seam.
//!
//! The engine never parses rules itself; it asks a [`ConstraintResolver`]
//! for the effective rule of each field. The default implementation reads
//! the rules the descriptor pool already parsed from
//! `[buf.validate.field]` options, but callers can substitute their own
//! source (a side table, a policy overlay) without touching the engine.

use crate::error::GenerateError;
use protoscribe_descriptor::{FieldDescriptor, FieldRule, Ignore, MessageDescriptor, OneofDescriptor};

pub trait ConstraintResolver {
    /// The effective validation rule for a field, or `None` when validation
    /// is explicitly disabled for it.
    fn field_rule(
        &self,
        message: &MessageDescriptor,
        field: &FieldDescriptor,
    ) -> Result<Option<FieldRule>, GenerateError>;

    /// Whether a oneof carries a `required` rule.
    fn oneof_required(
        &self,
        message: &MessageDescriptor,
        oneof: &OneofDescriptor,
    ) -> Result<bool, GenerateError>;
}

/// Default resolver: rules come from descriptor options.
///
/// A rule marked `ignore = IGNORE_ALWAYS`, or any rule inside a message
/// with `validate.disabled`, resolves to none.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorRules;

impl ConstraintResolver for DescriptorRules {
    fn field_rule(
        &self,
        message: &MessageDescriptor,
        field: &FieldDescriptor,
    ) -> Result<Option<FieldRule>, GenerateError> {
        if message.validation_disabled {
            return Ok(None);
        }
        match &field.rule {
            Some(rule) if rule.ignore == Ignore::Always => Ok(None),
            other => Ok(other.clone()),
        }
    }

    fn oneof_required(
        &self,
        _message: &MessageDescriptor,
        oneof: &OneofDescriptor,
    ) -> Result<bool, GenerateError> {
        Ok(oneof.required)
    }
}
