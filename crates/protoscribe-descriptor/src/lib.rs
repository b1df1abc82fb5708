//! Resolved protobuf descriptors from Buf descriptor sets.
//!
//! This crate is intentionally **descriptor-driven**:
//!
//! - The caller runs `buf build --as-file-descriptor-set -o <descriptor.json>`
//! - We parse the descriptor set JSON into a small typed subset (`wire`)
//! - We resolve it into an immutable [`pool::DescriptorPool`]: fully-qualified
//!   names, field kinds, list/map structure, presence, comments, and the
//!   `buf.validate` rules attached through descriptor options (`rules`)
//!
//! Why JSON?
//!
//! The binary `google.protobuf.FileDescriptorSet` format is easy to decode,
//! but custom options (such as `(buf.validate.field)`) are encoded as
//! extensions, and decoding those in Rust requires a reflective,
//! extension-aware protobuf stack. Buf's JSON output renders extension fields
//! explicitly, using keys like:
//!
//! ```json
//! { "[buf.validate.field]": { "string": { "minLen": "1" } } }
//! ```
//!
//! which makes rule-driven schema generation practical without a protobuf
//! runtime dependency.

pub mod pool;
pub mod rules;
pub mod wire;

mod error;

pub use error::DescriptorError;
pub use pool::{
    DescriptorPool, EnumDescriptor, EnumValueDescriptor, FieldDescriptor, MapInfo,
    MessageDescriptor, OneofDescriptor, TypeKind, Visibility,
};
pub use rules::{
    BoolRule, BytesRule, EnumRule, FieldRule, FloatRule, Ignore, IntRule, MapRule, RepeatedRule,
    StringRule, UintRule, ValueRule, WellKnownFormat,
};
