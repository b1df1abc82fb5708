//! Descriptor-to-JSON-Schema projection engine.
//!
//! Given a resolved [`DescriptorPool`] and one [`GenerationOptions`] value,
//! a [`Generator`] projects requested message types into JSON Schema
//! 2020-12 documents that encode protobuf's JSON wire rules plus any
//! `buf.validate` constraints: numeric representability windows, implicit
//! defaults under field presence, oneof exclusivity, proto/JSON name
//! aliasing, and cross-reference bundling.
//!
//! Generation is a pure, synchronous recursion over the immutable pool
//! with one memo table per generator; instances with distinct options run
//! concurrently over a shared pool with no locking.
//!
//! ```no_run
//! use protoscribe_descriptor::DescriptorPool;
//! use protoscribe_jsonschema::{generate, GenerationOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DescriptorPool::from_json_str(&std::fs::read_to_string("descriptor.json")?)?;
//! let documents = generate(&pool, GenerationOptions::default(), &["shop.v1.Order"])?;
//! for (type_name, document) in &documents {
//!     println!("{type_name}: {}", document["$id"]);
//! }
//! # Ok(())
//! # }
//! ```

pub mod naming;
pub mod options;
pub mod resolver;
pub mod wkt;

mod bundle;
mod enums;
mod error;
mod field;
mod generator;
mod message;
mod numeric;
mod text;

pub use error::GenerateError;
pub use generator::{Generator, SchemaEntry, SCHEMA_DIALECT};
pub use options::GenerationOptions;
pub use resolver::{ConstraintResolver, DescriptorRules};

pub use protoscribe_descriptor::DescriptorPool;

use serde_json::Value;
use std::collections::BTreeMap;

/// One-shot generation: request `roots`, publish the resulting documents
/// keyed by fully-qualified type name.
pub fn generate(
    pool: &DescriptorPool,
    options: GenerationOptions,
    roots: &[&str],
) -> Result<BTreeMap<String, Value>, GenerateError> {
    let mut generator = Generator::new(pool, options);
    for root in roots {
        generator.add(root)?;
    }
    generator.finish()
}
