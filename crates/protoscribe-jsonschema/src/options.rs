/// Generation configuration.
///
/// One engine instance is bound to exactly one options value for its
/// lifetime; distinct combinations require distinct instances. The
/// historical eight-variant output set is [`GenerationOptions::all_variants`]
/// run as independent instances over the same pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationOptions {
    /// Use the JSON name as the primary property name (proto name becomes
    /// the alias) instead of the other way around.
    pub use_json_names: bool,
    /// Disallow protobuf's JSON leniencies: name aliases, numbers as
    /// strings, implicit defaults.
    pub strict: bool,
    /// Emit `additionalProperties: true` on message objects.
    pub allow_additional_properties: bool,
    /// Fold each requested type and its transitive dependencies into a
    /// single self-contained document.
    pub bundle: bool,
}

impl GenerationOptions {
    /// The proto/json x lenient/strict x split/bundle matrix.
    pub fn all_variants() -> Vec<Self> {
        let mut variants = Vec::with_capacity(8);
        for use_json_names in [false, true] {
            for strict in [false, true] {
                for bundle in [false, true] {
                    variants.push(Self {
                        use_json_names,
                        strict,
                        allow_additional_properties: false,
                        bundle,
                    });
                }
            }
        }
        variants
    }
}
