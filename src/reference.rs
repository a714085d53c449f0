//! `$ref` name extraction
//!
//! Only local component references are shortened. Anything else (external
//! files, URLs, malformed pointers) passes through verbatim.

/// Prefix of a local component schema reference
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Extract the bare schema name from a `$ref` string.
///
/// `#/components/schemas/Pet` becomes `Pet`. The suffix is not split any
/// further, so `#/components/schemas/Order/Item` yields `Order/Item`.
pub fn resolve_ref(reference: &str) -> &str {
    reference.strip_prefix(SCHEMA_REF_PREFIX).unwrap_or(reference)
}
