//! Dependency resolution: cross-reference call-like tokens in a snippet
//! against the method registry.

use lazy_static::lazy_static;
use regex::Regex;

use crate::scan::methods::MethodRegistry;

lazy_static! {
    /// Identifier immediately followed by an opening parenthesis.
    static ref CALL_TOKEN: Regex = Regex::new(r"(\w+)\s*\(").unwrap();
}

/// Resolve call-like tokens in `snippet` against the registry.
///
/// Matching is substring containment on qualified names, tuned for recall
/// over precision: `valida(` hits both `valida_cnpj` and `Empresa.valida`.
/// Each hit is rendered as `qualified_name (file:line)`; duplicates are kept.
pub fn resolve_dependencies(snippet: &str, registry: &MethodRegistry) -> Vec<String> {
    let mut references = Vec::new();
    for caps in CALL_TOKEN.captures_iter(snippet) {
        let call = &caps[1];
        for (qualified_name, record) in registry.iter() {
            if qualified_name.contains(call) {
                references.push(format!(
                    "{} ({}:{})",
                    qualified_name, record.file, record.line
                ));
            }
        }
    }
    references
}
