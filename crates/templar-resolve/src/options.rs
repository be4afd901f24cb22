//! Options for expression compilation.

use templar_runtime::TypeRegistry;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Unresolved names are compile errors rather than empty text.
    pub strict: bool,
    pub case_sensitive: bool,
    /// Namespaces searched for dotted names that resolve nowhere else.
    pub implied_namespaces: Vec<String>,
    /// Types addressable by full name in expressions.
    pub types: TypeRegistry,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict: false,
            case_sensitive: true,
            implied_namespaces: Vec::new(),
            types: TypeRegistry::new(),
        }
    }
}
