//! Engine options.
//!
//! Loaded from JSON by the CLI; every field has a default so partial
//! documents work.

use serde::{Deserialize, Serialize};
use templar_resolve::CompileOptions;
use templar_runtime::{NumberFormat, TypeRegistry};

/// Hard limit on `render_until_stable` passes.
pub const MAX_PASSES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Unresolved names are errors instead of empty text.
    pub strict: bool,

    pub case_sensitive: bool,

    /// `#if`/`#elif` predicates treat unresolved names as empty even when
    /// `strict` is set.
    pub lenient_predicates: bool,

    /// Namespaces searched for dotted names, ahead of any `#using`.
    pub implied_namespaces: Vec<String>,

    /// Number format pinned while a template renders.
    pub number_format: NumberFormat,

    /// Pass cap for `render_until_stable`; values above [`MAX_PASSES`] are
    /// clamped.
    pub max_passes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strict: false,
            case_sensitive: true,
            lenient_predicates: true,
            implied_namespaces: Vec::new(),
            number_format: NumberFormat::default(),
            max_passes: MAX_PASSES,
        }
    }
}

impl Options {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Effective pass cap, between 1 and [`MAX_PASSES`].
    pub fn passes(&self) -> usize {
        self.max_passes.clamp(1, MAX_PASSES)
    }

    pub(crate) fn compile_options(&self, types: &TypeRegistry) -> CompileOptions {
        CompileOptions {
            strict: self.strict,
            case_sensitive: self.case_sensitive,
            implied_namespaces: self.implied_namespaces.clone(),
            types: types.clone(),
        }
    }
}
