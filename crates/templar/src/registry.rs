//! Directive contract and registry.
//!
//! A [`Registry`] maps directive names to implementations. It is built once
//! through [`RegistryBuilder`], which rejects duplicate names and control
//! words that collide with a directive name or with another directive's
//! control words, and is immutable afterwards.

use crate::compiler::Compiler;
use crate::directives;
use crate::scan::{Section, Tag};
use crate::template::Step;
use indexmap::IndexMap;
use std::sync::Arc;
use templar_ast::{CompileError, CompileResult, ErrorKind, Span};

/// Control words any directive may use without owning them.
pub const SHARED_WORDS: &[&str] = &["else"];

/// How a directive's body is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRule {
    /// The tag stands alone.
    None,
    /// Body is template text, scanned for nested directives and control
    /// words, closed by `$$/name$$`.
    Nested,
    /// Body is raw text up to `$$/name$$`.
    Verbatim,
}

/// A directive occurrence handed to [`Directive::compile`].
#[derive(Debug, Clone)]
pub struct Invocation<'s> {
    pub tag: Tag<'s>,
    /// Body sections, `None` when the body rule is [`BodyRule::None`].
    pub body: Option<Vec<Section<'s>>>,
}

impl<'s> Invocation<'s> {
    pub fn name(&self) -> &'s str {
        self.tag.name
    }

    pub fn args(&self) -> &'s str {
        self.tag.args
    }

    pub fn args_span(&self) -> Span {
        self.tag.args_span
    }

    pub fn sections(&self) -> &[Section<'s>] {
        self.body.as_deref().unwrap_or_default()
    }

    /// `Syntax` error at the tag.
    pub fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(ErrorKind::Syntax, self.tag.span, message.into())
    }

    /// Reject arguments on a directive that takes none.
    pub fn expect_no_args(&self) -> CompileResult<()> {
        if self.args().is_empty() {
            Ok(())
        } else {
            Err(CompileError::new(
                ErrorKind::Syntax,
                self.args_span(),
                format!("'#{}' takes no arguments", self.name()),
            ))
        }
    }
}

/// A pluggable grammar extension.
pub trait Directive: Send + Sync {
    fn name(&self) -> &str;

    /// Words that split this directive's body into sections.
    fn reserved_words(&self) -> &[&'static str] {
        &[]
    }

    fn body(&self, args: &str) -> BodyRule;

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step>;
}

#[derive(Clone, Default)]
pub struct Registry {
    directives: IndexMap<String, Arc<dyn Directive>>,
    /// Control word -> owning directive (shared words are not recorded).
    words: IndexMap<&'static str, String>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("directives", &self.directives.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Builder preloaded with the built-in directives.
    pub fn standard_builder() -> RegistryBuilder {
        directives::builtin()
            .into_iter()
            .fold(RegistryBuilder::default(), |builder, d| builder.insert(d))
    }

    /// The built-in directives.
    pub fn standard() -> Registry {
        Self::standard_builder().build()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Directive> {
        self.directives.get(name).map(|d| d.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.directives.keys().map(String::as_str)
    }

    /// Whether `word` is a control word of some directive.
    pub fn is_control_word(&self, word: &str) -> bool {
        SHARED_WORDS.contains(&word) || self.words.contains_key(word)
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

fn registration(message: String) -> CompileError {
    CompileError::new(ErrorKind::Registration, Span::default(), message)
}

impl RegistryBuilder {
    /// Add a directive, checking it against everything registered so far.
    pub fn register(self, directive: impl Directive + 'static) -> CompileResult<Self> {
        self.register_arc(Arc::new(directive))
    }

    pub fn register_arc(self, directive: Arc<dyn Directive>) -> CompileResult<Self> {
        let name = directive.name();
        let registry = &self.registry;
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(registration(format!("invalid directive name '{}'", name)));
        }
        if registry.directives.contains_key(name) {
            return Err(registration(format!("directive '#{}' is already registered", name)));
        }
        if SHARED_WORDS.contains(&name) {
            return Err(registration(format!("'{}' is a reserved control word", name)));
        }
        if let Some(owner) = registry.words.get(name) {
            return Err(registration(format!(
                "directive '#{}' collides with a control word of '#{}'",
                name, owner
            )));
        }
        for word in directive.reserved_words() {
            if SHARED_WORDS.contains(word) {
                continue;
            }
            if *word == name || registry.directives.contains_key(*word) {
                return Err(registration(format!(
                    "control word '{}' of '#{}' collides with directive '#{}'",
                    word, name, word
                )));
            }
            if let Some(owner) = registry.words.get(word) {
                return Err(registration(format!(
                    "control word '{}' of '#{}' is already used by '#{}'",
                    word, name, owner
                )));
            }
        }
        Ok(self.insert(directive))
    }

    fn insert(mut self, directive: Arc<dyn Directive>) -> Self {
        let name = directive.name().to_string();
        for word in directive.reserved_words() {
            if !SHARED_WORDS.contains(word) {
                self.registry.words.insert(*word, name.clone());
            }
        }
        self.registry.directives.insert(name, directive);
        self
    }

    pub fn build(self) -> Registry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub {
        name: &'static str,
        words: &'static [&'static str],
    }

    impl Directive for Stub {
        fn name(&self) -> &str {
            self.name
        }

        fn reserved_words(&self) -> &[&'static str] {
            self.words
        }

        fn body(&self, _args: &str) -> BodyRule {
            BodyRule::None
        }

        fn compile(&self, _cx: &mut Compiler<'_>, _invocation: &Invocation<'_>) -> CompileResult<Step> {
            Ok(Step::Literal(String::new()))
        }
    }

    fn stub(name: &'static str, words: &'static [&'static str]) -> Stub {
        Stub { name, words }
    }

    #[test]
    fn test_standard_registry() {
        let registry = Registry::standard();
        for name in ["if", "each", "block", "let", "define", "undef", "literal", "comment", "assert", "error", "pragma", "using"] {
            assert!(registry.contains(name), "missing #{}", name);
        }
        assert!(registry.is_control_word("elif"));
        assert!(registry.is_control_word("else"));
        assert!(registry.is_control_word("out"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = Registry::standard_builder().register(stub("if", &[])).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Registration);
        assert!(err.message.contains("already registered"));
    }

    #[test]
    fn test_word_colliding_with_name_rejected() {
        let err = Registry::builder()
            .register(stub("loop", &[]))
            .unwrap()
            .register(stub("switch", &["loop"]))
            .err()
            .unwrap();
        assert!(err.message.contains("collides with directive '#loop'"));

        let err = Registry::standard_builder().register(stub("elif", &[])).err().unwrap();
        assert!(err.message.contains("control word of '#if'"));
    }

    #[test]
    fn test_words_shared_only_when_allowed() {
        let err = Registry::standard_builder()
            .register(stub("switch", &["out"]))
            .err()
            .unwrap();
        assert!(err.message.contains("already used by '#define'"));

        let ok = Registry::standard_builder().register(stub("switch", &["case", "else"]));
        assert!(ok.is_ok());
        assert!(Registry::builder().register(stub("else", &[])).is_err());
    }
}
