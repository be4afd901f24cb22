//! Render entry points.

use crate::compiler::Compiler;
use crate::error::Result;
use crate::options::Options;
use crate::registry::Registry;
use crate::scan::MARKER;
use crate::template::Template;
use std::fmt;
use std::sync::Arc;
use templar_ast::SourceFile;
use templar_resolve::{NameResolver, ResolverChain};
use templar_runtime::{RenderError, TypeRegistry, Value, ValueKind};
use tracing::{debug, instrument};

/// What the host wants after seeing a `#pragma`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PragmaOutcome {
    Continue,
    /// End rendering of the current template; output so far is kept.
    Stop,
}

/// Host callback for pragmas the engine does not handle itself.
pub trait PragmaHandler: Send + Sync {
    fn pragma(&self, text: &str) -> PragmaOutcome;
}

impl<F> PragmaHandler for F
where
    F: Fn(&str) -> PragmaOutcome + Send + Sync,
{
    fn pragma(&self, text: &str) -> PragmaOutcome {
        self(text)
    }
}

/// Compiles and renders templates with one configuration.
///
/// # Examples
///
/// ```
/// use templar::{Engine, Record, Value};
///
/// let context = Value::object(Record::new().with("name", "Ada"));
/// let out = Engine::new().render("Hello $$name$$!", &context).unwrap();
/// assert_eq!(out, "Hello Ada!");
/// ```
#[derive(Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    options: Options,
    resolvers: ResolverChain,
    types: TypeRegistry,
    pragma: Option<Arc<dyn PragmaHandler>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("pragma", &self.pragma.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with the built-in directives and default options.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::standard()),
            options: Options::default(),
            resolvers: ResolverChain::new(),
            types: TypeRegistry::new(),
            pragma: None,
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Add a name resolver ahead of the default member lookup.
    pub fn with_resolver(mut self, resolver: impl NameResolver + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    /// Types addressable by full name in expressions.
    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    pub fn with_pragma_handler(mut self, handler: impl PragmaHandler + 'static) -> Self {
        self.pragma = Some(Arc::new(handler));
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Compile a template whose context is only known at render time.
    #[instrument(skip_all)]
    pub fn parse(&self, source: &str) -> Result<Template> {
        self.parse_for(source, ValueKind::Any)
    }

    /// Compile a template for contexts of `context` kind, resolving
    /// members statically where the kind allows it.
    #[instrument(skip_all)]
    pub fn parse_for(&self, source: &str, context: ValueKind) -> Result<Template> {
        let compile_options = self.options.compile_options(&self.types);
        let compiler = Compiler::new(
            source,
            &self.registry,
            &self.options,
            compile_options,
            &self.resolvers,
            self.pragma.clone(),
            context,
        );
        compiler
            .finish()
            .map_err(|e| e.locate(&SourceFile::new(source.to_string())).into())
    }

    /// Compile and render once.
    #[instrument(skip_all)]
    pub fn render(&self, source: &str, context: &Value) -> Result<String> {
        self.parse_for(source, context.kind())?.render(context)
    }

    /// Render repeatedly, feeding each output back in as the next source,
    /// until no markers remain.
    ///
    /// Fails with [`RenderError::LoopDetected`] once the pass cap is spent.
    /// A `#pragma passes N` lowers the cap; running into a lowered cap ends
    /// quietly with the latest output.
    #[instrument(skip_all)]
    pub fn render_until_stable(&self, source: &str, context: &Value) -> Result<String> {
        let mut text = source.to_string();
        let mut cap = self.options.passes();
        let mut lowered = false;
        let mut passes = 0;

        while text.contains(MARKER) {
            if passes >= cap {
                if lowered {
                    debug!(passes, "pass cap from pragma reached");
                    return Ok(text);
                }
                return Err(RenderError::LoopDetected { passes }.into());
            }
            // Defines from earlier passes may have added context variables.
            let template = self.parse_for(&text, context.kind())?;
            let mut out = String::new();
            let pass = template.invoke(context, &mut out)?;
            passes += 1;
            debug!(pass = passes, len = out.len(), "render pass");

            if let Some(requested) = pass.pass_cap
                && requested < cap
            {
                cap = requested;
                lowered = true;
            }
            text = out;
            if pass.stopped {
                break;
            }
        }
        Ok(text)
    }
}

fn engine(strict: bool) -> Engine {
    let options = if strict { Options::strict() } else { Options::default() };
    Engine::new().with_options(options)
}

/// Render `source` once with the built-in directives.
pub fn render(source: &str, context: &Value, strict: bool) -> Result<String> {
    engine(strict).render(source, context)
}

/// [`Engine::render_until_stable`] with the built-in directives.
pub fn render_until_stable(source: &str, context: &Value, strict: bool) -> Result<String> {
    engine(strict).render_until_stable(source, context)
}
