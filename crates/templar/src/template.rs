//! Compiled templates.

use crate::error::Result;
use std::fmt;
use std::sync::Arc;
use templar_runtime::coerce::stringify;
use templar_runtime::{Env, Eval, Flow, Halt, NumberFormat, Output, Render, Value, format};
use tracing::debug;

/// One unit of a compiled template body.
#[derive(Clone)]
pub enum Step {
    Literal(String),
    /// Expression whose value is written null-safely as text.
    Expr(Eval),
    /// Compiled directive.
    Run(Render),
}

impl Step {
    /// A step that emits nothing.
    pub fn empty() -> Self {
        Step::Literal(String::new())
    }

    pub fn render<F>(f: F) -> Self
    where
        F: Fn(&mut Env<'_>) -> Flow<()> + Send + Sync + 'static,
    {
        Step::Run(Arc::new(f))
    }

    pub fn run(&self, env: &mut Env<'_>) -> Flow<()> {
        match self {
            Step::Literal(text) => env.write(text),
            Step::Expr(eval) => {
                let value = eval(env)?;
                env.write(&stringify(&value));
            }
            Step::Run(render) => render(env)?,
        }
        Ok(())
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Step::Expr(_) => f.write_str("Expr"),
            Step::Run(_) => f.write_str("Run"),
        }
    }
}

/// Sequence of steps; cloning shares them.
#[derive(Debug, Clone, Default)]
pub struct Body(Arc<[Step]>);

impl Body {
    pub fn new(steps: Vec<Step>) -> Self {
        let steps: Vec<Step> = steps
            .into_iter()
            .filter(|step| !matches!(step, Step::Literal(text) if text.is_empty()))
            .collect();
        Body(steps.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn run(&self, env: &mut Env<'_>) -> Flow<()> {
        self.0.iter().try_for_each(|step| step.run(env))
    }

    /// As a shareable render closure.
    pub fn into_render(self) -> Render {
        Arc::new(move |env| self.run(env))
    }
}

/// What a single render pass reported besides its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Pass {
    /// A pragma handler stopped rendering.
    pub stopped: bool,
    /// Smallest `passes N` pragma seen.
    pub pass_cap: Option<usize>,
}

/// A compiled template, invocable any number of times.
///
/// Holds no mutable state; every invocation owns its environment, so one
/// template can render on several threads at once.
#[derive(Debug, Clone)]
pub struct Template {
    body: Body,
    slots: usize,
    format: NumberFormat,
}

impl Template {
    pub(crate) fn new(body: Body, slots: usize, format: NumberFormat) -> Self {
        Self { body, slots, format }
    }

    /// Number of local-binding slots an invocation allocates.
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    /// Render against `context` into a new string.
    pub fn render(&self, context: &Value) -> Result<String> {
        let mut out = String::new();
        self.render_to(context, &mut out)?;
        Ok(out)
    }

    /// Render against `context`, writing to `out`.
    pub fn render_to(&self, context: &Value, out: &mut dyn Output) -> Result<()> {
        self.invoke(context, out).map(|_| ())
    }

    pub(crate) fn invoke(&self, context: &Value, out: &mut dyn Output) -> Result<Pass> {
        let _format = format::pin(self.format);
        let mut env = Env::new(context.clone(), self.slots, out);
        let stopped = match self.body.run(&mut env) {
            Ok(()) => false,
            Err(Halt::Stop) => {
                debug!("rendering stopped by pragma");
                true
            }
            Err(Halt::Fail(error)) => return Err(error.into()),
        };
        Ok(Pass {
            stopped,
            pass_cap: env.pass_cap(),
        })
    }
}
