//! Compiled expressions.

use std::fmt;
use std::sync::Arc;
use templar_ast::{CompileError, ErrorKind, Span};
use templar_runtime::coerce::{self, implicit_cost};
use templar_runtime::{Env, Eval, Flow, Halt, RenderError, Value, ValueKind};

/// An invocable expression together with the kind it produces.
///
/// Cloning shares the compiled closure.
#[derive(Clone)]
pub struct CompiledExpr {
    pub eval: Eval,
    pub kind: ValueKind,
}

impl CompiledExpr {
    pub fn new<F>(kind: ValueKind, eval: F) -> Self
    where
        F: Fn(&mut Env<'_>) -> Flow<Value> + Send + Sync + 'static,
    {
        Self {
            eval: Arc::new(eval),
            kind,
        }
    }

    pub fn constant(value: Value) -> Self {
        let kind = value.kind();
        Self::new(kind, move |_| Ok(value.clone()))
    }

    /// The empty string that lenient mode substitutes for unresolved names.
    pub fn empty() -> Self {
        Self::constant(Value::from(""))
    }

    pub fn run(&self, env: &mut Env<'_>) -> Flow<Value> {
        (self.eval)(env)
    }

    /// Evaluate once against `context` as the only context.
    pub fn evaluate(&self, context: &Value) -> Result<Value, RenderError> {
        let mut sink = String::new();
        let mut env = Env::new(context.clone(), 0, &mut sink);
        match self.run(&mut env) {
            Ok(value) => Ok(value),
            Err(Halt::Stop) => Ok(Value::Null),
            Err(Halt::Fail(error)) => Err(error),
        }
    }

    /// Adapt to a caller-requested kind.
    ///
    /// Already-assignable kinds pass through unchanged. `Bool` and `String`
    /// requests accept anything through truthiness and stringification;
    /// other requests need an implicit conversion.
    pub fn coerce_to(self, requested: &ValueKind, span: Span) -> Result<CompiledExpr, CompileError> {
        if self.kind.is_assignable_to(requested) {
            return Ok(self);
        }
        let eval = self.eval;
        match requested {
            ValueKind::Bool => Ok(Self::new(ValueKind::Bool, move |env| {
                Ok(Value::Bool(coerce::to_bool(&eval(env)?)))
            })),
            ValueKind::String => Ok(Self::new(ValueKind::String, move |env| {
                Ok(Value::from(coerce::stringify(&eval(env)?)))
            })),
            target if implicit_cost(&self.kind, target).is_some() => {
                let target = target.clone();
                let convert_to = target.clone();
                Ok(Self::new(target, move |env| {
                    Ok(coerce::convert(eval(env)?, &convert_to)?)
                }))
            }
            target => Err(CompileError::new(
                ErrorKind::TypeMismatch,
                span,
                format!("expected a value of kind '{}', found '{}'", target, self.kind),
            )),
        }
    }
}

impl fmt::Debug for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpr")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
