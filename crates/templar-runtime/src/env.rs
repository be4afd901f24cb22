//! Evaluation environment for compiled templates and expressions.
//!
//! Compiled code is a tree of closures over `&mut Env`. The environment owns
//! everything that changes during one invocation: the context stack, the
//! slot vector for local bindings, and the output sink with its capture
//! buffers. Compiled artifacts themselves stay immutable and shareable.

use crate::error::RenderError;
use crate::value::Value;
use std::sync::Arc;

/// Destination for rendered text.
pub trait Output {
    fn write(&mut self, chunk: &str);
}

impl Output for String {
    fn write(&mut self, chunk: &str) {
        self.push_str(chunk);
    }
}

/// Why evaluation stopped early.
#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// A pragma handler asked to end rendering; output so far is kept.
    Stop,
    Fail(RenderError),
}

impl From<RenderError> for Halt {
    fn from(error: RenderError) -> Self {
        Halt::Fail(error)
    }
}

pub type Flow<T> = std::result::Result<T, Halt>;

/// Compiled expression body.
pub type Eval = Arc<dyn Fn(&mut Env<'_>) -> Flow<Value> + Send + Sync>;

/// Compiled template fragment.
pub type Render = Arc<dyn Fn(&mut Env<'_>) -> Flow<()> + Send + Sync>;

/// Per-invocation state.
pub struct Env<'o> {
    /// Root first, innermost last.
    contexts: Vec<Value>,
    slots: Vec<Value>,
    out: &'o mut dyn Output,
    captures: Vec<String>,
    pass_cap: Option<usize>,
}

impl<'o> Env<'o> {
    pub fn new(root: Value, slots: usize, out: &'o mut dyn Output) -> Self {
        Self {
            contexts: vec![root],
            slots: vec![Value::Null; slots],
            out,
            captures: Vec::new(),
            pass_cap: None,
        }
    }

    /// `$n`: the context `n` levels out from the innermost.
    pub fn context(&self, n: usize) -> Value {
        self.contexts
            .len()
            .checked_sub(n + 1)
            .and_then(|at| self.contexts.get(at))
            .cloned()
            .unwrap_or_default()
    }

    /// Context at absolute frame index, counted from the root.
    pub fn frame(&self, index: usize) -> Value {
        self.contexts.get(index).cloned().unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    /// Run `f` with `context` pushed as the innermost context.
    pub fn with_context<T>(&mut self, context: Value, f: impl FnOnce(&mut Self) -> Flow<T>) -> Flow<T> {
        self.contexts.push(context);
        let result = f(self);
        self.contexts.pop();
        result
    }

    /// Run `f` against a replacement context stack, restoring the current
    /// one afterwards.
    pub fn with_contexts<T>(&mut self, contexts: Vec<Value>, f: impl FnOnce(&mut Self) -> Flow<T>) -> Flow<T> {
        let saved = std::mem::replace(&mut self.contexts, contexts);
        let result = f(self);
        self.contexts = saved;
        result
    }

    /// Copy of the current context stack.
    pub fn snapshot(&self) -> Vec<Value> {
        self.contexts.clone()
    }

    pub fn slot(&self, slot: usize) -> Value {
        self.slots.get(slot).cloned().unwrap_or_default()
    }

    pub fn set_slot(&mut self, slot: usize, value: Value) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, Value::Null);
        }
        self.slots[slot] = value;
    }

    /// Emit text to the innermost capture, or the sink when none is active.
    pub fn write(&mut self, chunk: &str) {
        match self.captures.last_mut() {
            Some(buffer) => buffer.push_str(chunk),
            None => self.out.write(chunk),
        }
    }

    /// Run `f`, collecting everything it writes instead of emitting it.
    pub fn capture(&mut self, f: impl FnOnce(&mut Self) -> Flow<()>) -> Flow<String> {
        self.captures.push(String::new());
        let result = f(self);
        let text = self.captures.pop().unwrap_or_default();
        result.map(|()| text)
    }

    /// Lower the cap on fixpoint passes; the smallest request wins.
    pub fn request_pass_cap(&mut self, passes: usize) {
        self.pass_cap = Some(self.pass_cap.map_or(passes, |cap| cap.min(passes)));
    }

    pub fn pass_cap(&self) -> Option<usize> {
        self.pass_cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_indexing_from_innermost() {
        let mut out = String::new();
        let mut env = Env::new(Value::from("root"), 0, &mut out);
        let seen = env
            .with_context(Value::from("inner"), |env| {
                Ok((env.context(0), env.context(1), env.context(2), env.depth()))
            })
            .unwrap();
        assert_eq!(seen, (Value::from("inner"), Value::from("root"), Value::Null, 2));
        assert_eq!(env.depth(), 1);
    }

    #[test]
    fn test_capture_nests_and_restores() {
        let mut out = String::new();
        let mut env = Env::new(Value::Null, 0, &mut out);
        env.write("a");
        let captured = env
            .capture(|env| {
                env.write("b");
                let inner = env.capture(|env| {
                    env.write("c");
                    Ok(())
                })?;
                env.write(&inner.to_uppercase());
                Ok(())
            })
            .unwrap();
        env.write("d");
        assert_eq!(captured, "bC");
        drop(env);
        assert_eq!(out, "ad");
    }

    #[test]
    fn test_contexts_restored_after_failure() {
        let mut out = String::new();
        let mut env = Env::new(Value::from(1), 2, &mut out);
        let result: Flow<()> = env.with_contexts(vec![Value::from(2), Value::from(3)], |env| {
            assert_eq!(env.context(0), Value::from(3));
            Err(Halt::Fail(RenderError::DivideByZero))
        });
        assert!(result.is_err());
        assert_eq!(env.context(0), Value::from(1));
    }

    #[test]
    fn test_pass_cap_keeps_smallest() {
        let mut out = String::new();
        let mut env = Env::new(Value::Null, 0, &mut out);
        env.request_pass_cap(5);
        env.request_pass_cap(9);
        env.request_pass_cap(3);
        assert_eq!(env.pass_cap(), Some(3));
    }
}
