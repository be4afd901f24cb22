//! Compile-time scope stack.
//!
//! One [`ScopeFrame`] per lexically nested region: the root context, every
//! iteration element, block, let body and fragment body. Each frame pairs
//! the static kind of its runtime context with a binder holding the names it
//! introduces. Resolution walks from the innermost frame along `delegate`
//! indices toward the root.
//!
//! The frame count always equals the number of live contexts on the runtime
//! stack, so frame index `i` addresses the same context as `Env::frame(i)`.

use indexmap::IndexMap;
use std::sync::Arc;
use templar_runtime::{Render, ValueKind};

/// What a frame's binder is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderKind {
    /// Iteration element; declares nothing itself.
    ReadOnly,
    /// Root over an indexer-backed context; defines write through to the
    /// context's variables.
    Dynamic,
    /// Root over a static context, and `block`.
    Declarations,
    Let,
    /// Fragment parameters.
    Parameters,
}

/// Where a slot binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Let,
    Define,
    Parameter,
}

/// A compiled `#define name(params)` body.
pub struct Fragment {
    pub name: String,
    pub params: Vec<usize>,
    /// Slot holding the context stack captured when the define ran.
    pub snapshot: usize,
    /// Part before `#out`; runs for its side effects, output discarded.
    pub compute: Option<Render>,
    pub emit: Render,
}

impl std::fmt::Debug for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fragment")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Binding {
    /// Value stored in an `Env` slot.
    Slot {
        slot: usize,
        kind: ValueKind,
        origin: Origin,
    },
    /// Variable of the dynamic context at `frame`.
    Variable {
        frame: usize,
        name: String,
        kind: ValueKind,
    },
    Fragment(Arc<Fragment>),
    /// An `undef` of a name owned by an enclosing frame.
    Hidden,
}

impl Binding {
    pub fn is_let(&self) -> bool {
        matches!(
            self,
            Binding::Slot {
                origin: Origin::Let,
                ..
            }
        )
    }
}

#[derive(Debug)]
pub struct Binder {
    pub kind: BinderKind,
    bindings: IndexMap<String, Binding>,
}

#[derive(Debug)]
pub struct ScopeFrame {
    /// Static kind of the runtime context of this frame.
    pub context: ValueKind,
    pub binder: Binder,
    /// Enclosing frame consulted for names this one does not bind.
    pub delegate: Option<usize>,
}

fn find<'a>(bindings: &'a IndexMap<String, Binding>, name: &str, case_sensitive: bool) -> Option<(&'a String, &'a Binding)> {
    bindings.get_key_value(name).or_else(|| {
        if case_sensitive {
            None
        } else {
            bindings.iter().find(|(k, _)| k.eq_ignore_ascii_case(name))
        }
    })
}

impl ScopeFrame {
    /// Binding for `name` declared by this frame alone.
    fn lookup(&self, name: &str, case_sensitive: bool) -> Option<Binding> {
        find(&self.binder.bindings, name, case_sensitive).map(|(_, binding)| binding.clone())
    }
}

/// Parallel compile-time image of the runtime context stack.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
    slots: usize,
}

impl ScopeStack {
    /// Stack with a single root frame over a context of `context` kind.
    pub fn new(context: ValueKind) -> Self {
        let kind = match context.type_info() {
            Some(info) if info.is_dynamic() => BinderKind::Dynamic,
            _ => BinderKind::Declarations,
        };
        Self {
            frames: vec![ScopeFrame {
                context,
                binder: Binder {
                    kind,
                    bindings: IndexMap::new(),
                },
                delegate: None,
            }],
            slots: 0,
        }
    }

    /// Push a frame; returns its index.
    pub fn push(&mut self, context: ValueKind, kind: BinderKind) -> usize {
        let delegate = Some(self.frames.len() - 1);
        self.frames.push(ScopeFrame {
            context,
            binder: Binder {
                kind,
                bindings: IndexMap::new(),
            },
            delegate,
        });
        self.frames.len() - 1
    }

    /// Pop the innermost frame. The root frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> &ScopeFrame {
        &self.frames[self.frames.len() - 1]
    }

    pub fn current_index(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn frame(&self, index: usize) -> Option<&ScopeFrame> {
        self.frames.get(index)
    }

    /// Context kind `n` frames out from the innermost (`$n`).
    pub fn context(&self, n: usize) -> Option<&ValueKind> {
        let at = self.frames.len().checked_sub(n + 1)?;
        Some(&self.frames[at].context)
    }

    pub fn allocate_slot(&mut self) -> usize {
        self.slots += 1;
        self.slots - 1
    }

    /// Total slots an `Env` needs for everything compiled so far.
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    fn chain(&self) -> impl Iterator<Item = (usize, &ScopeFrame)> + '_ {
        std::iter::successors(Some(self.frames.len() - 1), |&i| self.frames[i].delegate)
            .map(|i| (i, &self.frames[i]))
    }

    /// Resolve a local name, innermost first. Returns the owning frame and
    /// the binding; a `Hidden` tombstone ends the walk.
    pub fn lookup(&self, name: &str, case_sensitive: bool) -> Option<(usize, Binding)> {
        for (index, frame) in self.chain() {
            if let Some(binding) = frame.lookup(name, case_sensitive) {
                return Some((index, binding));
            }
            if frame.binder.kind == BinderKind::Dynamic
                && let Some(info) = frame.context.type_info()
                && let Some(kind) = info.variable_kind(name, case_sensitive)
            {
                return Some((
                    index,
                    Binding::Variable {
                        frame: index,
                        name: name.to_string(),
                        kind: kind.clone(),
                    },
                ));
            }
        }
        None
    }

    /// Innermost frame anywhere in the chain where `name` is let-bound.
    pub fn let_owner(&self, name: &str, case_sensitive: bool) -> Option<usize> {
        self.chain()
            .find(|(_, frame)| {
                frame
                    .lookup(name, case_sensitive)
                    .is_some_and(|binding| binding.is_let())
            })
            .map(|(index, _)| index)
    }

    /// Frame that receives `#define` bindings: the nearest block or root.
    pub fn declaration_frame(&self) -> usize {
        self.chain()
            .find(|(_, frame)| {
                matches!(
                    frame.binder.kind,
                    BinderKind::Declarations | BinderKind::Dynamic
                )
            })
            .map_or(0, |(index, _)| index)
    }

    pub fn binder_kind(&self, frame: usize) -> Option<BinderKind> {
        self.frames.get(frame).map(|f| f.binder.kind)
    }

    pub fn declare(&mut self, frame: usize, name: impl Into<String>, binding: Binding) {
        if let Some(f) = self.frames.get_mut(frame) {
            f.binder.bindings.insert(name.into(), binding);
        }
    }

    /// Remove a binding declared directly by `frame`.
    pub fn remove(&mut self, frame: usize, name: &str, case_sensitive: bool) -> Option<Binding> {
        let f = self.frames.get_mut(frame)?;
        let key = find(&f.binder.bindings, name, case_sensitive)?.0.clone();
        f.binder.bindings.shift_remove(&key)
    }

    /// Whether `frame` itself declares `name`.
    pub fn declares(&self, frame: usize, name: &str, case_sensitive: bool) -> bool {
        self.frames
            .get(frame)
            .is_some_and(|f| f.lookup(name, case_sensitive).is_some())
    }
}
