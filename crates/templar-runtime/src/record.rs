//! `Record`: the built-in dynamic host object.

use crate::host::{DynamicVariables, HostObject, TypeInfo};
use crate::kind::ValueKind;
use crate::value::Value;
use indexmap::IndexMap;
use std::any::Any;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An insertion-ordered, name-keyed bag of variables.
///
/// Used as a template context when there is no host type to describe, and
/// as the target of `#define` on a dynamic root.
#[derive(Default)]
pub struct Record {
    entries: RwLock<IndexMap<String, Value>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, Value>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, Value>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.write().insert(name.into(), value.into());
    }

    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Record {
            entries: RwLock::new(entries),
        }
    }
}

impl HostObject for Record {
    /// A dynamic descriptor declaring the kinds of the current entries.
    fn type_info(&self) -> Arc<TypeInfo> {
        let mut builder = TypeInfo::primitive("Record").dynamic();
        for (name, value) in self.read().iter() {
            let kind = match value.kind() {
                ValueKind::Null => ValueKind::Any,
                kind => kind,
            };
            builder = builder.variable(name, kind);
        }
        builder.build()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn variables(&self) -> Option<&dyn DynamicVariables> {
        Some(self)
    }

    fn to_text(&self) -> String {
        let entries: Vec<String> = self
            .read()
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }
}

impl DynamicVariables for Record {
    fn get(&self, name: &str) -> Option<Value> {
        self.read().get(name).cloned()
    }

    fn set(&self, name: &str, value: Value) {
        self.write().insert(name.to_string(), value);
    }

    fn unset(&self, name: &str) -> bool {
        self.write().shift_remove(name).is_some()
    }

    fn get_ignore_case(&self, name: &str) -> Option<Value> {
        let entries = self.read();
        entries.get(name).cloned().or_else(|| {
            entries
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        })
    }
}
