//! Host type descriptors.
//!
//! Rust has no runtime reflection, so host types describe themselves once
//! with a [`TypeInfo`]: fields with getters, static members, methods with
//! parameter kinds, an optional element kind for iteration and an optional
//! dynamic-variable protocol. The expression compiler resolves names against
//! these descriptors and bakes the getters into the compiled closures.
//!
//! # Examples
//!
//! ```
//! # use templar_runtime::*;
//! # use std::any::Any;
//! # use std::sync::{Arc, LazyLock};
//! struct Person { name: String, age: u32 }
//!
//! static PERSON: LazyLock<Arc<TypeInfo>> = LazyLock::new(|| {
//!     TypeInfo::builder::<Person>("Person")
//!         .field("name", ValueKind::String, |p| Value::str(&p.name))
//!         .field("age", ValueKind::Int(IntKind::U32), |p| Value::from(p.age))
//!         .build()
//! });
//!
//! impl HostObject for Person {
//!     fn type_info(&self) -> Arc<TypeInfo> { PERSON.clone() }
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! let person = Value::object(Person { name: "Ada".into(), age: 36 });
//! let field = PERSON.field("name", true).unwrap();
//! assert_eq!(field.get(&person).unwrap(), Value::from("Ada"));
//! ```

use crate::error::{RenderError, Result};
use crate::kind::ValueKind;
use crate::value::Value;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use templar_ast::IntKind;

/// A host value the template can read from.
pub trait HostObject: Any + Send + Sync {
    /// Descriptor used for name resolution.
    fn type_info(&self) -> Arc<TypeInfo>;

    fn as_any(&self) -> &dyn Any;

    /// Elements for iteration, when the type is enumerable.
    fn elements(&self) -> Option<Vec<Value>> {
        None
    }

    /// Dynamic-variable protocol, when the type is indexer backed.
    fn variables(&self) -> Option<&dyn DynamicVariables> {
        None
    }

    /// Text produced when the object itself is emitted.
    fn to_text(&self) -> String {
        self.type_info().name().to_string()
    }
}

/// Name-keyed variables of a dynamic host object.
///
/// Writes go through `&self`; implementations use interior mutability.
pub trait DynamicVariables: Send + Sync {
    fn get(&self, name: &str) -> Option<Value>;

    fn set(&self, name: &str, value: Value);

    /// Remove a variable, reporting whether it existed.
    fn unset(&self, name: &str) -> bool;

    /// Case-insensitive lookup; defaults to the exact lookup.
    fn get_ignore_case(&self, name: &str) -> Option<Value> {
        self.get(name)
    }
}

/// Reads a field from a receiver value.
pub type Getter = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Invokes a method on a receiver (`Value::Null` for static methods).
pub type Invoker = Arc<dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync>;

/// Instance field or property.
#[derive(Clone)]
pub struct Field {
    pub name: String,
    pub kind: ValueKind,
    getter: Getter,
}

/// Static member: a constant value on the type itself.
#[derive(Clone)]
pub struct StaticMember {
    pub name: String,
    pub kind: ValueKind,
    pub value: Value,
}

/// Instance or static method.
#[derive(Clone)]
pub struct Method {
    pub name: String,
    pub params: Vec<ValueKind>,
    pub returns: ValueKind,
    pub is_static: bool,
    invoker: Invoker,
}

impl Field {
    pub fn get(&self, receiver: &Value) -> Result<Value> {
        (self.getter)(receiver)
    }
}

impl Method {
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> Result<Value> {
        (self.invoker)(receiver, args)
    }

    /// `name(kind, kind)` for diagnostics.
    pub fn signature(&self) -> String {
        let params: Vec<_> = self.params.iter().map(ToString::to_string).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Host type descriptor.
pub struct TypeInfo {
    name: String,
    namespace: Option<String>,
    fields: IndexMap<String, Field>,
    statics: IndexMap<String, StaticMember>,
    methods: Vec<Method>,
    element: Option<ValueKind>,
    dynamic: bool,
    variables: IndexMap<String, ValueKind>,
}

fn lookup<'a, T>(map: &'a IndexMap<String, T>, name: &str, case_sensitive: bool) -> Option<&'a T> {
    map.get(name).or_else(|| {
        if case_sensitive {
            None
        } else {
            map.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        }
    })
}

impl TypeInfo {
    /// Start describing host type `T`.
    pub fn builder<T: Any>(name: impl Into<String>) -> TypeBuilder<T> {
        TypeBuilder {
            info: TypeInfo {
                name: name.into(),
                namespace: None,
                fields: IndexMap::new(),
                statics: IndexMap::new(),
                methods: Vec::new(),
                element: None,
                dynamic: false,
                variables: IndexMap::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Builder for members of built-in values, which have no host type to
    /// downcast to; use the raw `field_fn`/`method_fn` forms.
    pub fn primitive(name: impl Into<String>) -> TypeBuilder<Value> {
        Self::builder::<Value>(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// `Namespace.Name`, or just the name without a namespace.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    pub fn field(&self, name: &str, case_sensitive: bool) -> Option<&Field> {
        lookup(&self.fields, name, case_sensitive)
    }

    pub fn static_member(&self, name: &str, case_sensitive: bool) -> Option<&StaticMember> {
        lookup(&self.statics, name, case_sensitive)
    }

    /// Methods with a matching name, instance methods first.
    pub fn methods_named<'a>(
        &'a self,
        name: &'a str,
        case_sensitive: bool,
    ) -> impl Iterator<Item = &'a Method> + 'a {
        let instance = self.methods.iter().filter(|m| !m.is_static);
        let statics = self.methods.iter().filter(|m| m.is_static);
        instance.chain(statics).filter(move |m| {
            if case_sensitive {
                m.name == name
            } else {
                m.name.eq_ignore_ascii_case(name)
            }
        })
    }

    pub fn has_method(&self, name: &str, case_sensitive: bool) -> bool {
        self.methods_named(name, case_sensitive).next().is_some()
    }

    pub fn element_kind(&self) -> Option<&ValueKind> {
        self.element.as_ref()
    }

    /// Whether unknown names fall through to the dynamic-variable protocol.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Declared kind of a dynamic variable.
    pub fn variable_kind(&self, name: &str, case_sensitive: bool) -> Option<&ValueKind> {
        lookup(&self.variables, name, case_sensitive)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.full_name())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("dynamic", &self.dynamic)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TypeInfo`]; typed members downcast the receiver to `T`.
pub struct TypeBuilder<T> {
    info: TypeInfo,
    _marker: PhantomData<fn() -> T>,
}

/// Borrow the concrete host type behind a receiver value.
fn receiver<'v, T: Any>(value: &'v Value, type_name: &str) -> Result<&'v T> {
    match value {
        Value::Object(object) => object
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| RenderError::mismatch(type_name, object.type_info().name())),
        other => Err(RenderError::mismatch(type_name, other.kind())),
    }
}

impl<T: Any> TypeBuilder<T> {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.info.namespace = Some(namespace.into());
        self
    }

    /// Instance field read through a typed getter.
    pub fn field<F>(self, name: &str, kind: ValueKind, get: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let type_name = self.info.name.clone();
        self.field_fn(name, kind, move |value| {
            Ok(get(receiver::<T>(value, &type_name)?))
        })
    }

    /// Instance field read from the raw receiver value.
    pub fn field_fn<F>(mut self, name: &str, kind: ValueKind, get: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.info.fields.insert(
            name.to_string(),
            Field {
                name: name.to_string(),
                kind,
                getter: Arc::new(get),
            },
        );
        self
    }

    /// Static constant.
    pub fn constant(mut self, name: &str, value: Value) -> Self {
        self.info.statics.insert(
            name.to_string(),
            StaticMember {
                name: name.to_string(),
                kind: value.kind(),
                value,
            },
        );
        self
    }

    /// Instance method with a typed receiver.
    pub fn method<F>(self, name: &str, params: &[ValueKind], returns: ValueKind, f: F) -> Self
    where
        F: Fn(&T, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let type_name = self.info.name.clone();
        self.method_fn(name, params, returns, move |value, args| {
            f(receiver::<T>(value, &type_name)?, args)
        })
    }

    /// Instance method over the raw receiver value.
    pub fn method_fn<F>(mut self, name: &str, params: &[ValueKind], returns: ValueKind, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.info.methods.push(Method {
            name: name.to_string(),
            params: params.to_vec(),
            returns,
            is_static: false,
            invoker: Arc::new(f),
        });
        self
    }

    pub fn static_method<F>(mut self, name: &str, params: &[ValueKind], returns: ValueKind, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.info.methods.push(Method {
            name: name.to_string(),
            params: params.to_vec(),
            returns,
            is_static: true,
            invoker: Arc::new(move |_, args| f(args)),
        });
        self
    }

    /// Mark the type enumerable with the given element kind.
    pub fn elements(mut self, kind: ValueKind) -> Self {
        self.info.element = Some(kind);
        self
    }

    /// Route unknown names through [`HostObject::variables`].
    pub fn dynamic(mut self) -> Self {
        self.info.dynamic = true;
        self
    }

    /// Declare the kind of a dynamic variable known up front.
    pub fn variable(mut self, name: &str, kind: ValueKind) -> Self {
        self.info.dynamic = true;
        self.info.variables.insert(name.to_string(), kind);
        self
    }

    pub fn build(self) -> Arc<TypeInfo> {
        Arc::new(self.info)
    }
}

/// Host enum descriptor.
#[derive(Debug, Clone)]
pub struct EnumInfo {
    name: String,
    namespace: Option<String>,
    underlying: IntKind,
    variants: IndexMap<String, i128>,
}

impl EnumInfo {
    pub fn new(name: impl Into<String>, underlying: IntKind) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            underlying,
            variants: IndexMap::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_variant(mut self, name: impl Into<String>, value: i128) -> Self {
        self.variants.insert(name.into(), self.underlying.wrap(value));
        self
    }

    pub fn build(self) -> Arc<EnumInfo> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    pub fn underlying(&self) -> IntKind {
        self.underlying
    }

    pub fn variant(&self, name: &str, case_sensitive: bool) -> Option<i128> {
        lookup(&self.variants, name, case_sensitive).copied()
    }

    /// Name of the first variant with this value.
    pub fn name_of(&self, value: i128) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, v)| **v == value)
            .map(|(name, _)| name.as_str())
    }
}

/// A type that can be named statically in an expression.
#[derive(Debug, Clone)]
pub enum StaticType {
    Type(Arc<TypeInfo>),
    Enum(Arc<EnumInfo>),
}

impl StaticType {
    pub fn full_name(&self) -> String {
        match self {
            StaticType::Type(info) => info.full_name(),
            StaticType::Enum(info) => info.full_name(),
        }
    }
}

/// Full name → static type, consulted for `Type.Member` and namespace lookups.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: IndexMap<String, StaticType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_type(&mut self, info: Arc<TypeInfo>) -> &mut Self {
        self.entries.insert(info.full_name(), StaticType::Type(info));
        self
    }

    pub fn register_enum(&mut self, info: Arc<EnumInfo>) -> &mut Self {
        self.entries.insert(info.full_name(), StaticType::Enum(info));
        self
    }

    pub fn with_type(mut self, info: Arc<TypeInfo>) -> Self {
        self.register_type(info);
        self
    }

    pub fn with_enum(mut self, info: Arc<EnumInfo>) -> Self {
        self.register_enum(info);
        self
    }

    pub fn lookup(&self, full_name: &str, case_sensitive: bool) -> Option<&StaticType> {
        lookup(&self.entries, full_name, case_sensitive)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i32,
        y: i32,
    }

    fn point_type() -> Arc<TypeInfo> {
        TypeInfo::builder::<Point>("Point")
            .namespace("Geo")
            .field("x", ValueKind::Int(IntKind::I32), |p| Value::from(p.x))
            .field("y", ValueKind::Int(IntKind::I32), |p| Value::from(p.y))
            .constant("Dimensions", Value::from(2))
            .method("scaled", &[ValueKind::Int(IntKind::I32)], ValueKind::Int(IntKind::I32), |p, args| {
                Ok(Value::from(p.x * args[0].as_i128().unwrap_or(1) as i32))
            })
            .build()
    }

    impl HostObject for Point {
        fn type_info(&self) -> Arc<TypeInfo> {
            point_type()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_field_lookup_respects_case_option() {
        let info = point_type();
        assert!(info.field("x", true).is_some());
        assert!(info.field("X", true).is_none());
        assert!(info.field("X", false).is_some());
        assert_eq!(info.full_name(), "Geo.Point");
    }

    #[test]
    fn test_typed_getter_and_method() {
        let info = point_type();
        let p = Value::object(Point { x: 3, y: 4 });
        assert_eq!(info.field("y", true).unwrap().get(&p).unwrap(), Value::from(4));

        let method = info.methods_named("scaled", true).next().unwrap();
        assert_eq!(method.invoke(&p, &[Value::from(5)]).unwrap(), Value::from(15));
        assert_eq!(method.signature(), "scaled(i32)");
    }

    #[test]
    fn test_getter_rejects_wrong_receiver() {
        let info = point_type();
        let err = info.field("x", true).unwrap().get(&Value::from("nope"));
        assert!(matches!(err, Err(RenderError::TypeMismatch { .. })));
    }

    #[test]
    fn test_enum_variants() {
        let color = EnumInfo::new("Color", IntKind::U8)
            .with_variant("Red", 1)
            .with_variant("Green", 2)
            .build();
        assert_eq!(color.variant("green", false), Some(2));
        assert_eq!(color.variant("green", true), None);
        assert_eq!(color.name_of(1), Some("Red"));
    }

    #[test]
    fn test_registry_lookup_by_full_name() {
        let registry = TypeRegistry::new().with_type(point_type());
        assert!(registry.lookup("Geo.Point", true).is_some());
        assert!(registry.lookup("geo.point", false).is_some());
        assert!(registry.lookup("Point", true).is_none());
    }
}
