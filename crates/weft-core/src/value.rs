//! Dynamic values exchanged with the query executor
//!
//! Resolvers hand the bridge arbitrary values. Scalars and collections are
//! plain data; anything else travels as an [`ObjectRef`], a shared handle to
//! an [`ExternalObject`] with a stable identity for as long as it is alive.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Access to the concrete type behind a trait object
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An object that can travel through the bridge inside a [`Value`]
///
/// Capabilities name the super-types or interfaces an object satisfies, so an
/// adapter registered for a capability matches every implementer.
pub trait ExternalObject: AsAny + Send + Sync + fmt::Debug + 'static {
    /// Human-readable concrete type name
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Named capabilities this object implements
    fn capabilities(&self) -> &[&'static str] {
        &[]
    }
}

/// Identity of a live external object
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:#x})", self.0)
    }
}

/// Shared handle to an external object
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn ExternalObject>);

impl ObjectRef {
    pub fn new<T: ExternalObject>(object: T) -> Self {
        ObjectRef(Arc::new(object))
    }

    pub fn from_arc(object: Arc<dyn ExternalObject>) -> Self {
        ObjectRef(object)
    }

    /// Identity token, stable while any strong handle exists
    #[inline]
    pub fn identity(&self) -> ObjectId {
        ObjectId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// Concrete type of the referenced object
    pub fn type_id(&self) -> TypeId {
        Any::type_id((*self.0).as_any())
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub fn capabilities(&self) -> &[&'static str] {
        self.0.capabilities()
    }

    /// Is the object an instance of `T`?
    pub fn is<T: ExternalObject>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    pub fn downcast_ref<T: ExternalObject>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }

    /// Non-owning handle to the same object
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Arc::downgrade(&self.0))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.identity() == other.identity()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Weak handle that does not keep its object alive
#[derive(Clone)]
pub struct WeakObjectRef(Weak<dyn ExternalObject>);

impl WeakObjectRef {
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakObjectRef(alive: {})", self.is_alive())
    }
}

/// A value produced or consumed by a resolver
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(ObjectRef),
}

impl Value {
    /// Wrap an external object
    pub fn object<T: ExternalObject>(object: T) -> Self {
        Value::Object(ObjectRef::new(object))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(object) => object.type_name(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}
