//! Type descriptors and the adapter contract

use std::any::TypeId;
use std::fmt;

use weft_core::{ExternalObject, ObjectRef};
use weft_future::Thenable;

/// Converts one external asynchronous type into a native thenable
///
/// Conversion cannot fail; an adapter that cannot produce a value returns a
/// rejected settled result instead.
pub trait ThenableAdapter: Send + Sync {
    fn convert(&self, candidate: &ObjectRef) -> Thenable;
}

impl<F> ThenableAdapter for F
where
    F: Fn(&ObjectRef) -> Thenable + Send + Sync,
{
    fn convert(&self, candidate: &ObjectRef) -> Thenable {
        self(candidate)
    }
}

/// What an adapter is registered for
#[derive(Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// Exactly one concrete type
    Exact { id: TypeId, name: &'static str },
    /// Every object declaring the named capability
    Capability(&'static str),
}

impl TypeDescriptor {
    pub fn of<T: ExternalObject>() -> Self {
        TypeDescriptor::Exact {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn capability(name: &'static str) -> Self {
        TypeDescriptor::Capability(name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypeDescriptor::Exact { name, .. } => *name,
            TypeDescriptor::Capability(name) => *name,
        }
    }

    /// Is `candidate` an instance of this type or an implementer of this capability?
    pub fn matches(&self, candidate: &ObjectRef) -> bool {
        match self {
            TypeDescriptor::Exact { id, .. } => candidate.type_id() == *id,
            TypeDescriptor::Capability(name) => candidate.capabilities().contains(name),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Exact { name, .. } => write!(f, "Exact({})", name),
            TypeDescriptor::Capability(name) => write!(f, "Capability({})", name),
        }
    }
}
