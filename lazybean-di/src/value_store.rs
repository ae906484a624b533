//! Configuration values addressed by path. Values are stored type-erased and checked against the
//! requested type on every read - a mismatch is an error, never a coercion.

use crate::context::BeanAnyPtr;
use crate::error::Error;
use fxhash::FxHashMap;
use std::any::{type_name, Any, TypeId};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Type-erased value together with the name of its concrete type.
#[derive(Clone)]
pub struct AnyValue {
    value: Rc<dyn Any>,
    type_name: &'static str,
}

impl AnyValue {
    pub fn new<T: 'static>(value: T) -> Self {
        Self {
            value: Rc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Wraps an already type-erased bean. The bean is expected to hold a
    /// [BeanPtr](crate::context::BeanPtr) of the type named by `type_name`.
    pub fn from_bean(bean: BeanAnyPtr, type_name: &'static str) -> Self {
        Self {
            value: bean,
            type_name,
        }
    }

    /// [TypeId] of the stored value.
    pub fn type_id(&self) -> TypeId {
        Any::type_id(&*self.value)
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Returns a copy of the stored value, if it has the requested type.
    pub fn cloned<T: Clone + 'static>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Like [AnyValue::cloned], but reports a [Error::TypeMismatch] for the given path.
    pub fn cast<T: Clone + 'static>(&self, path: &str) -> Result<T, Error> {
        self.cloned().ok_or_else(|| Error::TypeMismatch {
            path: path.to_string(),
            expected: type_name::<T>(),
            actual: self.type_name,
        })
    }
}

impl Debug for AnyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Path-addressed configuration store.
#[derive(Clone, Debug, Default)]
pub struct ValueStore {
    values: FxHashMap<String, AnyValue>,
}

impl ValueStore {
    pub fn get(&self, path: &str) -> Result<AnyValue, Error> {
        self.values
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NoValueFound(path.to_string()))
    }

    /// Typed lookup - reports [Error::TypeMismatch] when the stored value has a different type.
    pub fn get_typed<T: Clone + 'static>(&self, path: &str) -> Result<T, Error> {
        self.get(path)?.cast(path)
    }

    /// Stores a value, replacing any previous one at the same path.
    pub fn set<P: Into<String>>(&mut self, path: P, value: AnyValue) {
        self.values.insert(path.into(), value);
    }
}
