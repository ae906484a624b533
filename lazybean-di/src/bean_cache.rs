//! Resolved beans live in a [BeanCache] - once a bean is created for a given key, the same
//! instance is returned on every subsequent request until the owning container is closed.

use crate::bean::{BeanKey, BeanType, CloseFn};
use crate::context::BeanAnyPtr;
use crate::error::Error;
use derivative::Derivative;
use fxhash::FxHashMap;

/// Cache entry for a resolved bean.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct BeanContainer {
    pub bean: BeanAnyPtr,
    pub key: BeanKey,
    /// Whether the container created the bean and is responsible for closing it.
    pub hold_by_context: bool,
    /// The bean as created, before being viewed as the key type. Closed instead of `bean`.
    #[derivative(Debug = "ignore")]
    close_target: BeanAnyPtr,
    #[derivative(Debug = "ignore")]
    close: CloseFn,
}

impl BeanContainer {
    pub fn new(bean: BeanAnyPtr, key: BeanKey, hold_by_context: bool) -> Self {
        Self {
            close_target: bean.clone(),
            close: key.bean_type.close,
            bean,
            key,
            hold_by_context,
        }
    }

    /// Closes the bean through `bean_type` instead of the key type.
    pub fn with_close_target(mut self, bean: BeanAnyPtr, bean_type: &BeanType) -> Self {
        self.close_target = bean;
        self.close = bean_type.close;
        self
    }

    #[inline]
    pub fn close(&self) -> Result<(), Error> {
        (self.close)(&self.close_target)
    }
}

/// Beans keyed by type and name, remembering the order in which they were constructed.
#[derive(Default)]
pub struct BeanCache {
    containers: FxHashMap<BeanKey, BeanContainer>,
    construction_order: Vec<BeanKey>,
}

impl BeanCache {
    #[inline]
    pub fn bean(&self, key: &BeanKey) -> Option<BeanAnyPtr> {
        self.containers
            .get(key)
            .map(|container| container.bean.clone())
    }

    pub fn store(&mut self, container: BeanContainer) {
        let key = container.key.clone();
        if self.containers.insert(key.clone(), container).is_none() {
            self.construction_order.push(key);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Empties the cache, returning all containers in reverse construction order.
    pub fn drain(&mut self) -> Vec<BeanContainer> {
        let mut containers = std::mem::take(&mut self.containers);
        std::mem::take(&mut self.construction_order)
            .into_iter()
            .rev()
            .filter_map(|key| containers.remove(&key))
            .collect()
    }
}
