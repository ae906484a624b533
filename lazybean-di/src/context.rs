//! Core functionality for resolving beans. A [Context] hands out beans by type (and optionally
//! name) and configuration values by path. The main implementation is [LazyContext], which
//! creates beans only when they are first requested:
//!
//! 1. a cached bean is returned as-is,
//! 2. otherwise a registered [BeanProvider] is used,
//! 3. otherwise, for unqualified requests only, the bean is auto-constructed from its fields.
//!
//! Named requests never fall back to unqualified providers or auto-construction.
//!
//! Recursive resolution (a builder requesting its own dependencies) is fully supported, with
//! circular dependencies reported as [Error::CycleDependencies].

use crate::bean::{BeanKey, BeanType, Injectable};
use crate::bean_cache::{BeanCache, BeanContainer};
use crate::construct::try_build_new_bean;
use crate::error::{DependencyChain, Error};
use crate::provider_registry::registry::ProviderMap;
use crate::provider_registry::{
    BeanProvider, ProviderKind, ProviderRegistry, StaticProviderRegistry,
};
use crate::settings::ContainerSettings;
use crate::value_store::{AnyValue, ValueStore};
#[cfg(test)]
use mockall::automock;
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Pointer type for beans.
pub type BeanPtr<T> = Rc<T>;

/// Type-erased bean. Always wraps a [BeanPtr] of the actual bean type.
pub type BeanAnyPtr = BeanPtr<dyn Any + 'static>;

pub type ProviderRegistryPtr = Box<dyn ProviderRegistry>;

/// An operation on a container, applied once the container is available.
pub type DeferredUpdate = Box<dyn FnOnce(&dyn Context) -> Result<(), Error>>;

/// Generic bean container.
#[cfg_attr(test, automock)]
pub trait Context {
    /// Prepares the container for use.
    fn init(&self);

    /// Closes all beans owned by the container and empties its cache. The first close failure is
    /// returned, but all beans are attempted.
    fn close(&self) -> Result<(), Error>;

    fn register(&self, provider: BeanProvider) -> Result<(), Error>;

    /// Returns the unqualified bean of given type, creating it if needed.
    fn get(&self, bean_type: &BeanType) -> Result<BeanAnyPtr, Error>;

    /// Returns a bean with given type and name. Requires a registered provider.
    fn get_named(&self, bean_type: &BeanType, name: &str) -> Result<BeanAnyPtr, Error>;

    fn get_generic_value(&self, path: &str) -> Result<AnyValue, Error>;

    fn set_generic_value(&self, path: &str, value: AnyValue);
}

/// Helper trait for [Context] providing strongly-typed access.
pub trait TypedContext {
    /// Typesafe version of [Context::get].
    fn get_typed<T: Injectable + ?Sized>(&self) -> Result<BeanPtr<T>, Error>;

    /// Typesafe version of [Context::get_named].
    fn get_named_typed<T: Injectable + ?Sized>(&self, name: &str) -> Result<BeanPtr<T>, Error>;

    /// Typesafe version of [Context::get_generic_value].
    fn get_value<T: Clone + 'static>(&self, path: &str) -> Result<T, Error>;

    /// Typesafe version of [Context::set_generic_value].
    fn set_value<T: 'static>(&self, path: &str, value: T);
}

impl<C: Context + ?Sized> TypedContext for C {
    fn get_typed<T: Injectable + ?Sized>(&self) -> Result<BeanPtr<T>, Error> {
        let bean_type = BeanType::of::<T>();
        self.get(&bean_type)
            .and_then(|bean| cast_bean(bean, &bean_type))
    }

    fn get_named_typed<T: Injectable + ?Sized>(&self, name: &str) -> Result<BeanPtr<T>, Error> {
        let bean_type = BeanType::of::<T>();
        self.get_named(&bean_type, name)
            .and_then(|bean| cast_bean(bean, &bean_type))
    }

    fn get_value<T: Clone + 'static>(&self, path: &str) -> Result<T, Error> {
        self.get_generic_value(path)?.cast(path)
    }

    fn set_value<T: 'static>(&self, path: &str, value: T) {
        self.set_generic_value(path, AnyValue::new(value));
    }
}

/// Recovers a typed bean from a type-erased one, resolved for `bean_type`.
pub fn cast_bean<T: ?Sized + 'static>(
    bean: BeanAnyPtr,
    bean_type: &BeanType,
) -> Result<BeanPtr<T>, Error> {
    bean.downcast_ref::<BeanPtr<T>>()
        .cloned()
        .ok_or(Error::IncompatibleBean {
            expected: type_name::<T>(),
            resolved_for: bean_type.type_name,
        })
}

/// Builder for [LazyContext] with sensible defaults, for easy construction.
pub struct LazyContextBuilder {
    registry: ProviderRegistryPtr,
    values: ValueStore,
    updates: Vec<DeferredUpdate>,
}

impl Default for LazyContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LazyContextBuilder {
    /// Creates a new builder with an empty registry, which allows provider overriding.
    pub fn new() -> Self {
        Self {
            registry: Box::<ProviderMap>::default(),
            values: Default::default(),
            updates: Default::default(),
        }
    }

    /// Creates a new builder with a registry containing all statically registered providers.
    pub fn from_settings(settings: &ContainerSettings) -> Result<Self, Error> {
        Ok(Self::new().with_registry(Box::new(StaticProviderRegistry::new(
            settings.allow_provider_overriding,
        )?)))
    }

    /// Sets new [ProviderRegistry].
    pub fn with_registry(mut self, registry: ProviderRegistryPtr) -> Self {
        self.registry = registry;
        self
    }

    /// Sets initial configuration values.
    pub fn with_values(mut self, values: ValueStore) -> Self {
        self.values = values;
        self
    }

    /// Adds updates to apply, in order, after the context is created.
    pub fn with_updates<I: IntoIterator<Item = DeferredUpdate>>(mut self, updates: I) -> Self {
        self.updates.extend(updates);
        self
    }

    /// Builds resulting [LazyContext], applying pending updates. The first failing update aborts
    /// building.
    pub fn build(self) -> Result<LazyContext, Error> {
        let context = LazyContext::new(self.registry, self.values);
        for update in self.updates {
            update(&context as &dyn Context)?;
        }

        Ok(context)
    }
}

/// Lazy bean container. See module documentation for the resolution rules.
pub struct LazyContext {
    registry: RefCell<ProviderRegistryPtr>,
    beans: RefCell<BeanCache>,
    values: RefCell<ValueStore>,
    inject_stack: RefCell<Vec<BeanKey>>,
}

impl LazyContext {
    pub fn new(registry: ProviderRegistryPtr, values: ValueStore) -> Self {
        Self {
            registry: RefCell::new(registry),
            beans: Default::default(),
            values: RefCell::new(values),
            inject_stack: Default::default(),
        }
    }

    /// Number of currently cached beans.
    pub fn bean_count(&self) -> usize {
        self.beans.borrow().len()
    }

    fn resolve(&self, key: BeanKey, build_if_missing: bool) -> Result<BeanAnyPtr, Error> {
        let _guard = InjectStackGuard::push(&self.inject_stack, &key)?;

        let cached = self.beans.borrow().bean(&key);
        if let Some(bean) = cached {
            return Ok(bean);
        }

        debug!(%key, "Creating bean.");

        let container = self.init_bean(&key, build_if_missing)?;
        let bean = container.bean.clone();
        self.beans.borrow_mut().store(container);

        Ok(bean)
    }

    fn init_bean(&self, key: &BeanKey, build_if_missing: bool) -> Result<BeanContainer, Error> {
        let provider = self.registry.borrow().provider(key);
        match provider {
            Some(provider) => match provider.kind {
                ProviderKind::UseExisting { target, cast } => {
                    debug!(%key, target = target.type_name, "Using existing bean.");
                    let existing = if key.name.is_empty() {
                        self.get(&target)
                    } else {
                        self.get_named(&target, &key.name)
                    }?;

                    Ok(BeanContainer::new(cast(existing)?, key.clone(), false))
                }
                ProviderKind::Builder(builder) => {
                    let bean = builder(self as &dyn Context)?;
                    Ok(BeanContainer::new(
                        bean,
                        key.clone(),
                        provider.hold_by_context,
                    ))
                }
                ProviderKind::BuildAs {
                    builder,
                    target,
                    cast,
                } => {
                    let bean = builder(self as &dyn Context)?;
                    Ok(
                        BeanContainer::new(cast(bean.clone())?, key.clone(), provider.hold_by_context)
                            .with_close_target(bean, &target),
                    )
                }
            },
            None if build_if_missing => {
                let bean = try_build_new_bean(&key.bean_type, self)?;
                Ok(BeanContainer::new(bean, key.clone(), true))
            }
            None => Err(Error::NoBeanProvider(key.clone())),
        }
    }
}

impl Context for LazyContext {
    fn init(&self) {
        debug!("Lazy context initialized.");
    }

    fn close(&self) -> Result<(), Error> {
        let containers = self.beans.borrow_mut().drain();
        let mut result = Ok(());

        for container in containers
            .into_iter()
            .filter(|container| container.hold_by_context)
        {
            debug!(key = %container.key, "Closing bean.");

            if let Err(error) = container.close() {
                warn!(key = %container.key, %error, "Error closing bean.");
                if result.is_ok() {
                    result = Err(error);
                }
            }
        }

        result
    }

    fn register(&self, provider: BeanProvider) -> Result<(), Error> {
        let key = provider.key();
        self.registry.borrow_mut().register(provider)?;

        info!(%key, "Registered bean provider.");
        Ok(())
    }

    fn get(&self, bean_type: &BeanType) -> Result<BeanAnyPtr, Error> {
        self.resolve(BeanKey::new(*bean_type, ""), true)
    }

    fn get_named(&self, bean_type: &BeanType, name: &str) -> Result<BeanAnyPtr, Error> {
        self.resolve(BeanKey::new(*bean_type, name), false)
    }

    fn get_generic_value(&self, path: &str) -> Result<AnyValue, Error> {
        self.values.borrow().get(path)
    }

    fn set_generic_value(&self, path: &str, value: AnyValue) {
        self.values.borrow_mut().set(path, value);
    }
}

/// Keeps a key on the resolution stack for as long as it lives.
struct InjectStackGuard<'a> {
    stack: &'a RefCell<Vec<BeanKey>>,
}

impl<'a> InjectStackGuard<'a> {
    fn push(stack: &'a RefCell<Vec<BeanKey>>, key: &BeanKey) -> Result<Self, Error> {
        let mut keys = stack.borrow_mut();
        if keys.contains(key) {
            let chain = DependencyChain::new(keys.clone(), key.clone());
            debug!(chain = chain.to_single_line(), "Detected dependency cycle.");
            return Err(Error::CycleDependencies(chain));
        }

        keys.push(key.clone());
        Ok(Self { stack })
    }
}

impl Drop for InjectStackGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}
