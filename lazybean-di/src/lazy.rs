//! Lazy access to beans. A [LazyBean] field is not injected when its owner is created - the bean
//! is resolved only when first asked for, which makes it possible to break construction cycles:
//!
//! ```
//! use lazybean_di::context::BeanPtr;
//! use lazybean_di::lazy::LazyBean;
//! use lazybean_di::Bean;
//!
//! #[derive(Bean)]
//! struct Parent {
//!     child: BeanPtr<Child>,
//! }
//!
//! #[derive(Bean)]
//! struct Child {
//!     // resolved through the global container on first use
//!     parent: LazyBean<Parent>,
//! }
//! ```

use crate::bean::Injectable;
use crate::context::{BeanPtr, Context, TypedContext};
use crate::error::Error;
use crate::global;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};
use tracing::error;

type Resolver<T> = dyn Fn() -> Result<BeanPtr<T>, Error>;

/// Accessor resolving a bean on demand.
pub struct LazyBean<T: ?Sized + 'static> {
    resolver: Rc<Resolver<T>>,
}

impl<T: Injectable + ?Sized> LazyBean<T> {
    pub fn new(resolver: impl Fn() -> Result<BeanPtr<T>, Error> + 'static) -> Self {
        Self {
            resolver: Rc::new(resolver),
        }
    }

    /// Creates an accessor resolving the unqualified bean from the global container.
    pub fn from_global() -> Self {
        Self::new(global::get_bean::<T>)
    }

    /// Creates an accessor resolving a named bean from the global container.
    pub fn named_from_global<N: Into<String>>(name: N) -> Self {
        let name = name.into();
        Self::new(move || global::get_named_bean::<T>(&name))
    }

    /// Creates an accessor resolving the bean from given container. The accessor does not keep
    /// the container alive.
    pub fn from_context<C: Context + 'static>(context: &Rc<C>) -> Self {
        let context: Weak<C> = Rc::downgrade(context);
        Self::new(move || {
            context
                .upgrade()
                .ok_or(Error::NilContext)?
                .get_typed::<T>()
        })
    }

    /// Resolves the bean. The container caches it, so subsequent calls return the same instance.
    pub fn get(&self) -> Result<BeanPtr<T>, Error> {
        (self.resolver)()
    }

    /// Resolves the bean, panicking on error.
    pub fn require(&self) -> BeanPtr<T> {
        self.get().unwrap_or_else(|error| {
            error!(%error, bean_type = std::any::type_name::<T>(), "Cannot resolve lazy bean.");
            panic!("{error}")
        })
    }
}

impl<T: Injectable + ?Sized> Default for LazyBean<T> {
    fn default() -> Self {
        Self::from_global()
    }
}

impl<T: ?Sized> Clone for LazyBean<T> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
        }
    }
}

impl<T: ?Sized> Debug for LazyBean<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyBean")
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::bean::{Injectable, TypeClass};
    use crate::context::{Context, LazyContextBuilder};
    use crate::error::Error;
    use crate::lazy::LazyBean;
    use crate::provider_registry::BeanProvider;
    use std::rc::Rc;

    struct Counter(u8);

    impl Injectable for Counter {
        fn type_class() -> TypeClass {
            TypeClass::Struct
        }
    }

    #[test]
    fn should_resolve_on_demand() {
        let context = Rc::new(LazyContextBuilder::new().build().unwrap());
        let lazy = LazyBean::<Counter>::from_context(&context);

        assert!(matches!(lazy.get(), Err(Error::InjectNotSupported(_))));

        context
            .register(BeanProvider::new::<Counter, _>(|_| Ok(Counter(5))))
            .unwrap();

        let first = lazy.get().unwrap();
        let second = lazy.clone().require();
        assert_eq!(first.0, 5);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn should_fail_after_context_is_dropped() {
        let context = Rc::new(LazyContextBuilder::new().build().unwrap());
        let lazy = LazyBean::<Counter>::from_context(&context);
        drop(context);

        assert!(matches!(lazy.get(), Err(Error::NilContext)));
    }

    #[test]
    #[should_panic]
    fn should_panic_on_require_failure() {
        LazyBean::<Counter>::new(|| Err(Error::NilContext)).require();
    }
}
