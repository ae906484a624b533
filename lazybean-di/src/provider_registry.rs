//! Functionality related to registering [BeanProvider]s - recipes for creating beans, keyed by bean
//! type and name. Providers can be registered manually or automatically, at compile time, with the
//! `#[provider]` and `#[bean_alias]` attributes.
//!
//! Lookup is exact: a provider registered under a name is never returned for an unqualified
//! request, and vice versa.

use crate::bean::{BeanCast, BeanKey, BeanType, Injectable};
use crate::context::{BeanAnyPtr, BeanPtr, Context};
use crate::error::Error;
use crate::provider_registry::internal::ProviderRegisterer;
use crate::provider_registry::registry::ProviderMap;
use itertools::Itertools;
#[cfg(test)]
use mockall::automock;
use std::any::type_name;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use tracing::debug;

/// Type-erased builder function.
pub type BuilderFn = Rc<dyn Fn(&dyn Context) -> Result<BeanAnyPtr, Error>>;

/// Casts a bean of the redirect target type into the alias type.
pub type CastFn = fn(BeanAnyPtr) -> Result<BeanAnyPtr, Error>;

/// How a provider produces its bean.
#[derive(Clone)]
pub enum ProviderKind {
    /// Call the builder function.
    Builder(BuilderFn),
    /// Call the builder function, which creates a bean of the target type, and view the result as
    /// the provider's bean type. The bean is closed as the target type.
    BuildAs {
        builder: BuilderFn,
        target: BeanType,
        cast: CastFn,
    },
    /// Resolve an existing bean of the target type with the same name, and view it as the
    /// provider's bean type.
    UseExisting { target: BeanType, cast: CastFn },
}

impl Debug for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builder(_) => f.write_str("Builder"),
            Self::BuildAs { target, .. } => f
                .debug_struct("BuildAs")
                .field("target", &target.type_name)
                .finish_non_exhaustive(),
            Self::UseExisting { target, .. } => f
                .debug_struct("UseExisting")
                .field("target", &target.type_name)
                .finish_non_exhaustive(),
        }
    }
}

/// A recipe for a bean registered for a given type and name.
#[derive(Clone, Debug)]
pub struct BeanProvider {
    pub bean_type: BeanType,
    pub bean_name: String,
    pub kind: ProviderKind,
    /// Whether the container owns the created bean and should close it.
    pub hold_by_context: bool,
}

impl BeanProvider {
    /// Creates an unnamed provider calling the given builder. The created bean is owned by the
    /// container.
    pub fn new<T: Injectable + ?Sized, R: Into<BeanPtr<T>>>(
        builder: impl Fn(&dyn Context) -> Result<R, Error> + 'static,
    ) -> Self {
        let builder: BuilderFn = Rc::new(move |context: &dyn Context| {
            builder(context).map(|bean| Rc::new(bean.into()) as BeanAnyPtr)
        });

        Self {
            bean_type: BeanType::of::<T>(),
            bean_name: String::new(),
            kind: ProviderKind::Builder(builder),
            hold_by_context: true,
        }
    }

    /// Creates an unnamed provider for `Alias`, calling a builder of the concrete `Target` bean.
    /// Unlike [BeanProvider::new] with an interface type, the bean is closed through `Target`.
    pub fn new_as<
        Alias: BeanCast<Target> + ?Sized,
        Target: Injectable + ?Sized,
        R: Into<BeanPtr<Target>>,
    >(
        builder: impl Fn(&dyn Context) -> Result<R, Error> + 'static,
    ) -> Self {
        let builder: BuilderFn = Rc::new(move |context: &dyn Context| {
            builder(context).map(|bean| Rc::new(bean.into()) as BeanAnyPtr)
        });

        Self {
            bean_type: BeanType::of::<Alias>(),
            bean_name: String::new(),
            kind: ProviderKind::BuildAs {
                builder,
                target: BeanType::of::<Target>(),
                cast: cast_existing::<Alias, Target>,
            },
            hold_by_context: true,
        }
    }

    /// Creates a provider which always returns the given, user-created bean. Such bean is never
    /// closed by the container.
    pub fn instance<T: Injectable + ?Sized>(bean: BeanPtr<T>) -> Self {
        Self::new::<T, BeanPtr<T>>(move |_| Ok(bean.clone())).hold_by_user()
    }

    /// Creates a redirect: requests for `Alias` are served by resolving `Target` with the same
    /// name and casting the result.
    pub fn use_existing<Alias: BeanCast<Target> + ?Sized, Target: Injectable + ?Sized>() -> Self {
        Self {
            bean_type: BeanType::of::<Alias>(),
            bean_name: String::new(),
            kind: ProviderKind::UseExisting {
                target: BeanType::of::<Target>(),
                cast: cast_existing::<Alias, Target>,
            },
            hold_by_context: false,
        }
    }

    pub fn with_name<N: Into<String>>(mut self, name: N) -> Self {
        self.bean_name = name.into();
        self
    }

    /// Marks the created bean as owned by the user - it will not be closed with the container.
    pub fn hold_by_user(mut self) -> Self {
        self.hold_by_context = false;
        self
    }

    pub fn key(&self) -> BeanKey {
        BeanKey::new(self.bean_type, self.bean_name.clone())
    }
}

fn cast_existing<Alias: BeanCast<Target> + ?Sized, Target: Injectable + ?Sized>(
    bean: BeanAnyPtr,
) -> Result<BeanAnyPtr, Error> {
    let target = bean
        .downcast_ref::<BeanPtr<Target>>()
        .cloned()
        .ok_or(Error::IncompatibleBean {
            expected: type_name::<Target>(),
            resolved_for: type_name::<Alias>(),
        })?;

    Ok(Rc::new(Alias::cast(target)) as BeanAnyPtr)
}

/// A registry of [BeanProvider]s consulted by the container when resolving beans.
#[cfg_attr(test, automock)]
pub trait ProviderRegistry {
    /// Adds a provider for its key. Note: handling of duplicate keys is registry-dependent.
    fn register(&mut self, provider: BeanProvider) -> Result<(), Error>;

    /// Returns the provider registered for exactly the given key.
    fn provider(&self, key: &BeanKey) -> Option<BeanProvider>;

    /// Checks if given key has a registered provider.
    fn is_registered(&self, key: &BeanKey) -> bool;
}

/// Registry of providers initialized from statically registered providers.
#[derive(Clone, Debug)]
pub struct StaticProviderRegistry {
    providers: ProviderMap,
}

impl StaticProviderRegistry {
    /// Creates a registry with all providers submitted at compile time. If overriding is
    /// disallowed, duplicate keys result in [Error::DuplicateProvider].
    pub fn new(allow_provider_overriding: bool) -> Result<Self, Error> {
        let static_providers = inventory::iter::<ProviderRegisterer>
            .into_iter()
            .map(|registerer| (registerer.register)())
            .collect_vec();

        let mut providers = ProviderMap::new(allow_provider_overriding);
        for provider in static_providers {
            debug!(key = %provider.key(), "Registering static provider.");
            providers.register(provider)?;
        }

        Ok(Self { providers })
    }
}

impl ProviderRegistry for StaticProviderRegistry {
    #[inline]
    fn register(&mut self, provider: BeanProvider) -> Result<(), Error> {
        self.providers.register(provider)
    }

    #[inline]
    fn provider(&self, key: &BeanKey) -> Option<BeanProvider> {
        self.providers.provider(key)
    }

    #[inline]
    fn is_registered(&self, key: &BeanKey) -> bool {
        self.providers.is_registered(key)
    }
}

pub mod registry {
    use crate::bean::BeanKey;
    use crate::error::Error;
    use crate::provider_registry::{BeanProvider, ProviderRegistry};
    use fxhash::FxHashMap;

    /// Plain map of providers, without any static registration.
    #[derive(Clone, Debug)]
    pub struct ProviderMap {
        providers: FxHashMap<BeanKey, BeanProvider>,
        allow_provider_overriding: bool,
    }

    impl ProviderMap {
        pub fn new(allow_provider_overriding: bool) -> Self {
            Self {
                providers: Default::default(),
                allow_provider_overriding,
            }
        }

        pub fn len(&self) -> usize {
            self.providers.len()
        }

        pub fn is_empty(&self) -> bool {
            self.providers.is_empty()
        }
    }

    impl Default for ProviderMap {
        fn default() -> Self {
            Self::new(true)
        }
    }

    impl ProviderRegistry for ProviderMap {
        fn register(&mut self, provider: BeanProvider) -> Result<(), Error> {
            let key = provider.key();
            if !self.allow_provider_overriding && self.providers.contains_key(&key) {
                return Err(Error::DuplicateProvider(key));
            }

            self.providers.insert(key, provider);
            Ok(())
        }

        #[inline]
        fn provider(&self, key: &BeanKey) -> Option<BeanProvider> {
            self.providers.get(key).cloned()
        }

        #[inline]
        fn is_registered(&self, key: &BeanKey) -> bool {
            self.providers.contains_key(key)
        }
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::provider_registry::BeanProvider;
    use inventory::collect;
    pub use inventory::submit;

    pub struct ProviderRegisterer {
        pub register: fn() -> BeanProvider,
    }

    collect!(ProviderRegisterer);
}
