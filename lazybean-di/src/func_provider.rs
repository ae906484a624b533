//! Providers created from plain functions. Each function parameter is resolved from the container:
//! bean pointers by type, other values from the configuration store at a per-position path.
//!
//! ```
//! use lazybean_di::context::BeanPtr;
//! use lazybean_di::func_provider::FuncProviderConfig;
//! use lazybean_di::provider_registry::BeanProvider;
//! use lazybean_di::Bean;
//!
//! #[derive(Bean)]
//! struct Client {
//!     #[bean(tag = "ignore")]
//!     address: String,
//! }
//!
//! fn new_client(address: String, port: u16) -> Client {
//!     Client {
//!         address: format!("{address}:{port}"),
//!     }
//! }
//!
//! let provider = BeanProvider::from_fn::<Client, _, _>(
//!     new_client,
//!     FuncProviderConfig::new()
//!         .with_value_path_at(0, "client.address")
//!         .with_default_at(1, 8080u16),
//! );
//! ```

use crate::bean::{BeanCast, Injectable};
use crate::context::{BeanPtr, Context, TypedContext};
use crate::error::Error;
use crate::provider_registry::BeanProvider;
use crate::value_store::AnyValue;
use fxhash::FxHashMap;

/// Resolution settings for a single function parameter.
#[derive(Clone, Debug, Default)]
pub struct ParameterConfig {
    /// Configuration path for value parameters.
    pub value_path: String,
    /// Used when nothing is provided for the parameter.
    pub default_value: Option<AnyValue>,
}

/// Configuration of a function provider.
#[derive(Clone, Debug, Default)]
pub struct FuncProviderConfig {
    bean_name: String,
    parameters: FxHashMap<usize, ParameterConfig>,
}

impl FuncProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the provider under given bean name.
    pub fn with_bean_name<N: Into<String>>(mut self, bean_name: N) -> Self {
        self.bean_name = bean_name.into();
        self
    }

    /// Sets the configuration path for the parameter at given position.
    pub fn with_value_path_at<P: Into<String>>(mut self, index: usize, path: P) -> Self {
        self.parameters.entry(index).or_default().value_path = path.into();
        self
    }

    /// Sets the default for the parameter at given position. The default must have exactly the
    /// parameter type.
    pub fn with_default_at<V: 'static>(mut self, index: usize, value: V) -> Self {
        self.parameters.entry(index).or_default().default_value = Some(AnyValue::new(value));
        self
    }

    #[inline]
    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    pub fn parameter(&self, index: usize) -> ParameterConfig {
        self.parameters.get(&index).cloned().unwrap_or_default()
    }
}

/// A function parameter which can be resolved from a [Context].
pub trait Parameter: Sized + 'static {
    fn resolve(context: &dyn Context, config: &ParameterConfig) -> Result<Self, Error>;
}

impl<T: Injectable + ?Sized> Parameter for BeanPtr<T> {
    fn resolve(context: &dyn Context, config: &ParameterConfig) -> Result<Self, Error> {
        match context.get_typed::<T>() {
            Err(error) if error.is_no_injectable_provided() => match &config.default_value {
                Some(default) => default.cast(&config.value_path),
                None => Err(error),
            },
            result => result,
        }
    }
}

fn resolve_value<T: Clone + 'static>(
    context: &dyn Context,
    config: &ParameterConfig,
) -> Result<T, Error> {
    match context.get_generic_value(&config.value_path) {
        Ok(value) => value.cast(&config.value_path),
        Err(error @ Error::NoValueFound(_)) => match &config.default_value {
            Some(default) => default.cast(&config.value_path),
            None => Err(error),
        },
        Err(error) => Err(error),
    }
}

macro_rules! value_parameter {
    ($($ty:ty),*) => {
        $(
            impl Parameter for $ty {
                #[inline]
                fn resolve(context: &dyn Context, config: &ParameterConfig) -> Result<Self, Error> {
                    resolve_value(context, config)
                }
            }
        )*
    };
}

value_parameter!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str
);

impl<T: Clone + 'static> Parameter for Vec<T> {
    #[inline]
    fn resolve(context: &dyn Context, config: &ParameterConfig) -> Result<Self, Error> {
        resolve_value(context, config)
    }
}

/// Return type of a provider function: either the bean itself or a `Result` with it.
pub trait ProviderOutput<T> {
    fn into_bean(self) -> Result<T, Error>;
}

impl<T> ProviderOutput<T> for T {
    #[inline]
    fn into_bean(self) -> Result<T, Error> {
        Ok(self)
    }
}

impl<T> ProviderOutput<T> for Result<T, Error> {
    #[inline]
    fn into_bean(self) -> Result<T, Error> {
        self
    }
}

/// Functions which can be used as bean providers.
pub trait ProviderFn<Args, R>: 'static {
    fn call(&self, context: &dyn Context, config: &FuncProviderConfig) -> Result<R, Error>;
}

fn resolve_argument<A: Parameter>(
    context: &dyn Context,
    config: &FuncProviderConfig,
    index: usize,
) -> Result<A, Error> {
    A::resolve(context, &config.parameter(index))
        .map_err(|error| error.with_context(format!("failed to find arg at index {index}")))
}

macro_rules! provider_fn {
    ($($arg:ident $index:tt),*) => {
        impl<F, R, $($arg,)*> ProviderFn<($($arg,)*), R> for F
        where
            F: Fn($($arg),*) -> R + 'static,
            $($arg: Parameter,)*
        {
            #[allow(unused_variables)]
            fn call(&self, context: &dyn Context, config: &FuncProviderConfig) -> Result<R, Error> {
                Ok(self($(resolve_argument::<$arg>(context, config, $index)?),*))
            }
        }
    };
}

provider_fn!();
provider_fn!(A0 0);
provider_fn!(A0 0, A1 1);
provider_fn!(A0 0, A1 1, A2 2);
provider_fn!(A0 0, A1 1, A2 2, A3 3);
provider_fn!(A0 0, A1 1, A2 2, A3 3, A4 4);
provider_fn!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
provider_fn!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6);
provider_fn!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7);

impl BeanProvider {
    /// Creates a provider calling given function with its parameters resolved from the container.
    /// The function can return either the bean or `Result<bean, Error>`.
    pub fn from_fn<T: Injectable, Args: 'static, R: ProviderOutput<T> + 'static>(
        function: impl ProviderFn<Args, R>,
        config: FuncProviderConfig,
    ) -> Self {
        let bean_name = config.bean_name().to_string();
        Self::new::<T, T>(move |context| function.call(context, &config)?.into_bean())
            .with_name(bean_name)
    }

    /// Like [BeanProvider::from_fn], but registers the returned `Target` bean as `Alias`,
    /// typically a `dyn Trait`. The bean is closed as `Target`.
    pub fn from_fn_as<
        Alias: BeanCast<Target> + ?Sized,
        Target: Injectable,
        Args: 'static,
        R: ProviderOutput<Target> + 'static,
    >(
        function: impl ProviderFn<Args, R>,
        config: FuncProviderConfig,
    ) -> Self {
        let bean_name = config.bean_name().to_string();
        Self::new_as::<Alias, Target, Target>(move |context| {
            function.call(context, &config)?.into_bean()
        })
        .with_name(bean_name)
    }
}

#[cfg(test)]
mod tests {
    use crate::bean::{BeanCast, BeanKey, Injectable, TypeClass};
    use crate::context::{BeanAnyPtr, BeanPtr, Context, MockContext, TypedContext};
    use crate::error::Error;
    use crate::func_provider::FuncProviderConfig;
    use crate::provider_registry::{BeanProvider, ProviderKind};
    use crate::value_store::AnyValue;

    struct Dependency(i32);

    impl Injectable for Dependency {
        fn type_class() -> TypeClass {
            TypeClass::Struct
        }
    }

    #[derive(Debug)]
    struct Service {
        name: String,
        port: u16,
        dependency: i32,
    }

    impl Injectable for Service {
        fn type_class() -> TypeClass {
            TypeClass::Struct
        }
    }

    trait Named {
        fn name(&self) -> &str;
    }

    impl Named for Service {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl Injectable for dyn Named {
        fn type_class() -> TypeClass {
            TypeClass::Interface
        }
    }

    impl BeanCast<Service> for dyn Named {
        fn cast(source: BeanPtr<Service>) -> BeanPtr<Self> {
            source
        }
    }

    fn new_service(name: String, port: u16, dependency: BeanPtr<Dependency>) -> Service {
        Service {
            name,
            port,
            dependency: dependency.0,
        }
    }

    fn new_failing_service() -> Result<Service, Error> {
        Err(Error::InjectNotSupported("failing".to_string()))
    }

    fn call_provider(provider: BeanProvider, context: &dyn Context) -> Result<BeanPtr<Service>, Error> {
        let ProviderKind::Builder(builder) = provider.kind else {
            panic!("expected a builder");
        };

        builder(context).map(|bean| {
            bean.downcast_ref::<BeanPtr<Service>>()
                .cloned()
                .expect("bean of wrong type")
        })
    }

    fn dependency_context() -> MockContext {
        let mut context = MockContext::new();
        context
            .expect_get()
            .returning(|_| Ok(BeanPtr::new(BeanPtr::new(Dependency(42))) as BeanAnyPtr));
        context
    }

    #[test]
    fn should_resolve_parameters() {
        let mut context = dependency_context();
        context
            .expect_get_generic_value()
            .returning(|path: &str| match path {
                "service.name" => Ok(AnyValue::new("svc".to_string())),
                path => Err(Error::NoValueFound(path.to_string())),
            });

        let provider = BeanProvider::from_fn::<Service, _, _>(
            new_service,
            FuncProviderConfig::new()
                .with_bean_name("service")
                .with_value_path_at(0, "service.name")
                .with_value_path_at(1, "service.port")
                .with_default_at(1, 80u16),
        );
        assert_eq!(provider.key(), BeanKey::named::<Service>("service"));

        let service = call_provider(provider, &context).unwrap();
        assert_eq!(service.name, "svc");
        assert_eq!(service.port, 80);
        assert_eq!(service.dependency, 42);
    }

    #[test]
    fn should_wrap_argument_errors() {
        let mut context = dependency_context();
        context
            .expect_get_generic_value()
            .returning(|path: &str| Err(Error::NoValueFound(path.to_string())));

        let provider = BeanProvider::from_fn::<Service, _, _>(
            new_service,
            FuncProviderConfig::new().with_value_path_at(0, "service.name"),
        );

        let error = call_provider(provider, &context).unwrap_err();
        assert!(error.to_string().starts_with("failed to find arg at index 0"));
        assert!(matches!(error.root_cause(), Error::NoValueFound(path) if path == "service.name"));
    }

    #[test]
    fn should_use_default_bean() {
        let mut context = MockContext::new();
        context
            .expect_get()
            .returning(|bean_type| Err(Error::NoBeanProvider(BeanKey::new(*bean_type, ""))));
        context
            .expect_get_generic_value()
            .returning(|_| Ok(AnyValue::new(1u16)));

        let provider = BeanProvider::from_fn::<Service, _, _>(
            |port: u16, dependency: BeanPtr<Dependency>| Service {
                name: String::new(),
                port,
                dependency: dependency.0,
            },
            FuncProviderConfig::new()
                .with_value_path_at(0, "port")
                .with_default_at(1, BeanPtr::new(Dependency(7))),
        );

        let service = call_provider(provider, &context).unwrap();
        assert_eq!(service.port, 1);
        assert_eq!(service.dependency, 7);
    }

    #[test]
    fn should_forward_function_errors() {
        let context = MockContext::new();
        let provider =
            BeanProvider::from_fn::<Service, _, _>(new_failing_service, FuncProviderConfig::new());

        assert!(matches!(
            call_provider(provider, &context),
            Err(Error::InjectNotSupported(_))
        ));
    }

    #[test]
    fn should_resolve_through_context() {
        let context = crate::context::LazyContextBuilder::new().build().unwrap();
        context.set_value("service.name", "from store".to_string());
        context
            .register(BeanProvider::new::<Dependency, _>(|_| Ok(Dependency(3))))
            .unwrap();
        context
            .register(BeanProvider::from_fn::<Service, _, _>(
                new_service,
                FuncProviderConfig::new()
                    .with_value_path_at(0, "service.name")
                    .with_default_at(1, 1u16),
            ))
            .unwrap();

        let service = context.get_typed::<Service>().unwrap();
        assert_eq!(service.name, "from store");
        assert_eq!(service.dependency, 3);
    }

    #[test]
    fn should_provide_interface_from_fn() {
        let context = crate::context::LazyContextBuilder::new().build().unwrap();
        context.set_value("service.name", "named".to_string());
        context
            .register(BeanProvider::new::<Dependency, _>(|_| Ok(Dependency(1))))
            .unwrap();
        context
            .register(BeanProvider::from_fn_as::<dyn Named, Service, _, _>(
                new_service,
                FuncProviderConfig::new()
                    .with_bean_name("main")
                    .with_value_path_at(0, "service.name")
                    .with_default_at(1, 1u16),
            ))
            .unwrap();

        let named = context.get_named_typed::<dyn Named>("main").unwrap();
        assert_eq!(named.name(), "named");
        assert!(context.get_named_typed::<Service>("main").is_err());
    }
}
