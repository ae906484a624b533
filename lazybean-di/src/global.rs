//! Process-wide container facade. Before a container is activated with [use_lazy_context],
//! registrations and configuration values are queued and replayed, in order, on activation. After
//! activation they are applied immediately.
//!
//! Beans are reference counted with [Rc](std::rc::Rc), so the container cannot be shared between
//! threads - the global slot and the deferred queue are kept per thread.
//!
//! ```
//! use lazybean_di::global;
//! use lazybean_di::Bean;
//!
//! #[derive(Bean)]
//! struct Service {
//!     #[bean(tag = "path=service.timeout")]
//!     timeout: i32,
//! }
//!
//! global::set_value("service.timeout", 10);
//! global::use_lazy_context().unwrap();
//!
//! let service = global::get_bean::<Service>().unwrap();
//! assert_eq!(service.timeout, 10);
//!
//! global::close_context().unwrap();
//! ```

use crate::bean::{Bean, BeanCast, Injectable};
use crate::context::{
    BeanPtr, Context, DeferredUpdate, LazyContext, LazyContextBuilder, TypedContext,
};
use crate::error::Error;
use crate::func_provider::{FuncProviderConfig, ProviderFn, ProviderOutput};
use crate::inject::inject_new;
use crate::lazy::LazyBean;
use crate::provider_registry::BeanProvider;
use crate::settings::ContainerSettings;
use std::any::type_name;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{error, info};

thread_local! {
    static GLOBAL_CONTEXT: RefCell<Option<Rc<LazyContext>>> = RefCell::new(None);
    static DEFERRED_UPDATES: RefCell<Vec<DeferredUpdate>> = RefCell::new(Vec::new());
}

fn global_context() -> Result<Rc<LazyContext>, Error> {
    GLOBAL_CONTEXT.with(|slot| slot.borrow().clone().ok_or(Error::NilContext))
}

fn is_active() -> bool {
    GLOBAL_CONTEXT.with(|slot| slot.borrow().is_some())
}

fn apply_or_defer(update: DeferredUpdate) -> Result<(), Error> {
    match global_context() {
        Ok(context) => update(&*context as &dyn Context),
        Err(_) => {
            DEFERRED_UPDATES.with(|updates| updates.borrow_mut().push(update));
            Ok(())
        }
    }
}

/// Activates the global container with settings read from the environment. See
/// [use_lazy_context_with].
pub fn use_lazy_context() -> Result<(), Error> {
    use_lazy_context_with(ContainerSettings::init_from_environment()?)
}

/// Activates the global container: creates it with all statically registered providers, then
/// applies all deferred updates in order. The deferred queue is emptied even if an update fails.
pub fn use_lazy_context_with(settings: ContainerSettings) -> Result<(), Error> {
    if is_active() {
        return Err(Error::ContextAlreadyExists);
    }

    settings.install_tracing_logger();

    let updates = DEFERRED_UPDATES.with(|updates| std::mem::take(&mut *updates.borrow_mut()));
    let update_count = updates.len();

    let context = LazyContextBuilder::from_settings(&settings)?
        .with_updates(updates)
        .build()?;
    context.init();

    GLOBAL_CONTEXT.with(|slot| *slot.borrow_mut() = Some(Rc::new(context)));

    info!(update_count, "Lazy context activated.");
    Ok(())
}

/// Closes all beans owned by the global container and discards it.
pub fn close_context() -> Result<(), Error> {
    let context = GLOBAL_CONTEXT
        .with(|slot| slot.borrow_mut().take())
        .ok_or(Error::NilContext)?;

    let result = context.close();
    info!("Lazy context closed.");

    result
}

/// Discards the global container without closing it, along with any deferred updates.
pub fn reset() {
    GLOBAL_CONTEXT.with(|slot| slot.borrow_mut().take());
    DEFERRED_UPDATES.with(|updates| updates.borrow_mut().clear());
}

/// Runs given function with the active global container.
pub fn with_context<R>(f: impl FnOnce(&dyn Context) -> R) -> Result<R, Error> {
    let context = global_context()?;
    Ok(f(&*context as &dyn Context))
}

/// Registers a provider, or defers the registration until activation.
pub fn set_bean_provider(provider: BeanProvider) -> Result<(), Error> {
    let key = provider.key();
    apply_or_defer(Box::new(move |context| context.register(provider)))?;

    info!(%key, "Provided bean.");
    Ok(())
}

/// Registers a function provider, or defers the registration until activation. See
/// [BeanProvider::from_fn].
pub fn set_bean_provider_fn<T: Injectable, Args: 'static, R: ProviderOutput<T> + 'static>(
    function: impl ProviderFn<Args, R>,
    config: FuncProviderConfig,
) -> Result<(), Error> {
    set_bean_provider(BeanProvider::from_fn::<T, Args, R>(function, config))
}

/// Registers a function provider of `Target` for `Alias`, or defers the registration until
/// activation. See [BeanProvider::from_fn_as].
pub fn set_bean_provider_fn_as<
    Alias: BeanCast<Target> + ?Sized,
    Target: Injectable,
    Args: 'static,
    R: ProviderOutput<Target> + 'static,
>(
    function: impl ProviderFn<Args, R>,
    config: FuncProviderConfig,
) -> Result<(), Error> {
    set_bean_provider(BeanProvider::from_fn_as::<Alias, Target, Args, R>(
        function, config,
    ))
}

/// Makes `Alias` requests resolve to the bean of type `Target` with the same name.
pub fn provide_as_existing_bean<Alias: BeanCast<Target> + ?Sized, Target: Injectable + ?Sized>(
) -> Result<(), Error> {
    set_bean_provider(BeanProvider::use_existing::<Alias, Target>())
}

/// Sets a configuration value, or defers it until activation.
pub fn set_value<P: Into<String>, T: 'static>(path: P, value: T) {
    let path = path.into();
    let update: DeferredUpdate = Box::new(move |context| {
        context.set_value(&path, value);
        Ok(())
    });

    // setting a value cannot fail
    let _ = apply_or_defer(update);
}

pub fn get_bean<T: Injectable + ?Sized>() -> Result<BeanPtr<T>, Error> {
    global_context()?.get_typed::<T>()
}

pub fn get_named_bean<T: Injectable + ?Sized>(name: &str) -> Result<BeanPtr<T>, Error> {
    global_context()?.get_named_typed::<T>(name)
}

/// Returns the bean, or `default` on any error.
pub fn get_bean_or_default<T: Injectable + ?Sized>(default: BeanPtr<T>) -> BeanPtr<T> {
    get_bean::<T>().unwrap_or(default)
}

/// Returns the named bean, or `default` on any error.
pub fn get_named_bean_or_default<T: Injectable + ?Sized>(
    name: &str,
    default: BeanPtr<T>,
) -> BeanPtr<T> {
    get_named_bean::<T>(name).unwrap_or(default)
}

pub fn get_value<T: Clone + 'static>(path: &str) -> Result<T, Error> {
    global_context()?
        .get_value::<T>(path)
        .map_err(|error| match error {
            Error::NoValueFound(_) => error.with_context("failed to get value by path"),
            error => error,
        })
}

/// Returns the value, or `default` on any error.
pub fn get_value_or_default<T: Clone + 'static>(path: &str, default: T) -> T {
    get_value(path).unwrap_or(default)
}

/// Creates a new, uncached instance of `T` with its fields injected from the global container.
/// Useful for objects which are not beans themselves, but depend on beans and values.
pub fn inject<T: Bean>() -> Result<T, Error> {
    inject_new::<T>(&*global_context()?)
}

/// Creates an accessor resolving the bean from the global container on demand.
pub fn new_lazy_bean<T: Injectable + ?Sized>() -> LazyBean<T> {
    LazyBean::from_global()
}

fn fail<T: ?Sized>(error: Error) -> ! {
    error!(%error, bean_type = type_name::<T>(), "Required injectable is not available.");
    panic!("{error}")
}

/// Returns the bean, panicking on error.
pub fn require_bean<T: Injectable + ?Sized>() -> BeanPtr<T> {
    get_bean::<T>().unwrap_or_else(|error| fail::<T>(error))
}

/// Returns the named bean, panicking on error.
pub fn require_named_bean<T: Injectable + ?Sized>(name: &str) -> BeanPtr<T> {
    get_named_bean::<T>(name).unwrap_or_else(|error| fail::<T>(error))
}

/// Returns the value, panicking on error.
pub fn require_value<T: Clone + 'static>(path: &str) -> T {
    get_value(path).unwrap_or_else(|error| fail::<T>(error))
}

#[cfg(test)]
mod tests {
    use crate::bean::{
        Bean, BeanCast, Closeable, FieldDescriptor, InjectedFields, Injectable, TypeClass,
    };
    use crate::context::{BeanPtr, TypedContext};
    use crate::error::{Error, ErrorPtr};
    use crate::func_provider::FuncProviderConfig;
    use crate::global;
    use crate::provider_registry::BeanProvider;
    use crate::settings::ContainerSettings;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Resource {
        closed: Cell<u8>,
    }

    impl Injectable for Resource {
        fn type_class() -> TypeClass {
            TypeClass::Struct
        }

        fn close_bean(&self) -> Result<(), ErrorPtr> {
            Closeable::close(self)
        }
    }

    impl Closeable for Resource {
        fn close(&self) -> Result<(), ErrorPtr> {
            self.closed.set(self.closed.get() + 1);
            Ok(())
        }
    }

    trait Handle {
        fn closed(&self) -> u8;
    }

    impl Handle for Resource {
        fn closed(&self) -> u8 {
            self.closed.get()
        }
    }

    impl Injectable for dyn Handle {
        fn type_class() -> TypeClass {
            TypeClass::Interface
        }
    }

    impl BeanCast<Resource> for dyn Handle {
        fn cast(source: BeanPtr<Resource>) -> BeanPtr<Self> {
            source
        }
    }

    struct Worker {
        resource: BeanPtr<Resource>,
        threads: u8,
    }

    impl Injectable for Worker {
        fn type_class() -> TypeClass {
            TypeClass::Struct
        }
    }

    impl Bean for Worker {
        fn fields() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::bean::<Resource>("resource"),
                FieldDescriptor::value::<u8>("threads").with_tag("path=worker.threads"),
            ]
        }

        fn assemble(fields: &mut InjectedFields) -> Result<Self, Error> {
            Ok(Self {
                resource: fields.take_bean::<Resource>("resource")?,
                threads: fields.take_value::<u8>("threads")?,
            })
        }
    }

    fn activate() {
        global::use_lazy_context_with(ContainerSettings::default()).unwrap();
    }

    #[test]
    fn should_fail_without_context() {
        global::reset();

        assert!(matches!(global::get_bean::<Resource>(), Err(Error::NilContext)));
        assert!(matches!(global::get_value::<i32>("a"), Err(Error::NilContext)));
        assert!(matches!(global::close_context(), Err(Error::NilContext)));
        assert!(matches!(
            global::with_context(|_| ()),
            Err(Error::NilContext)
        ));
    }

    #[test]
    fn should_reject_second_activation() {
        global::reset();
        activate();

        assert!(matches!(
            global::use_lazy_context_with(ContainerSettings::default()),
            Err(Error::ContextAlreadyExists)
        ));
    }

    #[test]
    fn should_replay_deferred_updates() {
        global::reset();
        global::set_value("a", 1);
        global::set_value("a", 2);
        global::set_bean_provider(BeanProvider::new::<Resource, _>(|_| {
            Ok(Resource::default())
        }))
        .unwrap();
        global::provide_as_existing_bean::<dyn Handle, Resource>().unwrap();
        activate();

        assert_eq!(global::get_value::<i32>("a").unwrap(), 2);
        assert_eq!(global::get_bean::<dyn Handle>().unwrap().closed(), 0);

        // deferred updates are replayed exactly once
        global::close_context().unwrap();
        activate();
        assert!(matches!(
            global::get_value::<i32>("a").unwrap_err().root_cause(),
            Error::NoValueFound(_)
        ));
    }

    #[test]
    fn should_apply_updates_immediately_when_active() {
        global::reset();
        activate();

        global::set_value("b", "text".to_string());
        global::set_bean_provider_fn::<Resource, _, _>(Resource::default, FuncProviderConfig::new())
            .unwrap();

        assert_eq!(global::require_value::<String>("b"), "text");
        assert!(global::get_bean::<Resource>().is_ok());
        assert_eq!(
            global::with_context(|context| context.get_value::<String>("b").unwrap()).unwrap(),
            "text"
        );
    }

    #[test]
    fn should_close_owned_beans() {
        global::reset();
        global::set_bean_provider(BeanProvider::new::<Resource, _>(|_| {
            Ok(Resource::default())
        }))
        .unwrap();
        activate();

        let resource = global::require_bean::<Resource>();
        global::close_context().unwrap();

        assert_eq!(resource.closed.get(), 1);
        assert!(matches!(global::close_context(), Err(Error::NilContext)));
    }

    #[test]
    fn should_fall_back_to_defaults() {
        global::reset();
        activate();

        let default = Rc::new(Resource::default());
        let resource = global::get_named_bean_or_default::<Resource>("missing", default.clone());
        assert!(Rc::ptr_eq(&resource, &default));
        assert_eq!(global::get_value_or_default("missing", 5), 5);
    }

    #[test]
    #[should_panic(expected = "no bean provider found")]
    fn should_panic_on_missing_required_bean() {
        global::reset();
        activate();

        global::require_named_bean::<Resource>("missing");
    }

    #[test]
    fn should_inject_new_instances() {
        global::reset();
        assert!(matches!(global::inject::<Worker>(), Err(Error::NilContext)));

        global::set_value("worker.threads", 4u8);
        global::set_bean_provider(BeanProvider::new::<Resource, _>(|_| {
            Ok(Resource::default())
        }))
        .unwrap();
        activate();

        let first = global::inject::<Worker>().unwrap();
        let second = global::inject::<Worker>().unwrap();
        assert_eq!(first.threads, 4);
        assert!(Rc::ptr_eq(&first.resource, &second.resource));
        assert!(Rc::ptr_eq(
            &first.resource,
            &global::require_bean::<Resource>()
        ));
    }

    #[test]
    fn should_close_function_provided_interface() {
        global::reset();
        global::set_bean_provider_fn_as::<dyn Handle, Resource, _, _>(
            Resource::default,
            FuncProviderConfig::new(),
        )
        .unwrap();
        activate();

        let handle = global::require_bean::<dyn Handle>();
        global::close_context().unwrap();

        assert_eq!(handle.closed(), 1);
    }
}
