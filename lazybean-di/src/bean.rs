//! One of the basic blocks of dependency injection is a bean. Beans are injectable objects, which
//! themselves can contain dependencies to other beans or configuration values.
//!
//! ## Defining beans
//!
//! Any struct which wants to be auto-constructed by the container needs to implement [Bean]. For
//! convenience, the trait can be automatically derived with all infrastructure if the `derive`
//! feature is enabled:
//!
//! ```
//! use lazybean_di::context::BeanPtr;
//! use lazybean_di::{injectable, bean_alias, Bean};
//!
//! #[injectable]
//! trait Greeter {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Bean)]
//! struct EnglishGreeter;
//!
//! #[bean_alias]
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! #[derive(Bean)]
//! struct Application {
//!     // concrete bean dependency
//!     greeter: BeanPtr<EnglishGreeter>,
//!     // interface dependency, resolved through the alias above
//!     any_greeter: BeanPtr<dyn Greeter>,
//!     // configuration value read from "app.name"
//!     #[bean(tag = "path=app.name")]
//!     name: String,
//!     // configuration value with a fallback
//!     #[bean(tag = "path=app.retries", default = "default_retries")]
//!     retries: u8,
//!     // never injected
//!     #[bean(tag = "ignore")]
//!     counter: u32,
//! }
//!
//! fn default_retries() -> u8 {
//!     3
//! }
//! ```
//!
//! ### Supported `#[bean]` struct configuration
//!
//! * `closeable` - the bean implements [Closeable] and should be closed together with the container
//! * `setters` - use the [BeanSetters] table generated by `#[bean_setters]` for setter-injected
//! fields
//!
//! Traits extending [Closeable] can be declared `#[injectable(closeable)]`, so that beans provided
//! for `dyn Trait` are closed as well.
//!
//! ### Supported `#[bean]` field configuration
//!
//! * `tag = "directives"` - injection directives, see [crate::tag]
//! * `default` - use `Default::default()` when the configuration value is missing
//! * `default = "expr"` - call `expr()` when the configuration value is missing
//! * `setter` - the field is not directly assignable and must be injected via `set_<field>`
//!
//! Fields which are not injected (ignored ones, function-like fields such as
//! [LazyBean](crate::lazy::LazyBean), and setter-injected fields before the setter runs) are
//! initialized with their default.
//!
//! ## Field classification
//!
//! Fields of type `BeanPtr<T>` (or `Rc<T>`) are bean dependencies, if `T` is bean-eligible
//! (a struct or an injectable trait). Function-like fields are skipped. Everything else is a
//! configuration value.

mod field;

pub use field::*;

use crate::context::{BeanAnyPtr, BeanPtr, Context};
use crate::error::{Error, ErrorPtr};
use derivative::Derivative;
use derive_more::Display;
use std::any::{type_name, TypeId};
use std::hash::{Hash, Hasher};

/// Constructor used when no provider is registered for a bean type.
pub type ConstructorFn = fn(&dyn Context) -> Result<BeanAnyPtr, Error>;

/// Closes a type-erased bean if it supports closing.
pub type CloseFn = fn(&BeanAnyPtr) -> Result<(), Error>;

/// Classification of a type for injection purposes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TypeClass {
    /// A concrete struct - can be auto-constructed.
    Struct,
    /// An abstract interface (`dyn Trait`) - requires a provider.
    Interface,
    /// A plain value - not a bean.
    Value,
}

impl TypeClass {
    /// Checks if given class can be resolved as a bean.
    #[inline]
    pub fn is_bean(self) -> bool {
        self != Self::Value
    }
}

/// Marker trait for all types which can be requested from the container.
pub trait Injectable: 'static {
    fn type_class() -> TypeClass;

    /// Entry point for auto-construction, if supported by the type.
    fn constructor() -> Option<ConstructorFn> {
        None
    }

    /// Releases resources held by the bean, when its owning container is closed. Beans
    /// implementing [Closeable] forward to it.
    fn close_bean(&self) -> Result<(), ErrorPtr> {
        Ok(())
    }
}

/// Beans are structs which can be constructed by injecting their fields. Typically derived with
/// `#[derive(Bean)]`.
pub trait Bean: Injectable + Sized {
    /// Field descriptors in declaration order.
    fn fields() -> Vec<FieldDescriptor>;

    /// Setters available for fields which are not directly assignable.
    fn setters() -> Vec<Setter<Self>> {
        Vec::new()
    }

    /// Creates the bean from injected field values. Fields which are not present in `fields` are
    /// initialized with their defaults.
    fn assemble(fields: &mut InjectedFields) -> Result<Self, Error>;
}

/// Setter table for a bean. Typically generated by the `#[bean_setters]` attribute on an impl
/// block with `set_*` methods.
pub trait BeanSetters: Sized {
    fn setters() -> Vec<Setter<Self>>;
}

/// Beans which hold resources should implement this trait, which gets called when the owning
/// container is closed. Note: only beans created by the container are closed.
pub trait Closeable {
    fn close(&self) -> Result<(), ErrorPtr>;
}

/// Helper trait for interfaces implemented by beans, thus allowing injection of beans based on
/// `dyn Trait` types. The type `Target` refers to a concrete bean type. Typically automatically
/// derived when using the `#[bean_alias]` attribute.
pub trait BeanCast<Target: ?Sized>: Injectable {
    fn cast(source: BeanPtr<Target>) -> BeanPtr<Self>;
}

/// Runtime descriptor of an injectable type.
#[derive(Clone, Copy, Derivative)]
#[derivative(Debug)]
pub struct BeanType {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub class: TypeClass,
    #[derivative(Debug = "ignore")]
    pub constructor: Option<ConstructorFn>,
    #[derivative(Debug = "ignore")]
    pub close: CloseFn,
}

impl BeanType {
    pub fn of<T: Injectable + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            class: T::type_class(),
            constructor: T::constructor(),
            close: close_any::<T>,
        }
    }
}

impl PartialEq for BeanType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for BeanType {}

impl Hash for BeanType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

fn close_any<T: Injectable + ?Sized>(bean: &BeanAnyPtr) -> Result<(), Error> {
    match bean.downcast_ref::<BeanPtr<T>>() {
        Some(bean) => T::close_bean(bean).map_err(Error::Custom),
        None => Ok(()),
    }
}

/// Identity of a bean in the container: its type and name. An empty name denotes an unqualified
/// bean.
#[derive(Clone, Debug, Display, Eq, PartialEq, Hash)]
#[display(fmt = "{}[{}]", name, "bean_type.type_name")]
pub struct BeanKey {
    pub bean_type: BeanType,
    pub name: String,
}

impl BeanKey {
    pub fn new<N: Into<String>>(bean_type: BeanType, name: N) -> Self {
        Self {
            bean_type,
            name: name.into(),
        }
    }

    pub fn of<T: Injectable + ?Sized>() -> Self {
        Self::new(BeanType::of::<T>(), "")
    }

    pub fn named<T: Injectable + ?Sized>(name: impl Into<String>) -> Self {
        Self::new(BeanType::of::<T>(), name)
    }
}

/// Checks if the given type can be resolved as a bean.
pub fn validate_type_is_bean(bean_type: &BeanType) -> Result<(), Error> {
    if bean_type.class.is_bean() {
        Ok(())
    } else {
        Err(Error::NonBeanType(bean_type.type_name.to_string()))
    }
}

macro_rules! value_injectable {
    ($($ty:ty),*) => {
        $(
            impl Injectable for $ty {
                #[inline]
                fn type_class() -> TypeClass {
                    TypeClass::Value
                }
            }
        )*
    };
}

value_injectable!(
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

impl<T: 'static> Injectable for Vec<T> {
    #[inline]
    fn type_class() -> TypeClass {
        TypeClass::Value
    }
}

impl<T: 'static> Injectable for Option<T> {
    #[inline]
    fn type_class() -> TypeClass {
        TypeClass::Value
    }
}
