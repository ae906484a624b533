use crate::bean::{BeanType, Injectable, TypeClass};
use crate::context::BeanPtr;
use crate::error::Error;
use crate::value_store::AnyValue;
use derivative::Derivative;
use fxhash::FxHashMap;
use std::any::{type_name, TypeId};
use std::marker::PhantomData;

/// Produces a default value for a value field, when the configuration store has none.
pub type DefaultValueFn = fn() -> AnyValue;

/// What kind of injection a field receives.
#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    /// Resolved from the container by type (and optionally name).
    Bean(BeanType),
    /// Read from the configuration store.
    Value {
        type_id: TypeId,
        type_name: &'static str,
        default: Option<DefaultValueFn>,
        /// The value type is itself a bean, which cannot be injected by value.
        holds_bean: bool,
    },
    /// Never injected.
    Function,
}

/// Injection metadata for a single bean field.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub tag: &'static str,
    /// Name of the setter used when the field is not directly assignable.
    pub setter: String,
    pub assignable: bool,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            tag: "",
            setter: format!("set_{name}"),
            assignable: true,
            kind,
        }
    }

    /// Descriptor for a `BeanPtr<T>` field. If `T` is not bean-eligible, the field is treated as a
    /// configuration value of type `BeanPtr<T>`.
    pub fn bean<T: Injectable + ?Sized>(name: &'static str) -> Self {
        let bean_type = BeanType::of::<T>();
        if bean_type.class.is_bean() {
            Self::new(name, FieldKind::Bean(bean_type))
        } else {
            Self::value::<BeanPtr<T>>(name)
        }
    }

    pub fn value<T: 'static>(name: &'static str) -> Self {
        Self::new(
            name,
            FieldKind::Value {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                default: None,
                holds_bean: false,
            },
        )
    }

    /// Records the type class of a value field type, if it has one. See [ValueClassOf].
    pub fn with_value_class(mut self, class: Option<TypeClass>) -> Self {
        if let FieldKind::Value { holds_bean, .. } = &mut self.kind {
            *holds_bean = class.map_or(false, TypeClass::is_bean);
        }
        self
    }

    pub fn function(name: &'static str) -> Self {
        Self::new(name, FieldKind::Function)
    }

    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }

    /// Sets the fallback for a missing configuration value. Has no effect on non-value fields.
    pub fn with_default(mut self, default: DefaultValueFn) -> Self {
        if let FieldKind::Value {
            default: current, ..
        } = &mut self.kind
        {
            *current = Some(default);
        }
        self
    }

    /// Marks the field as injectable only through its setter.
    pub fn setter_only(mut self) -> Self {
        self.assignable = false;
        self
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self.kind, FieldKind::Function)
    }
}

/// Finds the [TypeClass] of a field type in derived code, without requiring the type to be
/// [Injectable]:
///
/// ```
/// use lazybean_di::bean::{InjectableValueClass, PlainValueClass, TypeClass, ValueClassOf};
///
/// struct Plain;
///
/// assert_eq!((&ValueClassOf::<i32>::new()).value_class(), Some(TypeClass::Value));
/// assert_eq!((&ValueClassOf::<Plain>::new()).value_class(), None);
/// ```
///
/// Method resolution picks [InjectableValueClass] when the type is injectable and falls back to
/// [PlainValueClass] otherwise. Inside generic code the fallback is always used.
pub struct ValueClassOf<T: ?Sized>(PhantomData<T>);

impl<T: ?Sized> ValueClassOf<T> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

pub trait InjectableValueClass {
    fn value_class(&self) -> Option<TypeClass>;
}

impl<T: Injectable + ?Sized> InjectableValueClass for ValueClassOf<T> {
    #[inline]
    fn value_class(&self) -> Option<TypeClass> {
        Some(T::type_class())
    }
}

pub trait PlainValueClass {
    fn value_class(&self) -> Option<TypeClass>;
}

impl<T: ?Sized> PlainValueClass for &ValueClassOf<T> {
    #[inline]
    fn value_class(&self) -> Option<TypeClass> {
        None
    }
}

/// Type of the single parameter of a setter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SetterParameter {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl SetterParameter {
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

/// A setter method of a bean.
#[derive(Derivative)]
#[derivative(Debug, Clone(bound = ""), Copy(bound = ""))]
pub struct Setter<T> {
    pub name: &'static str,
    /// Number of parameters, excluding the receiver.
    pub arity: usize,
    /// Parameter type, if the setter takes exactly one owned parameter.
    pub parameter: Option<SetterParameter>,
    /// Whether the setter returns anything. Returned values are ignored.
    pub returns_value: bool,
    #[derivative(Debug = "ignore")]
    pub call: fn(&mut T, &AnyValue),
}

/// Values resolved by the injector, consumed by [Bean::assemble](crate::bean::Bean::assemble).
#[derive(Debug, Default)]
pub struct InjectedFields {
    values: FxHashMap<&'static str, AnyValue>,
}

impl InjectedFields {
    pub fn insert(&mut self, name: &'static str, value: AnyValue) {
        self.values.insert(name, value);
    }

    fn take(&mut self, name: &str) -> Result<AnyValue, Error> {
        self.values
            .remove(name)
            .ok_or_else(|| Error::InjectNotSupported(format!("field '{name}' was not injected")))
    }

    /// Takes an injected bean dependency.
    pub fn take_bean<T: ?Sized + 'static>(&mut self, name: &str) -> Result<BeanPtr<T>, Error> {
        self.take_value::<BeanPtr<T>>(name)
    }

    /// Takes an injected configuration value.
    pub fn take_value<T: Clone + 'static>(&mut self, name: &str) -> Result<T, Error> {
        self.take(name)?.cast(name)
    }
}

#[cfg(test)]
mod tests {
    use crate::bean::{
        FieldDescriptor, FieldKind, InjectableValueClass, InjectedFields, Injectable,
        PlainValueClass, TypeClass, ValueClassOf,
    };
    use crate::context::{BeanAnyPtr, BeanPtr};
    use crate::error::Error;
    use crate::value_store::AnyValue;
    use std::any::TypeId;

    #[test]
    fn should_treat_value_pointers_as_values() {
        let descriptor = FieldDescriptor::bean::<i32>("number");
        assert!(matches!(
            descriptor.kind,
            FieldKind::Value { type_id, .. } if type_id == TypeId::of::<BeanPtr<i32>>()
        ));
        assert_eq!(descriptor.setter, "set_number");
    }

    #[test]
    fn should_apply_default_only_to_values() {
        fn default_value() -> AnyValue {
            AnyValue::new(1)
        }

        let value = FieldDescriptor::value::<i32>("a").with_default(default_value);
        assert!(matches!(value.kind, FieldKind::Value { default: Some(_), .. }));

        let function = FieldDescriptor::function("f").with_default(default_value);
        assert!(function.is_function());
    }

    #[test]
    fn should_take_injected_values() {
        let mut fields = InjectedFields::default();
        fields.insert("a", AnyValue::new(5u8));
        fields.insert(
            "b",
            AnyValue::from_bean(BeanPtr::new(BeanPtr::new(7i64)) as BeanAnyPtr, "i64"),
        );

        assert_eq!(fields.take_value::<u8>("a").unwrap(), 5);
        assert_eq!(*fields.take_bean::<i64>("b").unwrap(), 7);
        assert!(matches!(
            fields.take_value::<u8>("a"),
            Err(Error::InjectNotSupported(_))
        ));
    }

    #[test]
    fn should_mark_values_holding_beans() {
        struct Inner;

        impl Injectable for Inner {
            fn type_class() -> TypeClass {
                TypeClass::Struct
            }
        }

        struct Settings;

        let inner = FieldDescriptor::value::<Inner>("inner")
            .with_value_class((&ValueClassOf::<Inner>::new()).value_class());
        let number = FieldDescriptor::value::<u8>("number")
            .with_value_class((&ValueClassOf::<u8>::new()).value_class());
        let settings = FieldDescriptor::value::<Settings>("settings")
            .with_value_class((&ValueClassOf::<Settings>::new()).value_class());

        assert!(matches!(inner.kind, FieldKind::Value { holds_bean: true, .. }));
        assert!(matches!(number.kind, FieldKind::Value { holds_bean: false, .. }));
        assert!(matches!(settings.kind, FieldKind::Value { holds_bean: false, .. }));
    }
}
