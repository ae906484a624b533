//! Field injection for [Bean]s. Fields are processed in declaration order, according to their
//! [FieldDescriptor]s and tags:
//!
//! * ignored and function-like fields are skipped,
//! * bean fields are resolved from the [Context] by type, or by type and `beanName`,
//! * value fields are read from the configuration store at the tagged `path`, falling back to the
//! field default, if declared.
//!
//! Fields which are not directly assignable are injected through their setter. The first failure
//! aborts injection and no bean is created.

use crate::bean::{Bean, FieldDescriptor, FieldKind, InjectedFields, Setter};
use crate::context::Context;
use crate::error::Error;
use crate::tag::Directive;
use crate::value_store::AnyValue;
use tracing::{debug, warn};

/// Creates a new bean with all its fields injected.
pub fn inject_new<T: Bean>(context: &dyn Context) -> Result<T, Error> {
    let setters = T::setters();
    let mut fields = InjectedFields::default();
    let mut setter_calls = Vec::new();

    for field in T::fields() {
        let directive = Directive::parse(field.tag)?;
        if directive.ignore || field.is_function() {
            debug!(field = field.name, "Skipping field injection.");
            continue;
        }

        let value = value_to_inject(context, &field, &directive)?;

        if field.assignable {
            fields.insert(field.name, value);
        } else {
            let setter = find_setter(&setters, &field, &value)?;
            setter_calls.push((setter.call, value));
        }

        debug!(field = field.name, "Injected field.");
    }

    let mut bean = T::assemble(&mut fields)?;
    for (call, value) in &setter_calls {
        call(&mut bean, value);
    }

    Ok(bean)
}

fn value_to_inject(
    context: &dyn Context,
    field: &FieldDescriptor,
    directive: &Directive,
) -> Result<AnyValue, Error> {
    match &field.kind {
        FieldKind::Bean(bean_type) => {
            let bean = if directive.bean_name.is_empty() {
                context.get(bean_type)
            } else {
                context.get_named(bean_type, &directive.bean_name)
            }?;

            Ok(AnyValue::from_bean(bean, bean_type.type_name))
        }
        FieldKind::Value {
            type_id,
            type_name,
            default,
            holds_bean,
        } => {
            let path = &directive.value_path;
            let value = if path.is_empty() {
                match default {
                    Some(default) => default(),
                    None if *holds_bean => {
                        return Err(Error::InjectNotSupported(format!(
                            "field '{}' holds bean {type_name} by value: use BeanPtr<{type_name}> instead",
                            field.name
                        )))
                    }
                    None => return Err(missing_path(field)),
                }
            } else {
                match (context.get_generic_value(path), default) {
                    (Ok(value), _) => value,
                    (Err(Error::NoValueFound(_)), Some(default)) => default(),
                    (Err(error), _) => return Err(error),
                }
            };

            if value.type_id() != *type_id {
                return Err(Error::TypeMismatch {
                    path: path.clone(),
                    expected: *type_name,
                    actual: value.type_name(),
                });
            }

            Ok(value)
        }
        FieldKind::Function => Err(Error::InjectNotSupported(format!(
            "function field '{}' cannot be injected",
            field.name
        ))),
    }
}

fn missing_path(field: &FieldDescriptor) -> Error {
    Error::NoValueFound(String::new()).with_context(format!(
        "value field '{}' has neither a path nor a default",
        field.name
    ))
}

fn find_setter<'a, T>(
    setters: &'a [Setter<T>],
    field: &FieldDescriptor,
    value: &AnyValue,
) -> Result<&'a Setter<T>, Error> {
    let setter = setters
        .iter()
        .find(|setter| setter.name == field.setter)
        .ok_or_else(|| {
            Error::InjectNotSupported(format!(
                "field '{}' is not assignable and has no setter '{}'",
                field.name, field.setter
            ))
        })?;

    if setter.arity != 1 {
        return Err(Error::InjectNotSupported(format!(
            "setter '{}' must take exactly one argument, but takes {}",
            setter.name, setter.arity
        )));
    }

    match setter.parameter {
        Some(parameter) if parameter.type_id == value.type_id() => {
            if setter.returns_value {
                warn!(
                    setter = setter.name,
                    "Setter returns a value, which will be ignored."
                );
            }

            Ok(setter)
        }
        parameter => Err(Error::InjectNotSupported(format!(
            "setter '{}' accepts {}, which is not assignable from {}",
            setter.name,
            parameter.map_or("an unsupported type", |parameter| parameter.type_name),
            value.type_name()
        ))),
    }
}
