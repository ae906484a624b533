//! Auto-construction of beans which have no registered provider.

use crate::bean::{validate_type_is_bean, Bean, BeanType, TypeClass};
use crate::context::{BeanAnyPtr, BeanPtr, Context};
use crate::error::Error;
use crate::inject::inject_new;
use tracing::debug;

/// Creates a new instance of given bean type by injecting its fields. Only structs deriving
/// [Bean] can be constructed this way - interfaces need a provider.
pub fn try_build_new_bean(bean_type: &BeanType, context: &dyn Context) -> Result<BeanAnyPtr, Error> {
    validate_type_is_bean(bean_type)?;

    let constructor = match (bean_type.class, bean_type.constructor) {
        (TypeClass::Struct, Some(constructor)) => constructor,
        (TypeClass::Interface, _) => {
            return Err(Error::InjectNotSupported(format!(
                "{} is an interface and requires a provider",
                bean_type.type_name
            )))
        }
        _ => {
            return Err(Error::InjectNotSupported(format!(
                "{} cannot be constructed automatically",
                bean_type.type_name
            )))
        }
    };

    debug!(bean_type = bean_type.type_name, "Building new bean.");
    constructor(context)
}

/// Type-erased constructor for beans, used by `#[derive(Bean)]`.
pub fn auto_construct<T: Bean>(context: &dyn Context) -> Result<BeanAnyPtr, Error> {
    inject_new::<T>(context).map(|bean| BeanPtr::new(BeanPtr::new(bean)) as BeanAnyPtr)
}
