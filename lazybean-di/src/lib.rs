//! A lazy dependency injection container. Beans are created only when first requested, either by
//! registered [providers](provider_registry::BeanProvider) or automatically, by injecting the fields
//! of structs deriving [Bean](bean::Bean). Configuration values are injected by path.
//!
//! See [bean] for defining beans, [context] for the resolution rules and [global] for the
//! process-wide container.

pub mod bean;
pub mod bean_cache;
pub mod construct;
pub mod context;
mod error;
pub mod func_provider;
pub mod global;
pub mod inject;
pub mod lazy;
pub mod provider_registry;
pub mod settings;
pub mod tag;
pub mod value_store;

pub use error::{DependencyChain, Error, ErrorPtr};

#[cfg(feature = "derive")]
pub use lazybean_di_derive::{bean_alias, bean_setters, injectable, provider, Bean};
