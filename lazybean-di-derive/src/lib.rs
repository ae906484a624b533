mod attributes;
mod bean;
mod provider;
mod setters;

use crate::attributes::{InjectableAttributes, ProviderAttributes};
use crate::bean::{expand_bean, make_injectable, register_bean_alias};
use crate::provider::register_provider;
use crate::setters::expand_setters;
use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, Error, ItemFn, ItemImpl, ItemTrait};

/// Derives `Injectable` and `Bean` for a struct, making it automatically constructible by the
/// container. Supported field attributes: `#[bean(tag = "...")]`, `#[bean(default)]`,
/// `#[bean(default = "path::to::fn")]` and `#[bean(setter)]`. Supported struct attributes:
/// `#[bean(closeable)]` and `#[bean(setters)]`.
#[proc_macro_derive(Bean, attributes(bean))]
pub fn generate_bean(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_bean(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Makes `dyn Trait` injectable. With `#[injectable(closeable)]`, the trait must extend
/// `Closeable` and beans requested through it are closed together with their container.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, input: TokenStream) -> TokenStream {
    let mut attributes = InjectableAttributes::default();
    let parser = syn::meta::parser(|meta| attributes.parse(meta));
    parse_macro_input!(attr with parser);

    let item = parse_macro_input!(input as ItemTrait);
    make_injectable(&item, &attributes)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Registers given bean as an implementation of the trait. Requests for `dyn Trait` will then
/// resolve to the bean with the same name.
#[proc_macro_attribute]
pub fn bean_alias(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemImpl);
    register_bean_alias(&item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Collects all `set_*` methods of an inherent impl block, for use with `#[bean(setters)]`.
#[proc_macro_attribute]
pub fn bean_setters(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemImpl);
    expand_setters(&item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Statically registers a function of the form `fn(&dyn Context) -> Result<Bean, Error>` as the
/// provider of its returned bean. Optional arguments: `name = "..."` and `hold_by_user`.
#[proc_macro_attribute]
pub fn provider(attr: TokenStream, input: TokenStream) -> TokenStream {
    let mut attributes = ProviderAttributes::default();
    let parser = syn::meta::parser(|meta| attributes.parse(meta));
    parse_macro_input!(attr with parser);

    let item = parse_macro_input!(input as ItemFn);
    register_provider(&item, &attributes)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}
