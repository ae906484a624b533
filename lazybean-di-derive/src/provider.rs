use crate::attributes::ProviderAttributes;
use crate::bean::{pointer_target, single_type_argument};
use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Error, ItemFn, Result, ReturnType, Type, TypePath};

fn returned_bean(output: &ReturnType) -> Result<&Type> {
    if let ReturnType::Type(_, ty) = output {
        if let Type::Path(TypePath { qself: None, path }) = ty.as_ref() {
            if let Some(bean) = path
                .segments
                .last()
                .filter(|segment| segment.ident == "Result")
                .and_then(single_type_argument)
            {
                return Ok(bean);
            }
        }
    }

    Err(Error::new(
        output.span(),
        "Providers must return Result<Bean, Error>!",
    ))
}

pub fn register_provider(item: &ItemFn, attributes: &ProviderAttributes) -> Result<TokenStream> {
    if !item.sig.generics.params.is_empty() {
        return Err(Error::new(
            item.sig.generics.span(),
            "Providers cannot be generic!",
        ));
    }

    let ident = &item.sig.ident;
    let returned = returned_bean(&item.sig.output)?;
    let bean = pointer_target(returned).unwrap_or(returned);

    let name = attributes.name.as_ref().map(|name| quote!(.with_name(#name)));
    let hold_by_user = attributes.hold_by_user.then(|| quote!(.hold_by_user()));

    Ok(quote! {
        #item

        const _: () = {
            fn register() -> lazybean_di::provider_registry::BeanProvider {
                lazybean_di::provider_registry::BeanProvider::new::<#bean, #returned>(#ident)
                    #name
                    #hold_by_user
            }

            lazybean_di::provider_registry::internal::submit! {
                lazybean_di::provider_registry::internal::ProviderRegisterer {
                    register
                }
            };
        };
    })
}
