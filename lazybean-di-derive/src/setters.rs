use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Error, FnArg, ImplItem, ImplItemFn, ItemImpl, Result, ReturnType, Type};

const SETTER_PREFIX: &str = "set_";

fn is_setter(method: &ImplItemFn) -> bool {
    method.sig.ident.to_string().starts_with(SETTER_PREFIX)
        && method
            .sig
            .receiver()
            .map_or(false, |receiver| receiver.reference.is_some())
}

fn generate_setter(method: &ImplItemFn) -> TokenStream {
    let ident = &method.sig.ident;
    let name = ident.to_string();
    let returns_value = !matches!(method.sig.output, ReturnType::Default);
    let parameters = method
        .sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(parameter) => Some(&parameter.ty),
            FnArg::Receiver(_) => None,
        })
        .collect::<Vec<_>>();

    let arity = parameters.len();
    match parameters.as_slice() {
        [ty] if method.sig.generics.params.is_empty()
            && !matches!(ty.as_ref(), Type::Reference(_) | Type::ImplTrait(_)) =>
        {
            quote! {
                lazybean_di::bean::Setter {
                    name: #name,
                    arity: #arity,
                    parameter: Some(lazybean_di::bean::SetterParameter::of::<#ty>()),
                    returns_value: #returns_value,
                    call: |bean: &mut Self, value: &lazybean_di::value_store::AnyValue| {
                        if let Some(value) = value.cloned::<#ty>() {
                            let _ = bean.#ident(value);
                        }
                    },
                }
            }
        }
        _ => quote! {
            lazybean_di::bean::Setter {
                name: #name,
                arity: #arity,
                parameter: None,
                returns_value: #returns_value,
                call: |_: &mut Self, _: &lazybean_di::value_store::AnyValue| {},
            }
        },
    }
}

pub fn expand_setters(item_impl: &ItemImpl) -> Result<TokenStream> {
    if item_impl.trait_.is_some() {
        return Err(Error::new(
            item_impl.span(),
            "Setters can only be collected from inherent impl blocks!",
        ));
    }

    let self_ty = &item_impl.self_ty;
    let (impl_generics, _, where_clause) = item_impl.generics.split_for_impl();
    let setters = item_impl
        .items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(method) if is_setter(method) => Some(generate_setter(method)),
            _ => None,
        })
        .collect::<Vec<_>>();

    Ok(quote! {
        #item_impl

        #[automatically_derived]
        impl #impl_generics lazybean_di::bean::BeanSetters for #self_ty #where_clause {
            #[allow(clippy::let_unit_value)]
            fn setters() -> Vec<lazybean_di::bean::Setter<Self>> {
                vec![#(#setters),*]
            }
        }
    })
}
