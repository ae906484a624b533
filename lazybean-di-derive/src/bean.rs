use crate::attributes::{BeanAttributes, DefaultDefinition, FieldAttributes, InjectableAttributes};
use itertools::Itertools;
use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use std::ops::Deref;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{
    Attribute, Data, DataStruct, DeriveInput, Error, Field, Fields, FieldsNamed, FieldsUnnamed,
    GenericArgument, ItemImpl, ItemTrait, PathArguments, PathSegment, Result, Type,
    TypeParamBound, TypePath, TypeTraitObject,
};

const BEAN: &str = "bean";

enum FieldClass<'a> {
    Bean(&'a Type),
    Function,
    Value,
}

pub fn single_type_argument(segment: &PathSegment) -> Option<&Type> {
    if let PathArguments::AngleBracketed(arguments) = &segment.arguments {
        if let Some(GenericArgument::Type(ty)) = arguments.args.first() {
            return Some(ty);
        }
    }

    None
}

/// Returns `T` for `BeanPtr<T>` and `Rc<T>`.
pub fn pointer_target(ty: &Type) -> Option<&Type> {
    if let Type::Path(TypePath { qself: None, path }) = ty {
        let segment = path.segments.last()?;
        if segment.ident == "BeanPtr" || segment.ident == "Rc" {
            return single_type_argument(segment);
        }
    }

    None
}

fn is_fn_trait_object(object: &TypeTraitObject) -> bool {
    object.bounds.iter().any(|bound| match bound {
        TypeParamBound::Trait(bound) => bound
            .path
            .segments
            .last()
            .map(|segment| {
                segment.ident == "Fn" || segment.ident == "FnMut" || segment.ident == "FnOnce"
            })
            .unwrap_or(false),
        _ => false,
    })
}

fn is_fn_type(ty: &Type) -> bool {
    match ty {
        Type::BareFn(_) => true,
        Type::TraitObject(object) => is_fn_trait_object(object),
        Type::Paren(ty) => is_fn_type(&ty.elem),
        _ => false,
    }
}

fn classify_field(ty: &Type) -> FieldClass {
    if is_fn_type(ty) {
        return FieldClass::Function;
    }

    if let Some(target) = pointer_target(ty) {
        return if is_fn_type(target) {
            FieldClass::Function
        } else {
            FieldClass::Bean(target)
        };
    }

    if let Type::Path(TypePath { qself: None, path }) = ty {
        if let Some(segment) = path.segments.last() {
            if segment.ident == "LazyBean" {
                return FieldClass::Function;
            }

            if segment.ident == "Box" && single_type_argument(segment).map_or(false, is_fn_type) {
                return FieldClass::Function;
            }
        }
    }

    FieldClass::Value
}

fn tag_ignores(tag: &str) -> bool {
    tag.split(';')
        .any(|clause| clause.split('=').next() == Some("ignore"))
}

fn extract_field_attributes(field: &Field) -> Result<FieldAttributes> {
    field
        .attrs
        .iter()
        .find(|attribute| attribute.path().is_ident(BEAN))
        .map(FieldAttributes::try_from)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn extract_bean_attributes(attributes: &[Attribute]) -> Result<BeanAttributes> {
    attributes
        .iter()
        .find(|attribute| attribute.path().is_ident(BEAN))
        .map(BeanAttributes::try_from)
        .transpose()
        .map(Option::unwrap_or_default)
}

struct FieldGeneration {
    descriptor: TokenStream,
    construction: TokenStream,
}

fn generate_field(field: &Field, name: &str) -> Result<FieldGeneration> {
    let attributes = extract_field_attributes(field)?;
    let ty = &field.ty;
    let class = classify_field(ty);

    let default_value = match &attributes.default {
        Some(DefaultDefinition::Expr(path)) => Some(quote!(#path())),
        Some(DefaultDefinition::Default) => {
            Some(quote!(<#ty as std::default::Default>::default()))
        }
        None => None,
    };

    let ignored = attributes
        .tag
        .as_ref()
        .map_or(false, |tag| tag_ignores(&tag.value()));

    let mut descriptor = match &class {
        FieldClass::Bean(target) if !ignored => {
            quote!(lazybean_di::bean::FieldDescriptor::bean::<#target>(#name))
        }
        FieldClass::Function => quote!(lazybean_di::bean::FieldDescriptor::function(#name)),
        _ => quote!(lazybean_di::bean::FieldDescriptor::value::<#ty>(#name)),
    };

    if let Some(tag) = &attributes.tag {
        descriptor = quote!(#descriptor.with_tag(#tag));
    }

    if attributes.setter {
        descriptor = quote!(#descriptor.setter_only());
    }

    if let FieldClass::Value = &class {
        descriptor = quote! {
            #descriptor.with_value_class({
                use lazybean_di::bean::{InjectableValueClass as _, PlainValueClass as _};
                (&lazybean_di::bean::ValueClassOf::<#ty>::new()).value_class()
            })
        };
    }

    if let (FieldClass::Value, Some(default_value)) = (&class, &default_value) {
        descriptor = quote! {
            #descriptor.with_default(|| lazybean_di::value_store::AnyValue::new::<#ty>(#default_value))
        };
    }

    let skipped = ignored || attributes.setter || matches!(class, FieldClass::Function);

    let construction = if skipped {
        default_value.unwrap_or_else(|| quote!(std::default::Default::default()))
    } else {
        match class {
            FieldClass::Bean(target) => quote!(fields.take_bean::<#target>(#name)?),
            _ => quote!(fields.take_value::<#ty>(#name)?),
        }
    };

    Ok(FieldGeneration {
        descriptor,
        construction,
    })
}

fn make_named_struct(fields: &FieldsNamed) -> Result<(Vec<TokenStream>, TokenStream)> {
    let generations: Vec<(TokenStream, TokenStream)> = fields
        .named
        .iter()
        .map(|field| -> Result<(TokenStream, TokenStream)> {
            let ident = field
                .ident
                .as_ref()
                .ok_or_else(|| Error::new(field.span(), "Missing field identifier!"))?;
            let generation = generate_field(field, &ident.unraw().to_string())?;
            let construction = generation.construction;
            Ok((
                generation.descriptor,
                quote! {
                    #ident: #construction
                },
            ))
        })
        .try_collect()?;
    let (descriptors, constructions): (Vec<_>, Vec<_>) = generations.into_iter().unzip();

    Ok((
        descriptors,
        quote! {
            Self {
                #(#constructions),*
            }
        },
    ))
}

fn make_unnamed_struct(fields: &FieldsUnnamed) -> Result<(Vec<TokenStream>, TokenStream)> {
    let generations: Vec<(TokenStream, TokenStream)> = fields
        .unnamed
        .iter()
        .enumerate()
        .map(|(index, field)| -> Result<(TokenStream, TokenStream)> {
            let generation = generate_field(field, &index.to_string())?;
            Ok((generation.descriptor, generation.construction))
        })
        .try_collect()?;
    let (descriptors, constructions): (Vec<_>, Vec<_>) = generations.into_iter().unzip();

    Ok((
        descriptors,
        quote! {
            Self(#(#constructions),*)
        },
    ))
}

pub fn expand_bean(input: &DeriveInput) -> Result<TokenStream> {
    if let Data::Struct(DataStruct { fields, .. }) = &input.data {
        let ident = &input.ident;
        let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
        let attributes = extract_bean_attributes(&input.attrs)?;

        let (descriptors, construction) = match fields {
            Fields::Named(fields) => make_named_struct(fields)?,
            Fields::Unnamed(fields) => make_unnamed_struct(fields)?,
            Fields::Unit => (vec![], quote! { Self }),
        };

        let closeable = attributes.closeable.then(|| {
            quote! {
                fn close_bean(&self) -> std::result::Result<(), lazybean_di::ErrorPtr> {
                    lazybean_di::bean::Closeable::close(self)
                }
            }
        });

        let setters = attributes.setters.then(|| {
            quote! {
                fn setters() -> Vec<lazybean_di::bean::Setter<Self>> {
                    <Self as lazybean_di::bean::BeanSetters>::setters()
                }
            }
        });

        Ok(quote! {
            #[automatically_derived]
            impl #impl_generics lazybean_di::bean::Injectable for #ident #ty_generics #where_clause {
                fn type_class() -> lazybean_di::bean::TypeClass {
                    lazybean_di::bean::TypeClass::Struct
                }

                fn constructor() -> Option<lazybean_di::bean::ConstructorFn> {
                    Some(lazybean_di::construct::auto_construct::<Self> as lazybean_di::bean::ConstructorFn)
                }

                #closeable
            }

            #[automatically_derived]
            impl #impl_generics lazybean_di::bean::Bean for #ident #ty_generics #where_clause {
                fn fields() -> Vec<lazybean_di::bean::FieldDescriptor> {
                    vec![#(#descriptors),*]
                }

                #setters

                #[allow(unused_variables)]
                fn assemble(
                    fields: &mut lazybean_di::bean::InjectedFields,
                ) -> std::result::Result<Self, lazybean_di::Error> {
                    Ok(#construction)
                }
            }
        })
    } else {
        Err(Error::new(input.span(), "Can only derive Bean on structs!"))
    }
}

pub fn make_injectable(item: &ItemTrait, attributes: &InjectableAttributes) -> Result<TokenStream> {
    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "Generic traits cannot be made injectable!",
        ));
    }

    let ident = &item.ident;
    let closeable = attributes.closeable.then(|| {
        quote! {
            fn close_bean(&self) -> std::result::Result<(), lazybean_di::ErrorPtr> {
                lazybean_di::bean::Closeable::close(self)
            }
        }
    });

    Ok(quote! {
        #item

        #[automatically_derived]
        impl lazybean_di::bean::Injectable for dyn #ident {
            fn type_class() -> lazybean_di::bean::TypeClass {
                lazybean_di::bean::TypeClass::Interface
            }

            #closeable
        }
    })
}

pub fn register_bean_alias(item_impl: &ItemImpl) -> Result<TokenStream> {
    let trait_type = item_impl
        .trait_
        .as_ref()
        .map(|(_, path, ..)| path)
        .ok_or_else(|| Error::new(item_impl.span(), "Missing trait identifier!"))?;

    let target_type = if let Type::Path(path) = item_impl.self_ty.deref() {
        &path.path
    } else {
        return Err(Error::new(
            item_impl.self_ty.span(),
            "Registering aliases is only available for beans!",
        ));
    };

    Ok(quote! {
        #item_impl

        #[automatically_derived]
        impl lazybean_di::bean::BeanCast<#target_type> for dyn #trait_type {
            fn cast(
                source: lazybean_di::context::BeanPtr<#target_type>,
            ) -> lazybean_di::context::BeanPtr<Self> {
                source
            }
        }

        const _: () = {
            fn register() -> lazybean_di::provider_registry::BeanProvider {
                lazybean_di::provider_registry::BeanProvider::use_existing::<dyn #trait_type, #target_type>()
            }

            lazybean_di::provider_registry::internal::submit! {
                lazybean_di::provider_registry::internal::ProviderRegisterer {
                    register
                }
            };
        };
    }
    .into_token_stream())
}
