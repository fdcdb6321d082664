//! `#[derive(Encode, Decode)]` for structs with named fields.
//!
//! Field tags are written `#[yaml("name,omitempty,flow,inline,anchor=x,alias=y")]`
//! and handed unparsed to `yamlbind::describe`, which validates them the
//! first time the type is encoded or decoded. A field whose tag name is
//! `-` is left out of the generated code entirely, so its type needs no
//! impls.
//!
//! `#[yaml(is_zero = "method")]` on the struct makes `omitempty` fields of
//! this type call `self.method()` instead of checking every field.
//!
//! `Decode` starts from `Default::default()` and overwrites the fields
//! present in the mapping.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Fields, Generics, Ident, LitStr, Type, parse_macro_input, parse_quote,
};

#[proc_macro_derive(Encode, attributes(yaml))]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_encode(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[proc_macro_derive(Decode, attributes(yaml))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_decode(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

struct FieldSpec {
    ident: Ident,
    name: String,
    tag: Option<LitStr>,
    ty: Type,
}

struct Container {
    ident: Ident,
    generics: Generics,
    fields: Vec<FieldSpec>,
    is_zero: Option<Ident>,
}

fn parse_container(input: &DeriveInput) -> syn::Result<Container> {
    if input.generics.lifetimes().next().is_some() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "yamlbind derives do not support lifetime parameters",
        ));
    }
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "yamlbind derives support structs with named fields only",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "yamlbind derives support structs with named fields only",
            ));
        }
    };

    let mut is_zero = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("yaml")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("is_zero") {
                let method: LitStr = meta.value()?.parse()?;
                is_zero = Some(method.parse::<Ident>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported yaml container attribute"))
            }
        })?;
    }

    let mut fields = Vec::new();
    for field in &named.named {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let mut tag = None;
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("yaml")) {
            tag = Some(attr.parse_args::<LitStr>()?);
        }
        let skipped = tag
            .as_ref()
            .is_some_and(|t| t.value().split(',').next().map(str::trim) == Some("-"));
        if skipped {
            continue;
        }
        fields.push(FieldSpec {
            name: ident.to_string(),
            ident,
            tag,
            ty: field.ty.clone(),
        });
    }

    Ok(Container {
        ident: input.ident.clone(),
        generics: input.generics.clone(),
        fields,
        is_zero,
    })
}

fn with_bound(generics: &Generics, bound: TokenStream2) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(#bound));
    }
    generics
}

/// `&[RawField, ...]` describing the fields, with shapes taken from `trait_path`.
fn raw_fields(fields: &[FieldSpec], trait_path: &TokenStream2) -> TokenStream2 {
    let entries = fields.iter().map(|f| {
        let name = &f.name;
        let ty = &f.ty;
        let tag = match &f.tag {
            Some(tag) => quote!(::core::option::Option::Some(#tag)),
            None => quote!(::core::option::Option::None),
        };
        quote!(::yamlbind::RawField::new(#name, #tag, <#ty as #trait_path>::SHAPE))
    });
    quote!(&[#(#entries),*])
}

fn expand_encode(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let container = parse_container(input)?;
    let ident = &container.ident;
    let trait_path = quote!(::yamlbind::Encode);
    let generics = with_bound(&container.generics, trait_path.clone());
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let raw = raw_fields(&container.fields, &trait_path);

    let calls = container.fields.iter().map(|f| {
        let name = &f.name;
        let field = &f.ident;
        quote!(structure.field(#name, &self.#field)?;)
    });
    let is_zero = match &container.is_zero {
        Some(method) => quote!(self.#method()),
        None => {
            let checks = container.fields.iter().map(|f| {
                let field = &f.ident;
                quote!(::yamlbind::Encode::is_zero(&self.#field))
            });
            quote!(true #(&& #checks)*)
        }
    };

    Ok(quote! {
        impl #impl_generics ::yamlbind::Encode for #ident #ty_generics #where_clause {
            const SHAPE: ::yamlbind::TypeShape = ::yamlbind::TypeShape::STRUCT;

            fn encode(
                &self,
                encoder: &mut ::yamlbind::Encoder,
            ) -> ::yamlbind::Result<::yamlbind::Node> {
                let fields = ::yamlbind::describe::<Self>(#raw)?;
                let mut structure = encoder.begin_struct(fields);
                #(#calls)*
                structure.finish()
            }

            fn is_zero(&self) -> bool {
                #is_zero
            }
        }
    })
}

fn expand_decode(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let container = parse_container(input)?;
    let ident = &container.ident;
    let trait_path = quote!(::yamlbind::Decode);
    let mut generics = with_bound(&container.generics, trait_path.clone());
    let (_, ty_generics, _) = container.generics.split_for_impl();
    generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(#ident #ty_generics: ::core::default::Default));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let raw = raw_fields(&container.fields, &trait_path);

    let calls: Vec<TokenStream2> = container
        .fields
        .iter()
        .map(|f| {
            let name = &f.name;
            let field = &f.ident;
            quote!(structure.field(#name, &mut value.#field)?;)
        })
        .collect();
    let body = |ctx: TokenStream2| {
        quote! {
            let fields = ::yamlbind::describe::<Self>(#raw)?;
            let mut value = <Self as ::core::default::Default>::default();
            let mut structure = decoder.begin_struct::<Self>(node, fields, #ctx)?;
            #(#calls)*
            structure.finish()?;
            ::core::result::Result::Ok(value)
        }
    };
    let decode_body = body(quote!(::core::option::Option::None));
    let inline_body = body(quote!(::core::option::Option::Some(ctx)));

    Ok(quote! {
        impl #impl_generics ::yamlbind::Decode for #ident #ty_generics #where_clause {
            const SHAPE: ::yamlbind::TypeShape = ::yamlbind::TypeShape::STRUCT;

            fn decode(
                decoder: &mut ::yamlbind::Decoder,
                node: &::yamlbind::Node,
            ) -> ::yamlbind::Result<Self> {
                #decode_body
            }

            fn decode_inline(
                decoder: &mut ::yamlbind::Decoder,
                node: &::yamlbind::Node,
                ctx: &mut ::yamlbind::InlineContext,
            ) -> ::yamlbind::Result<Self> {
                #inline_body
            }
        }
    })
}
