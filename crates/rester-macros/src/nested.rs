//! `#[derive(Nested)]` implementation.
//!
//! For
//!
//! ```rust,ignore
//! #[derive(Nested)]
//! struct Users {
//!     #[nested(embed)]
//!     auth: Auth,
//! }
//! ```
//!
//! the derive delegates `control()` to `auth` and generates a `walk` that
//! visits `Auth` (and everything inside it) before `Users` itself.
//!
//! A struct-level `#[nested(crate = "rester_core")]` changes the path the
//! generated impl uses to reach the engine.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Index, Member, Path, spanned::Spanned};

use crate::engine;

pub fn derive_nested(input: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Nested cannot be derived for enums; a layer is a struct embedding one inner layer",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Nested cannot be derived for unions",
            ));
        }
    };

    let engine = engine_path(input)?;
    let (member, field) = find_embed(fields, input)?;
    let embed_ty = &field.ty;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #engine::Nested for #name #ty_generics #where_clause {
            fn control(&self) -> &#engine::Control {
                #engine::Nested::control(&self.#member)
            }

            fn walk<__C: #engine::Nested>(
                walker: &mut #engine::LayerWalker<__C>,
                project: #engine::Projection<__C, Self>,
            ) {
                <#embed_ty as #engine::Nested>::walk(
                    walker,
                    project.then::<#embed_ty>(|this| &this.#member),
                );
                walker.visit(project);
            }
        }
    })
}

/// Reads `#[nested(crate = "...")]` from the struct's own attributes.
fn engine_path(input: &DeriveInput) -> syn::Result<Path> {
    let mut path = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("nested") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                path = Some(engine::parse_crate_arg(&meta)?);
                Ok(())
            } else {
                Err(meta.error("unknown nested attribute, expected `crate`"))
            }
        })?;
    }
    Ok(path.unwrap_or_else(engine::default_path))
}

/// Finds the single field marked `#[nested(embed)]`.
fn find_embed<'a>(fields: &'a Fields, input: &DeriveInput) -> syn::Result<(Member, &'a Field)> {
    let mut found: Option<(Member, &Field)> = None;

    for (index, field) in fields.iter().enumerate() {
        if !is_embed(field)? {
            continue;
        }
        if found.is_some() {
            return Err(syn::Error::new(
                field.span(),
                "only one field can be marked #[nested(embed)]; a layer embeds exactly one inner layer",
            ));
        }
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(index)),
        };
        found = Some((member, field));
    }

    found.ok_or_else(|| {
        syn::Error::new(
            input.ident.span(),
            "Nested requires one field marked #[nested(embed)] (use `Control` for the innermost layer)",
        )
    })
}

fn is_embed(field: &Field) -> syn::Result<bool> {
    let mut embed = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("nested") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("embed") {
                embed = true;
                Ok(())
            } else {
                Err(meta.error("unknown nested attribute, expected `embed`"))
            }
        })?;
    }
    Ok(embed)
}
