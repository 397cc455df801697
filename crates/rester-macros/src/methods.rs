//! `#[methods]` attribute implementation.
//!
//! The attribute re-emits the `impl` block with the `#[method(...)]` markers
//! stripped and adds an `impl Methods` declaring every registered method:
//!
//! ```rust,ignore
//! #[methods]
//! impl Auth {
//!     fn get(&self, next: Next<'_>, token: String) { /* ... */ }
//! }
//!
//! // expands to the same impl block plus
//! impl ::rester::engine::Methods for Auth {
//!     fn declare(methods: &mut ::rester::engine::MethodSet<Self>) {
//!         methods.declare(
//!             ::rester::engine::MethodDecl::<Self>::new("get", |__this, __next, __args| {
//!                 let __arg0: String = __args.take(0usize)?;
//!                 Self::get(__this, __next, __arg0);
//!                 Ok(())
//!             })
//!             .param::<String>()
//!             .results(&[]),
//!         );
//!     }
//! }
//! ```

use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{
    Attribute, FnArg, GenericArgument, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Path,
    PathArguments, ReturnType, Type, spanned::Spanned,
};

// ============================================================================
// Method attributes
// ============================================================================

#[derive(Default)]
struct MethodAttrs {
    name: Option<String>,
    skip: bool,
}

/// Parses and removes every `#[method(...)]` attribute of `attrs`.
fn take_method_attrs(attrs: &mut Vec<Attribute>) -> syn::Result<MethodAttrs> {
    let mut parsed = MethodAttrs::default();
    let mut result = Ok(());

    attrs.retain(|attr| {
        if !attr.path().is_ident("method") {
            return true;
        }
        let outcome = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let name: LitStr = meta.value()?.parse()?;
                if name.value().is_empty() {
                    return Err(syn::Error::new(name.span(), "method name cannot be empty"));
                }
                parsed.name = Some(name.value());
            } else if meta.path.is_ident("skip") {
                parsed.skip = true;
            } else {
                return Err(meta.error("unknown method attribute, expected `name` or `skip`"));
            }
            Ok(())
        });
        if let Err(err) = outcome {
            result = Err(err);
        }
        false
    });

    result.map(|()| parsed)
}

// ============================================================================
// Registered methods
// ============================================================================

/// One injected parameter.
struct Injected {
    binding: Ident,
    ty: Type,
}

/// How the shim passes one declared parameter.
enum CallArg {
    Next,
    Injected(usize),
}

struct Registered {
    name: String,
    ident: Ident,
    injected: Vec<Injected>,
    call_args: Vec<CallArg>,
    results: Vec<String>,
}

impl Registered {
    fn parse(method: &ImplItemFn, attrs: MethodAttrs) -> syn::Result<Option<Self>> {
        let sig = &method.sig;
        let Some(receiver) = sig.receiver() else {
            return Ok(None);
        };

        if receiver.reference.is_none() || receiver.colon_token.is_some() {
            return Err(syn::Error::new(
                receiver.span(),
                "chain methods take `&self`; use #[method(skip)] to leave this method out",
            ));
        }
        if receiver.mutability.is_some() {
            return Err(syn::Error::new(
                receiver.span(),
                "chain methods take `&self`, not `&mut self`; keep mutable state behind interior mutability or use #[method(skip)]",
            ));
        }
        if let Some(asyncness) = &sig.asyncness {
            return Err(syn::Error::new(
                asyncness.span(),
                "async methods cannot take part in a method chain",
            ));
        }
        if sig.generics.type_params().next().is_some() || sig.generics.const_params().next().is_some() {
            return Err(syn::Error::new(
                sig.generics.span(),
                "generic methods cannot be registered",
            ));
        }

        let mut injected = Vec::new();
        let mut call_args = Vec::new();
        let mut has_next = false;

        for input in sig.inputs.iter().skip(1) {
            let FnArg::Typed(arg) = input else {
                continue;
            };
            if is_next(&arg.ty) {
                if has_next {
                    return Err(syn::Error::new(
                        arg.ty.span(),
                        "a chain method takes at most one `Next` parameter",
                    ));
                }
                has_next = true;
                call_args.push(CallArg::Next);
                continue;
            }
            if let Type::Reference(reference) = &*arg.ty {
                return Err(syn::Error::new(
                    reference.span(),
                    "injected parameters must be owned values, not references",
                ));
            }
            let index = injected.len();
            injected.push(Injected {
                binding: format_ident!("__arg{}", index),
                ty: (*arg.ty).clone(),
            });
            call_args.push(CallArg::Injected(index));
        }

        let ident = sig.ident.clone();
        let name = attrs
            .name
            .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_owned());

        Ok(Some(Self {
            name,
            ident,
            injected,
            call_args,
            results: result_types(&sig.output),
        }))
    }

    fn declaration(&self, engine: &Path) -> TokenStream {
        let name = &self.name;
        let ident = &self.ident;
        let bindings = self.injected.iter().enumerate().map(|(index, arg)| {
            let binding = &arg.binding;
            let ty = &arg.ty;
            quote! { let #binding: #ty = __args.take(#index)?; }
        });
        let call_args = self.call_args.iter().map(|arg| match arg {
            CallArg::Next => quote! { __next },
            CallArg::Injected(index) => self.injected[*index].binding.to_token_stream(),
        });
        let call = quote! { Self::#ident(__this, #(#call_args),*) };
        let call = if self.results.is_empty() {
            quote! { #call; }
        } else {
            quote! { let _ = #call; }
        };
        let params = self.injected.iter().map(|arg| {
            let ty = &arg.ty;
            quote! { .param::<#ty>() }
        });
        let results = &self.results;

        quote! {
            methods.declare(
                #engine::MethodDecl::<Self>::new(#name, |__this, __next, __args| {
                    #(#bindings)*
                    #call
                    ::core::result::Result::Ok(())
                })
                #(#params)*
                .results(&[#(#results),*]),
            );
        }
    }
}

/// Returns `true` if `ty` names the continuation handle.
///
/// The handle is recognised syntactically: a path whose last segment is
/// `Next` with exactly one lifetime argument, as in `Next<'_>` or
/// `rester::Next<'a>`. A `Next` written without its lifetime, or imported
/// under another name, is treated as an injected parameter.
fn is_next(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    if path.qself.is_some() {
        return false;
    }
    let Some(segment) = path.path.segments.last() else {
        return false;
    };
    if segment.ident != "Next" {
        return false;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => {
            args.args.len() == 1 && matches!(args.args.first(), Some(GenericArgument::Lifetime(_)))
        }
        _ => false,
    }
}

/// Spells out the declared result types; empty for `()`.
fn result_types(output: &ReturnType) -> Vec<String> {
    let ReturnType::Type(_, ty) = output else {
        return Vec::new();
    };
    match &**ty {
        Type::Tuple(tuple) => tuple
            .elems
            .iter()
            .map(|elem| elem.to_token_stream().to_string())
            .collect(),
        Type::Paren(inner) => vec![inner.elem.to_token_stream().to_string()],
        other => vec![other.to_token_stream().to_string()],
    }
}

// ============================================================================
// Entry point
// ============================================================================

pub fn expand_methods(engine: Path, mut input: ItemImpl) -> syn::Result<TokenStream> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new(
            path.span(),
            "#[methods] goes on an inherent impl block, not a trait impl",
        ));
    }

    let mut registered = Vec::new();
    let mut errors: Option<syn::Error> = None;

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let outcome = take_method_attrs(&mut method.attrs).and_then(|attrs| {
            if attrs.skip {
                return Ok(None);
            }
            Registered::parse(method, attrs)
        });
        match outcome {
            Ok(Some(found)) => registered.push(found),
            Ok(None) => {}
            Err(err) => match &mut errors {
                Some(errors) => errors.combine(err),
                None => errors = Some(err),
            },
        }
    }
    if let Some(errors) = errors {
        return Err(errors);
    }

    for (i, method) in registered.iter().enumerate() {
        if let Some(dup) = registered[..i].iter().find(|m| m.name == method.name) {
            return Err(syn::Error::new(
                method.ident.span(),
                format!(
                    "method name `{}` is already registered by `{}`",
                    method.name, dup.ident
                ),
            ));
        }
    }

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();
    let declarations = registered.iter().map(|method| method.declaration(&engine));
    let methods_param = if registered.is_empty() {
        quote! { _methods }
    } else {
        quote! { methods }
    };

    Ok(quote! {
        #input

        impl #impl_generics #engine::Methods for #self_ty #where_clause {
            fn declare(#methods_param: &mut #engine::MethodSet<Self>) {
                #(#declarations)*
            }
        }
    })
}
