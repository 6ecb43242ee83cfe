/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Busline Macro Library
//!
//! Provides the [`message_handlers`] attribute, which turns annotated methods
//! of an inherent `impl` block into a `busline` `MessageHandler`
//! implementation.
//!
//! ```ignore
//! use busline::prelude::*;
//!
//! struct Screen;
//!
//! #[message_handlers]
//! impl Screen {
//!     #[handle(REFRESH)]
//!     fn refresh(&self) {}
//!
//!     #[handle_async(PRICE)]
//!     fn on_price(&self, price: &Price) {}
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;

use quote::{quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{parse_macro_input, Attribute, Expr, FnArg, ImplItem, ImplItemFn, ItemImpl, Type};

/// How one method was marked.
#[derive(Clone, Copy, PartialEq, Eq)]
enum MarkingKind {
    Sync,
    Async,
}

impl MarkingKind {
    fn tokens(self) -> TokenStream2 {
        match self {
            Self::Sync => quote!(::busline::prelude::Marking::Sync),
            Self::Async => quote!(::busline::prelude::Marking::Async),
        }
    }

    const fn helper(self, with_param: bool) -> &'static str {
        match (self, with_param) {
            (Self::Sync, false) => "handle",
            (Self::Sync, true) => "handle_with",
            (Self::Async, false) => "handle_async",
            (Self::Async, true) => "handle_async_with",
        }
    }
}

struct Marked {
    kind: MarkingKind,
    message_id: Expr,
}

/// Removes `#[handle]` / `#[handle_async]` from `attrs` and returns what they said.
fn take_markings(attrs: &mut Vec<Attribute>) -> syn::Result<Vec<Marked>> {
    let mut markings = Vec::new();
    let mut error: Option<syn::Error> = None;
    attrs.retain(|attr| {
        let kind = if attr.path().is_ident("handle") {
            MarkingKind::Sync
        } else if attr.path().is_ident("handle_async") {
            MarkingKind::Async
        } else {
            return true;
        };
        let message_id = match &attr.meta {
            syn::Meta::Path(_) => Ok(syn::parse_quote!(0)),
            syn::Meta::List(_) => attr.parse_args::<Expr>(),
            syn::Meta::NameValue(_) => Err(syn::Error::new(
                attr.span(),
                "expected `#[handle(message_id)]` or `#[handle_async(message_id)]`",
            )),
        };
        match message_id {
            Ok(message_id) => markings.push(Marked { kind, message_id }),
            Err(e) => match error.as_mut() {
                Some(existing) => existing.combine(e),
                None => error = Some(e),
            },
        }
        false
    });
    error.map_or(Ok(markings), Err)
}

/// One marked method, ready to be emitted into `declare`.
struct Binding {
    statement: TokenStream2,
    /// Declared but never invoked, so the method itself goes unused.
    uncallable: bool,
}

/// Builds the `Bindings` statement for one marked method.
fn binding_statement(self_ty: &Type, method: &ImplItemFn, markings: &[Marked]) -> syn::Result<Binding> {
    let sig = &method.sig;
    let name = &sig.ident;
    let name_str = name.to_string();

    match sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new(
                sig.span(),
                "message handler methods must take `&self`",
            ))
        }
    }
    if sig.asyncness.is_some() {
        return Err(syn::Error::new(sig.asyncness.span(), "message handler methods cannot be `async`"));
    }

    let params: Vec<&Type> = sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(typed) => Some(typed.ty.as_ref()),
            FnArg::Receiver(_) => None,
        })
        .collect();
    let arity = params.len();

    let first = &markings[0];
    let message_id = &first.message_id;
    let conflicting = markings.iter().any(|m| m.kind != first.kind);
    if !conflicting && markings.len() > 1 {
        return Err(syn::Error::new(
            sig.ident.span(),
            "a message handler method binds exactly one message id; found repeated markings",
        ));
    }

    // Signatures the bus rejects are described, not compiled, so that
    // registration reports them.
    if conflicting || arity > 1 {
        let marking = first.kind.tokens();
        let also = if conflicting {
            let other = markings
                .iter()
                .find(|m| m.kind != first.kind)
                .map_or(first.kind, |m| m.kind)
                .tokens();
            quote!(.also_marked(#other))
        } else {
            quote!()
        };
        return Ok(Binding {
            statement: quote_spanned! {sig.span()=>
                bindings.declare(
                    ::busline::prelude::BindingDecl::uncallable(#name_str, #message_id, #marking)
                        #also
                        .with_arity(#arity)
                );
            },
            uncallable: true,
        });
    }

    let helper = syn::Ident::new(first.kind.helper(arity == 1), name.span());
    let statement = match params.first() {
        None => quote! {
            bindings.#helper(#message_id, #name_str, |this: &#self_ty| this.#name());
        },
        Some(Type::Reference(reference)) if reference.mutability.is_none() => {
            let param = &reference.elem;
            quote! {
                bindings.#helper::<#param, _, _>(#message_id, #name_str, |this: &#self_ty, value: &#param| {
                    this.#name(value)
                });
            }
        }
        Some(Type::Reference(reference)) => {
            return Err(syn::Error::new(
                reference.span(),
                "message handler parameters cannot be `&mut`",
            ))
        }
        Some(param) => quote! {
            bindings.#helper::<#param, _, _>(#message_id, #name_str, |this: &#self_ty, value: &#param| {
                this.#name(::core::clone::Clone::clone(value))
            });
        },
    };
    Ok(Binding {
        statement,
        uncallable: false,
    })
}

fn expand(mut input: ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new(
            path.span(),
            "#[message_handlers] goes on an inherent impl block",
        ));
    }

    let self_ty = input.self_ty.as_ref().clone();
    let mut statements = Vec::new();
    let mut errors: Option<syn::Error> = None;
    let mut record = |e: syn::Error| match errors.as_mut() {
        Some(existing) => existing.combine(e),
        None => errors = Some(e),
    };

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        match take_markings(&mut method.attrs) {
            Ok(markings) if markings.is_empty() => {}
            Ok(markings) => match binding_statement(&self_ty, method, &markings) {
                Ok(binding) => {
                    if binding.uncallable {
                        method.attrs.push(syn::parse_quote!(#[allow(dead_code)]));
                    }
                    statements.push(binding.statement);
                }
                Err(e) => record(e),
            },
            Err(e) => record(e),
        }
    }
    if let Some(errors) = errors {
        return Err(errors);
    }

    let (impl_generics, _, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        #input

        impl #impl_generics ::busline::prelude::MessageHandler for #self_ty #where_clause {
            #[allow(unused_variables)]
            fn declare(bindings: &mut ::busline::prelude::Bindings<Self>) {
                #(#statements)*
            }
        }
    })
}

/// Generates a `MessageHandler` implementation from an inherent `impl` block.
///
/// Mark each handler method with one of:
///
/// * `#[handle(id)]`: delivered on the dispatch thread (or the posting thread
///   for immediate posts),
/// * `#[handle_async(id)]`: delivered on the worker pool.
///
/// `id` is any expression of type `MessageId`; a bare `#[handle]` means id `0`.
///
/// Methods take `&self` and at most one parameter. A `&P` parameter receives the
/// payload by reference; a `P` parameter receives a clone and needs
/// `P: Clone`. Methods may return `()` or `Result<(), E>`.
///
/// A method marked both ways, or declaring more than one parameter, still
/// compiles: registering the type fails with `BusError::ConflictingBinding` or
/// `BusError::InvalidBindingSignature`. Marking a method twice the same way is
/// a compile error.
#[proc_macro_attribute]
pub fn message_handlers(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let attr = TokenStream2::from(attr);
        return syn::Error::new(attr.span(), "#[message_handlers] takes no arguments")
            .to_compile_error()
            .into();
    }
    let input = parse_macro_input!(item as ItemImpl);
    expand(input).unwrap_or_else(syn::Error::into_compile_error).into()
}
