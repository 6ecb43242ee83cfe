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

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, ItemFn, ReturnType};

#[proc_macro_attribute]
pub fn busline_test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    if let Some(asyncness) = &input.sig.asyncness {
        return syn::Error::new_spanned(asyncness, "#[busline_test] functions are synchronous")
            .to_compile_error()
            .into();
    }

    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;
    let attrs = &input.attrs;
    let name = &sig.ident;
    let output = &sig.output;

    let inner_name = syn::Ident::new(&format!("__{name}_body"), name.span());

    let finish = match output {
        ReturnType::Default => quote! { #inner_name(); },
        ReturnType::Type(..) => quote! {
            if let Err(err) = #inner_name() {
                ::busline_test::__private::tracing::error!("Test failed: {:?}", err);
                panic!("{} failed: {:?}", stringify!(#name), err);
            }
        },
    };

    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis fn #name() {
            ::busline_test::init_test_tracing();
            let test_span = ::busline_test::__private::tracing::info_span!("busline_test", name = stringify!(#name));
            let _enter = test_span.enter();
            #finish
        }

        fn #inner_name() #output #body
    };

    expanded.into()
}
