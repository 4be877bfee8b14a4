//! `#[record_entry(encapsulated)]` and `#[record_entry(raw)]`.
//!
//! Keeps the annotated function and exports an `extern "C"` wrapper for it named
//! `record_bridge_<function name>`. See `record_bridge_core::entry` for the runtime half.

extern crate proc_macro;
use self::proc_macro::TokenStream;

use quote::quote;

#[proc_macro_attribute]
pub fn record_entry(attr: TokenStream, input: TokenStream) -> TokenStream {
    match record_bridge_macro_support::expand(attr.into(), input.into()) {
        Ok(tokens) => tokens.into(),
        Err(diag) => (quote! { #diag }).into(),
    }
}
