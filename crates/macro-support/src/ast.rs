use proc_macro2::TokenStream;
use quote::{format_ident, quote, ToTokens};

use record_bridge_core::ENTRY_SYMBOL_PREFIX;

/// The calling convention an entry point is exported with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    Encapsulated,
    Raw,
}

impl Convention {
    pub fn from_ident(ident: &syn::Ident) -> Option<Self> {
        match ident.to_string().as_str() {
            "encapsulated" => Some(Convention::Encapsulated),
            "raw" => Some(Convention::Raw),
            _ => None,
        }
    }

    /// Number of arguments the annotated function has to take.
    pub fn arity(&self) -> usize {
        match self {
            Convention::Encapsulated => 2,
            Convention::Raw => 1,
        }
    }
}

#[derive(Debug)]
pub struct AstEntry {
    pub convention: Convention,
    pub ident: syn::Ident,
}

impl AstEntry {
    fn exported_ident(&self) -> syn::Ident {
        format_ident!("{}{}", ENTRY_SYMBOL_PREFIX, self.ident)
    }
}

impl ToTokens for AstEntry {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let ident = &self.ident;
        let exported = self.exported_ident();

        let new_tokens = match self.convention {
            Convention::Encapsulated => quote! {
                #[no_mangle]
                pub unsafe extern "C" fn #exported(
                    env: *const ::record_bridge_core::abi::HostEnv,
                    obj: ::record_bridge_core::abi::ObjectHandle,
                ) {
                    ::record_bridge_core::entry::run_encapsulated(env, obj, #ident)
                }
            },
            Convention::Raw => quote! {
                #[no_mangle]
                pub unsafe extern "C" fn #exported(
                    record: *mut ::record_bridge_core::abi::RecordAbi,
                ) {
                    ::record_bridge_core::entry::run_raw(record, #ident)
                }
            },
        };

        tokens.extend(new_tokens);
    }
}
