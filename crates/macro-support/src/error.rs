use std::fmt;

use proc_macro2::TokenStream;
use quote::ToTokens;

/// An error raised while expanding `#[record_entry]`, carrying the span it should be reported at.
#[derive(Debug)]
pub struct Diagnostic {
    inner: syn::Error,
}

impl Diagnostic {
    /// An error reported at the macro invocation site.
    pub fn error<T: fmt::Display>(text: T) -> Self {
        Self {
            inner: syn::Error::new(proc_macro2::Span::call_site(), text),
        }
    }

    /// An error covering the tokens of `node`.
    pub fn spanned_error<N: ToTokens, T: fmt::Display>(node: N, text: T) -> Self {
        Self {
            inner: syn::Error::new_spanned(node, text),
        }
    }
}

impl From<syn::Error> for Diagnostic {
    fn from(inner: syn::Error) -> Self {
        Self { inner }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl ToTokens for Diagnostic {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(self.inner.to_compile_error());
    }
}

macro_rules! err_span {
    ($node:expr, $($msg:tt)*) => {
        $crate::error::Diagnostic::spanned_error(&$node, format!($($msg)*))
    };
}

macro_rules! bail_span {
    ($($t:tt)*) => {
        return Err(err_span!($($t)*).into())
    };
}
