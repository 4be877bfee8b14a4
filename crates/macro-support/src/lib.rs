use proc_macro2::TokenStream;
use quote::ToTokens;

#[macro_use]
mod error;
pub use crate::error::Diagnostic;

mod ast;
use ast::{AstEntry, Convention};

trait MacroParse {
    fn macro_parse(&self, convention: Convention) -> Result<AstEntry, Diagnostic>;
}

pub fn expand(attrs: TokenStream, tokens: TokenStream) -> Result<TokenStream, Diagnostic> {
    let convention = parse_convention(attrs)?;

    let item = syn::parse2::<syn::Item>(tokens)?;
    let entry = item.macro_parse(convention)?;

    let mut tokens = TokenStream::new();
    item.to_tokens(&mut tokens);
    entry.to_tokens(&mut tokens);

    Ok(tokens)
}

fn parse_convention(attrs: TokenStream) -> Result<Convention, Diagnostic> {
    if attrs.is_empty() {
        return Err(Diagnostic::error(
            "expected a calling convention: `encapsulated` or `raw`",
        ));
    }

    let ident = syn::parse2::<syn::Ident>(attrs)?;
    match Convention::from_ident(&ident) {
        Some(convention) => Ok(convention),
        None => bail_span!(
            ident,
            "unknown calling convention `{}`, expected `encapsulated` or `raw`",
            ident
        ),
    }
}

impl MacroParse for syn::Item {
    fn macro_parse(&self, convention: Convention) -> Result<AstEntry, Diagnostic> {
        match self {
            syn::Item::Fn(f) => f.macro_parse(convention),
            _ => Err(Diagnostic::spanned_error(
                self,
                "Only free functions can be exported as entry points",
            )),
        }
    }
}

impl MacroParse for syn::ItemFn {
    fn macro_parse(&self, convention: Convention) -> Result<AstEntry, Diagnostic> {
        let sig = &self.sig;

        if let Some(asyncness) = &sig.asyncness {
            bail_span!(asyncness, "Entry points can't be async");
        }
        if let Some(unsafety) = &sig.unsafety {
            bail_span!(unsafety, "Entry points can't be unsafe, the generated wrapper already is");
        }
        if let Some(abi) = &sig.abi {
            bail_span!(abi, "Remove the ABI, the generated wrapper provides one");
        }
        if !sig.generics.params.is_empty() {
            bail_span!(sig.generics, "Entry points can't be generic");
        }
        if let Some(variadic) = &sig.variadic {
            bail_span!(variadic, "Entry points can't be variadic");
        }

        for arg in sig.inputs.iter() {
            if let syn::FnArg::Receiver(r) = arg {
                bail_span!(r, "Methods can't be exported as entry points");
            }
        }

        if sig.inputs.len() != convention.arity() {
            bail_span!(
                sig.inputs,
                "A {:?} entry point takes {} argument(s), found {}",
                convention,
                convention.arity(),
                sig.inputs.len()
            );
        }

        if let syn::ReturnType::Default = sig.output {
            bail_span!(sig.ident, "Entry points must return a `Result`");
        }

        Ok(AstEntry {
            convention,
            ident: sig.ident.clone(),
        })
    }
}
