use proc_macro2::TokenStream;
use quote::quote;
use syn::{Error, ItemFn, ReturnType, Type};

const PROFILES: &str = "cooperative, multi_thread, or default";

/// Expands the `#[gpilot_runtime::main]` attribute macro.
#[must_use]
pub fn expand_main(args: TokenStream, input: ItemFn) -> TokenStream {
    if input.sig.asyncness.is_none() {
        return Error::new_spanned(
            &input.sig.ident,
            "#[gpilot_runtime::main] can only be used on async functions",
        )
        .to_compile_error();
    }

    if !returns_result(&input.sig.output) {
        return Error::new_spanned(
            &input.sig.output,
            "#[gpilot_runtime::main] requires a Result return type",
        )
        .to_compile_error();
    }

    let name = &input.sig.ident;
    let body = &input.block;
    let vis = &input.vis;
    let attrs = &input.attrs;
    let output = &input.sig.output;

    let profile = match parse_profile(args) {
        Ok(profile) => profile,
        Err(err) => return err,
    };

    quote! {
        #(#attrs)*
        #vis fn #name() #output {
            let config = #profile;
            let rt = ::gpilot_runtime::build_runtime_with_config(&config)?;
            rt.block_on(async { #body })
        }
    }
}

fn parse_profile(args: TokenStream) -> Result<TokenStream, TokenStream> {
    if args.is_empty() {
        return Ok(quote! { ::gpilot_runtime::RuntimeConfig::default() });
    }

    let ident: syn::Ident = syn::parse2(args).map_err(|err| err.to_compile_error())?;
    match ident.to_string().as_str() {
        "cooperative" => Ok(quote! { ::gpilot_runtime::RuntimeConfig::cooperative() }),
        "multi_thread" => Ok(quote! { ::gpilot_runtime::RuntimeConfig::multi_thread() }),
        "default" => Ok(quote! { ::gpilot_runtime::RuntimeConfig::default() }),
        _ => Err(Error::new_spanned(ident, format!("Unknown runtime profile. Use: {PROFILES}"))
            .to_compile_error()),
    }
}

fn returns_result(output: &ReturnType) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    let Type::Path(path) = &**ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|seg| seg.ident == "Result")
}
