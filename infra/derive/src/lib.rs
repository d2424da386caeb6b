#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the `gpilot` infrastructure and feature crates:
//! the error-enum attribute every crate declares its failures with, the shared-state
//! handle of feature slices, and the runtime bootstrap attribute used by the binaries.
//!
//! Examples are `ignore`d here; the macros are exercised by the consuming crates
//! and by the `trybuild` suite under `tests/`.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bootstrap a Tokio runtime for one execution context.
///
/// Transforms an `async fn main` into a plain `fn main` that builds a runtime from
/// the selected [`RuntimeConfig`](../gpilot_runtime/struct.RuntimeConfig.html)
/// profile and blocks on the body.
///
/// # Arguments
///
/// * `cooperative` - Current-thread scheduler; one cooperative event loop.
/// * `multi_thread` - Work-stealing scheduler for hosts running several contexts.
/// * `default` - Same as `multi_thread` with auto-detected worker count.
///
/// # Examples
///
/// ```rust,ignore
/// #[gpilot_runtime::main(cooperative)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for declaring a crate's error enum.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * `<ErrorName>Ext` trait with `.context(...)` for `Result<T, ErrorName>` and for
///   `Result<T, SourceError>` of every variant carrying a source.
/// * `From<SourceError>` for variants with a `source` (or `#[source]`/`#[from]`) field.
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * `ErrorName::code(&self) -> &'static str`, the `snake_case` variant name. Failure
///   replies crossing a context boundary carry it as their `code` field.
///
/// # Requirements
///
/// 1. Applied to an **enum** with named-field variants only.
/// 2. Variants with a source must also carry `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use gpilot_derive::gpilot_error;
/// use std::borrow::Cow;
///
/// #[gpilot_error]
/// pub enum StoreError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// assert_eq!(StoreError::from("boom").code(), "internal");
/// ```
#[proc_macro_attribute]
pub fn gpilot_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_error(input).into()
}

/// Attribute macro for a feature slice's shared state.
///
/// The annotated struct is renamed `<Name>Inner` (deriving `Debug` and `Clone`), and
/// `<Name>` becomes an `Arc` handle with `new(inner)` that derefs to it.
///
/// # Example
///
/// ```rust,ignore
/// #[gpilot_derive::gpilot_slice]
/// pub struct SiteToggles {
///     max_disabled: usize,
/// }
///
/// let toggles = SiteToggles::new(SiteTogglesInner { max_disabled: 500 });
/// let shared = toggles.clone();
/// assert_eq!(shared.max_disabled, 500);
/// ```
#[proc_macro_attribute]
pub fn gpilot_slice(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
