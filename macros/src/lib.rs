//! Procedural macro behind `webapi_core::web_api`.
//!
//! # Attributes
//! On the trait:
//! - `#[web_api(path = "...", media_type = "json" | "xml" | "form")]`, which
//!   must be the first attribute so the ones below are still attached when
//!   it runs.
//! - `#[header("Key", "value", ...)]`, repeatable.
//!
//! On methods:
//! - `#[get]`, `#[post]`, `#[put]`, `#[delete]`, each with an optional URI
//!   template: `#[get("items/{id}")]`. Without a template the method name is
//!   used as the path segment.
//! - `#[header(...)]`, appended after the trait's headers.
//!
//! On parameters:
//! - `#[path]`, `#[query]`, `#[field]`, each with an optional alias:
//!   `#[query("q")]`.
//! - `#[body]`, at most one per method.
//!
//! Unannotated parameters are sent as query parameters.

use proc_macro::TokenStream;

mod expand;
mod parse;

/// Generate a `<Trait>Client` implementing the annotated trait over HTTP.
#[proc_macro_attribute]
pub fn web_api(args: TokenStream, item: TokenStream) -> TokenStream {
    expand::web_api(args.into(), item.into()).into()
}
