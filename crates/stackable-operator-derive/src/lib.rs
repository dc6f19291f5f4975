use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod fragment;

/// Generates a "fragment" mirror type where every field is wrapped so that it may be partially
/// specified, plus a [`FromFragment`](stackable_operator::config::fragment::FromFragment) impl
/// that validates a fragment back into the original type.
///
/// See `stackable_operator::config::fragment` for usage details.
#[proc_macro_derive(Fragment, attributes(fragment, fragment_attrs))]
pub fn fragment(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    fragment::derive(input).into()
}
