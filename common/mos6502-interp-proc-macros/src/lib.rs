//! Derive macros for the interpreter's configuration types

mod config;
mod enums;

use proc_macro::TokenStream;
use syn::DeriveInput;

/// Implement `std::fmt::Display` for an enum with only fieldless variants. Each variant is
/// printed as its name.
///
/// ```
/// use mos6502_interp_proc_macros::EnumDisplay;
///
/// #[derive(EnumDisplay)]
/// enum Policy {
///     Ignore,
///     WriteThrough,
/// }
///
/// assert_eq!(Policy::WriteThrough.to_string(), "WriteThrough");
/// ```
#[proc_macro_derive(EnumDisplay)]
pub fn enum_display(input: TokenStream) -> TokenStream {
    expand(input, enums::display)
}

/// Add an `ALL: [Self; N]` constant listing every variant of a fieldless enum in declaration
/// order.
#[proc_macro_derive(EnumAll)]
pub fn enum_all(input: TokenStream) -> TokenStream {
    expand(input, enums::all)
}

/// Implement `std::fmt::Display` for a config struct with named fields, one `  name: value` line
/// per field after a leading newline.
///
/// Fields marked `#[debug_fmt]` are printed with `Debug`. `Option` fields print the inner value,
/// or `<None>`.
///
/// ```
/// use mos6502_interp_proc_macros::ConfigDisplay;
///
/// #[derive(ConfigDisplay)]
/// struct Limits {
///     steps: Option<u64>,
///     #[debug_fmt]
///     name: String,
/// }
///
/// let limits = Limits { steps: None, name: "call".into() };
/// assert_eq!(format!("limits:{limits}"), "limits:\n  steps: <None>\n  name: \"call\"");
/// ```
#[proc_macro_derive(ConfigDisplay, attributes(debug_fmt))]
pub fn config_display(input: TokenStream) -> TokenStream {
    expand(input, config::display)
}

fn expand(
    input: TokenStream,
    derive: fn(&DeriveInput) -> syn::Result<proc_macro2::TokenStream>,
) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    derive(&input).unwrap_or_else(syn::Error::into_compile_error).into()
}
