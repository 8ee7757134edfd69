use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident};

fn fieldless_variants<'a>(input: &'a DeriveInput, derive: &str) -> syn::Result<Vec<&'a Ident>> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            format!("{derive} can only be applied to enums"),
        ));
    };

    data.variants
        .iter()
        .map(|variant| match variant.fields {
            Fields::Unit => Ok(&variant.ident),
            _ => Err(syn::Error::new_spanned(
                variant,
                format!("{derive} only supports fieldless variants"),
            )),
        })
        .collect()
}

pub fn display(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let variants = fieldless_variants(input, "EnumDisplay")?;
    let labels: Vec<_> = variants.iter().map(ToString::to_string).collect();

    Ok(quote! {
        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match *self {
                    #(Self::#variants => f.write_str(#labels),)*
                }
            }
        }
    })
}

pub fn all(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let variants = fieldless_variants(input, "EnumAll")?;
    let len = variants.len();

    Ok(quote! {
        impl #name {
            pub const ALL: [Self; #len] = [#(Self::#variants,)*];
        }
    })
}
