use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Type, parse_quote};

fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else { return false };
    path.path.segments.last().is_some_and(|segment| segment.ident == "Option")
}

pub fn display(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(name, "ConfigDisplay can only be applied to structs"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(name, "ConfigDisplay requires named fields"));
    };

    let writes = fields.named.iter().map(|field| {
        let ident = &field.ident;
        let label = ident.as_ref().map(ToString::to_string).unwrap_or_default();
        let debug_fmt = field.attrs.iter().any(|attr| attr.path().is_ident("debug_fmt"));
        let fmt = if debug_fmt { "{:?}" } else { "{}" };

        let value = if is_option(&field.ty) {
            quote! {
                match &self.#ident {
                    ::std::option::Option::Some(value) => ::std::write!(f, #fmt, value)?,
                    ::std::option::Option::None => f.write_str("<None>")?,
                }
            }
        } else {
            quote! { ::std::write!(f, #fmt, self.#ident)?; }
        };

        quote! {
            ::std::write!(f, "\n  {}: ", #label)?;
            #value
        }
    });

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::std::fmt::Display));
        param.bounds.push(parse_quote!(::std::fmt::Debug));
    }
    let (impl_generics, type_generics, where_clause) = generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #type_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #(#writes)*
                ::std::result::Result::Ok(())
            }
        }
    })
}
