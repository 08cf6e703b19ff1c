//! Derive macro for binary serialization of fixed-layout records.
//!
//! Generates `Encode` and `Decode` implementations over the crate's
//! `types::encoding` traits. Fields serialize in declaration order with the
//! byte order the field types define (little-endian for all integers), so a
//! derived struct doubles as an on-disk layout description.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

pub fn expand(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match try_expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn try_expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "BinaryCodec derive supports structs only",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "BinaryCodec derive requires named fields",
        ));
    };

    let name = &input.ident;
    let field_names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();

    Ok(quote! {
        impl crate::types::encoding::Encode for #name {
            fn encode<S: crate::types::encoding::EncodeSink>(&self, out: &mut S) {
                #( crate::types::encoding::Encode::encode(&self.#field_names, out); )*
            }
        }

        impl crate::types::encoding::Decode for #name {
            fn decode(
                input: &mut &[u8],
            ) -> ::std::result::Result<Self, crate::types::encoding::DecodeError> {
                Ok(Self {
                    #( #field_names: crate::types::encoding::Decode::decode(input)?, )*
                })
            }
        }
    })
}
