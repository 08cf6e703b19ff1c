//! Derive macros for the bytevm crate.
//!
//! Provides:
//! - `#[derive(Error)]` - error type boilerplate (thiserror replacement)
//! - `#[derive(BinaryCodec)]` - automatic little-endian binary serialization

mod codec;
mod error;

use proc_macro::TokenStream;

/// Automatically implements `Display` and `Error` for an error enum.
///
/// Every variant must carry an `#[error("...")]` attribute with the display
/// message. Named fields interpolate as `{field}`, tuple fields as `{0}`.
#[proc_macro_derive(Error, attributes(error))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::expand(input)
}

/// Automatically implements the crate's `Encode` and `Decode` traits.
///
/// Fields are serialized in declaration order, little-endian. Only structs
/// with named fields are supported; fixed-layout records are the single use
/// case in this crate.
#[proc_macro_derive(BinaryCodec)]
pub fn derive_binary_codec(input: TokenStream) -> TokenStream {
    codec::expand(input)
}
