//! # Wire Codec
//!
//! A declarative binary codec: `#[derive(WireCodec)]` a struct, tag each
//! field with a `#[wire(...)]` directive describing its wire shape, and get
//! bit-accurate `to_bytes`/`from_bytes`/`describe` for it.
//!
//! ## Example
//! ```
//! use wire_codec::*;
//!
//! #[derive(WireCodec, PartialEq, Debug, Default)]
//! struct Header {
//!     #[wire(fixed = [0x7F, 0x80])]
//!     magic: u16,
//!     #[wire(big = 3)]
//!     start: u32,
//!     #[wire(little = 3)]
//!     end: u32,
//!     #[wire(fixed = [0x55, 0xAA])]
//!     trailer: u16,
//! }
//!
//! fn example() {
//!     let header = Header { magic: 0, start: 0x123456, end: 0x234567, trailer: 0 };
//!     let bytes = to_bytes(&header);
//!     assert_eq!(bytes, vec![0x7F, 0x80, 0x12, 0x34, 0x56, 0x67, 0x45, 0x23, 0x55, 0xAA]);
//!     let (decoded, ok) = from_bytes::<Header>(&bytes);
//!     assert!(ok);
//!     assert_eq!(decoded, header);
//! }
//! ```

pub mod bitio;
pub mod decode;
pub mod describe;
pub mod directive;
pub mod encode;
pub mod error;

pub use bitio::{BitReader, BitWriter, Position};
pub use decode::{Specialise, Specialised, WireCodec};
pub use describe::DescribedValue;
pub use directive::{layout_of, FieldDirective, FieldSpec, HasLayout, StructSpec};
pub use error::{CodecError, CodecResult};
pub use wire_codec_derive::WireCodec;

/// Packs `value` into bytes per its layout. Panics on an `EncodeError`
/// (length/count mismatch); call [`try_to_bytes`] to get a `Result` instead.
pub fn to_bytes<T: WireCodec>(value: &T) -> Vec<u8> {
    try_to_bytes(value).expect("encode error")
}

/// Fallible form of [`to_bytes`].
pub fn try_to_bytes<T: WireCodec>(value: &T) -> CodecResult<Vec<u8>> {
    let mut writer = BitWriter::new();
    value.encode_fields(&mut writer)?;
    Ok(writer.finish())
}

/// Decodes `T` from the whole of `data`. Returns the decoded value (possibly
/// partial, with under-run fields at their default) and whether decoding
/// completed without running past the end of `data`.
pub fn from_bytes<T: WireCodec>(data: &[u8]) -> (T, bool) {
    from_bytes_at(data, 0, data.len())
}

/// Decodes `T` from `data[start .. start + length]`.
pub fn from_bytes_at<T: WireCodec>(data: &[u8], start: usize, length: usize) -> (T, bool) {
    let mut reader = BitReader::new(data, start, length);
    let value = T::decode_fields(&mut reader);
    (value, !reader.over_run())
}

/// Decodes a specialisable `T` from the whole of `data`, running the two-pass
/// specialisation traversal.
pub fn from_bytes_specialised<T: Specialise>(data: &[u8]) -> (Specialised<T, T::Variant>, bool) {
    from_bytes_specialised_at(data, 0, data.len())
}

pub fn from_bytes_specialised_at<T: Specialise>(
    data: &[u8],
    start: usize,
    length: usize,
) -> (Specialised<T, T::Variant>, bool) {
    let mut reader = BitReader::new(data, start, length);
    let outcome = decode::decode_specialised::<T>(&mut reader);
    (outcome, !reader.over_run())
}

/// Renders `value` as a human-readable, indented field tree.
pub fn describe<T: WireCodec>(value: &T) -> String {
    describe::describe_fields(&value.describe_fields())
}
