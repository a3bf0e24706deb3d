//! Decoder: per-directive read semantics plus the generic
//! specialisation traversal contract.
//!
//! The derive macro generates, per struct, a `decode_fields` body that calls
//! straight into the functions below in field-declaration order — this file
//! is where the actual "per-directive semantics" table lives, shared by
//! every generated type instead of being re-emitted per field.

use crate::bitio::BitReader;

/// The maximum length honoured for a variable-length byte array. Anything
/// the length callback reports beyond this yields an empty array without
/// advancing the reader.
pub const SAFETY_LIMIT: usize = 10_240;

pub fn decode_big_endian(reader: &mut BitReader, bytes: u8) -> u64 {
    let mut value: u64 = 0;
    for _ in 0..bytes {
        value = (value << 8) | reader.next_byte() as u64;
    }
    value
}

pub fn decode_little_endian(reader: &mut BitReader, bytes: u8) -> u64 {
    let mut value: u64 = 0;
    for i in 0..bytes {
        value |= (reader.next_byte() as u64) << (i * 8);
    }
    value
}

pub fn decode_partial_bits(reader: &mut BitReader, bits: u8) -> u64 {
    reader.next_bits_wide(bits)
}

pub fn decode_fixed_bytes(reader: &mut BitReader, n: usize) -> Vec<u8> {
    reader.read_bytes(n)
}

pub fn decode_ascii_fixed(reader: &mut BitReader, n: usize) -> String {
    let bytes = reader.read_bytes(n);
    bytes.iter().map(|&b| b as char).collect()
}

/// `n < 1` (including the "negative" case the source language allows, which
/// has no representation once `length_source` returns `usize`) or `n >
/// SAFETY_LIMIT` yields an empty array without advancing the reader.
pub fn decode_variable_bytes(reader: &mut BitReader, n: usize) -> Vec<u8> {
    if n < 1 || n > SAFETY_LIMIT {
        log::warn!("variable-length field requested {n} bytes, outside 1..={SAFETY_LIMIT}; yielding empty array");
        return Vec::new();
    }
    reader.read_bytes(n)
}

pub fn decode_terminated_bytes(reader: &mut BitReader, stop: u8) -> Vec<u8> {
    reader.read_until(stop)
}

pub fn decode_remaining(reader: &mut BitReader) -> Vec<u8> {
    let n = reader.remaining();
    reader.read_bytes(n)
}

pub fn decode_child<T: WireCodec>(reader: &mut BitReader) -> T {
    T::decode_fields(reader)
}

pub fn decode_child_fixed_repeat<T: WireCodec>(reader: &mut BitReader, count: usize) -> Vec<T> {
    (0..count).map(|_| T::decode_fields(reader)).collect()
}

pub fn decode_child_variable_repeat<T: WireCodec>(reader: &mut BitReader, count: usize) -> Vec<T> {
    if count > SAFETY_LIMIT {
        log::warn!("variable repeat requested {count} children, outside 0..={SAFETY_LIMIT}; yielding empty array");
        return Vec::new();
    }
    (0..count).map(|_| T::decode_fields(reader)).collect()
}

/// Implemented by every `#[derive(WireCodec)]` type. `decode_fields`/
/// `encode_fields` are the generated field-by-field traversal; everything
/// else in this crate's public API is built on top of them.
pub trait WireCodec: Default + crate::directive::HasLayout {
    /// Reads this type's declared fields, in order, from `reader`. Never
    /// fails outright — an exhausted reader latches `reader.over_run()` and
    /// leaves the remaining fields at their `Default` value.
    fn decode_fields(reader: &mut BitReader) -> Self;

    /// Writes this type's declared fields, in order, to `writer`.
    fn encode_fields(&self, writer: &mut crate::bitio::BitWriter) -> crate::error::CodecResult<()>;

    /// Renders this value as a flat list of `(field name, rendered value)`
    /// pairs for the [`crate::describe`] module. Nested structures render
    /// their own tree and are passed through as [`crate::describe::DescribedValue::Nested`].
    fn describe_fields(&self) -> Vec<(&'static str, crate::describe::DescribedValue)>;
}

/// Implemented by a base structure whose declared fields are followed by an
/// optional specialiser: after decoding the base fields, `specialise` may
/// redirect the two-pass decoder to a distinct, wire-compatible subtype.
///
/// Modelled as an associated type rather than a name-based lookup because
/// Rust resolves the target type at compile time rather than by a
/// runtime name lookup.
pub trait Specialise: WireCodec {
    type Variant: WireCodec;

    /// Inspects the (fully base-decoded) value and decides whether to
    /// switch to `Variant`. Returning `true` means "rewind and re-decode as
    /// `Variant`".
    fn should_specialise(&self) -> bool;
}

/// The outcome of a two-pass specialised decode: either the base type's
/// fields were sufficient, or the specialiser chose `Variant` and a second
/// pass produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specialised<B, V> {
    Base(B),
    Variant(V),
}

/// A freshly-`default()`ed field hasn't been decoded yet, so it holds a
/// default `Base` until the derive macro's decode statement overwrites it.
impl<B: Default, V> Default for Specialised<B, V> {
    fn default() -> Self {
        Specialised::Base(B::default())
    }
}

/// Runs the decode traversal for a specialised type: snapshot, decode
/// base fields, consult the specialiser, and — if it redirects — rewind
/// and decode `T::Variant` instead.
pub fn decode_specialised<T: Specialise>(reader: &mut BitReader) -> Specialised<T, T::Variant> {
    let snapshot = reader.position();
    let base = T::decode_fields(reader);
    if base.should_specialise() {
        log::debug!("specialiser redirected decode to a variant type");
        reader.reset_to(snapshot);
        Specialised::Variant(T::Variant::decode_fields(reader))
    } else {
        Specialised::Base(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_reads_msb_first() {
        let data = [0x12, 0x34, 0x56];
        let mut r = BitReader::new(&data, 0, data.len());
        assert_eq!(decode_big_endian(&mut r, 3), 0x123456);
    }

    #[test]
    fn little_endian_reads_lsb_first() {
        let data = [0x12, 0x34, 0x56];
        let mut r = BitReader::new(&data, 0, data.len());
        assert_eq!(decode_little_endian(&mut r, 3), 0x563412);
    }

    #[test]
    fn variable_bytes_zero_length_yields_empty_without_advancing() {
        let data = [0xAA, 0xBB];
        let mut r = BitReader::new(&data, 0, data.len());
        assert_eq!(decode_variable_bytes(&mut r, 0), Vec::<u8>::new());
        // reader untouched: next byte is still 0xAA
        assert_eq!(r.next_byte(), 0xAA);
    }

    #[test]
    fn variable_bytes_beyond_safety_limit_yields_empty() {
        let data = [0xAA, 0xBB];
        let mut r = BitReader::new(&data, 0, data.len());
        assert_eq!(decode_variable_bytes(&mut r, SAFETY_LIMIT + 1), Vec::<u8>::new());
    }

    #[test]
    fn ascii_fixed_decodes_text() {
        let data = b"GOOD";
        let mut r = BitReader::new(data, 0, data.len());
        assert_eq!(decode_ascii_fixed(&mut r, 4), "GOOD".to_string());
    }
}
