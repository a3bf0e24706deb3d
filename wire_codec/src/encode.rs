//! Encoder: per-directive write semantics.
//!
//! Mirrors `decode.rs`: the derive macro generates the field-by-field call
//! sequence, this module owns the actual bit-twiddling and the
//! length/count-mismatch validation.

use crate::bitio::BitWriter;
use crate::error::{CodecError, CodecResult};

pub fn encode_big_endian(writer: &mut BitWriter, value: u64, bytes: u8) {
    writer.write_bytes_big_endian(value, bytes);
}

pub fn encode_little_endian(writer: &mut BitWriter, value: u64, bytes: u8) {
    writer.write_bytes_little_endian(value, bytes);
}

pub fn encode_partial_bits(writer: &mut BitWriter, value: u64, bits: u8) {
    writer.write_bits_big_endian(value, bits);
}

/// Front-pads with zero bytes if `value` is shorter than `n`, front-truncates
/// if longer.
pub fn encode_fixed_bytes(writer: &mut BitWriter, value: &[u8], n: usize) {
    if value.len() < n {
        for _ in 0..(n - value.len()) {
            writer.push_byte(0);
        }
        for &b in value {
            writer.push_byte(b);
        }
    } else {
        for &b in &value[value.len() - n..] {
            writer.push_byte(b);
        }
    }
}

pub fn encode_ascii_fixed(writer: &mut BitWriter, value: &str, n: usize) {
    let bytes: Vec<u8> = value.bytes().collect();
    encode_fixed_bytes(writer, &bytes, n);
}

/// `actual_length` is the result of calling the field's length-source
/// callback against the fully-formed value; `supplied` is the field's
/// in-memory byte array. They must match or the encode fails.
pub fn encode_variable_bytes(
    writer: &mut BitWriter,
    field_name: &str,
    supplied: &[u8],
    actual_length: usize,
) -> CodecResult<()> {
    if supplied.len() != actual_length {
        return Err(CodecError::encode(format!(
            "field {field_name}: length source returned {actual_length} but the supplied array has {} bytes",
            supplied.len()
        )));
    }
    for &b in supplied {
        writer.push_byte(b);
    }
    Ok(())
}

/// Writes `value`, appending `stop` unless `value` already ends with it.
pub fn encode_terminated_bytes(writer: &mut BitWriter, value: &[u8], stop: u8) {
    for &b in value {
        writer.push_byte(b);
    }
    if value.last() != Some(&stop) {
        writer.push_byte(stop);
    }
}

pub fn encode_remaining(writer: &mut BitWriter, value: &[u8]) {
    for &b in value {
        writer.push_byte(b);
    }
}

pub fn encode_child<T: crate::decode::WireCodec>(writer: &mut BitWriter, value: &T) -> CodecResult<()> {
    value.encode_fields(writer)
}

/// Writes whichever of `Base`/`Variant` the field actually holds; the wire
/// shape is determined by the decoded variant, not the base type.
pub fn encode_child_specialised<B, V>(
    writer: &mut BitWriter,
    value: &crate::decode::Specialised<B, V>,
) -> CodecResult<()>
where
    B: crate::decode::WireCodec,
    V: crate::decode::WireCodec,
{
    match value {
        crate::decode::Specialised::Base(base) => base.encode_fields(writer),
        crate::decode::Specialised::Variant(variant) => variant.encode_fields(writer),
    }
}

pub fn encode_child_fixed_repeat<T: crate::decode::WireCodec>(
    writer: &mut BitWriter,
    field_name: &str,
    values: &[T],
    count: usize,
) -> CodecResult<()> {
    if values.len() != count {
        return Err(CodecError::encode(format!(
            "field {field_name}: declared a fixed repeat of {count} but the supplied sequence has {} elements",
            values.len()
        )));
    }
    for v in values {
        v.encode_fields(writer)?;
    }
    Ok(())
}

pub fn encode_child_variable_repeat<T: crate::decode::WireCodec>(
    writer: &mut BitWriter,
    field_name: &str,
    values: &[T],
    actual_count: usize,
) -> CodecResult<()> {
    if values.len() != actual_count {
        return Err(CodecError::encode(format!(
            "field {field_name}: count source returned {actual_count} but the supplied sequence has {} elements",
            values.len()
        )));
    }
    for v in values {
        v.encode_fields(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_bytes_front_pads_short_values() {
        let mut w = BitWriter::new();
        encode_fixed_bytes(&mut w, &[0xAB], 3);
        assert_eq!(w.finish(), vec![0x00, 0x00, 0xAB]);
    }

    #[test]
    fn fixed_bytes_front_truncates_long_values() {
        let mut w = BitWriter::new();
        encode_fixed_bytes(&mut w, &[0x11, 0x22, 0x33, 0x44], 2);
        assert_eq!(w.finish(), vec![0x33, 0x44]);
    }

    #[test]
    fn terminator_appends_stop_when_missing() {
        let mut w = BitWriter::new();
        encode_terminated_bytes(&mut w, b"Hello", 0);
        assert_eq!(w.finish(), b"Hello\0".to_vec());
    }

    #[test]
    fn terminator_does_not_duplicate_existing_stop() {
        let mut w = BitWriter::new();
        encode_terminated_bytes(&mut w, b"Hello\0", 0);
        assert_eq!(w.finish(), b"Hello\0".to_vec());
    }

    #[test]
    fn variable_bytes_length_mismatch_errors() {
        let mut w = BitWriter::new();
        let result = encode_variable_bytes(&mut w, "payload", &[1, 2, 3], 4);
        assert!(matches!(result, Err(CodecError::Encode(_))));
    }
}
