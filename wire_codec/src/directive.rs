//! The Layout Model: per-field directives, per-structure specs, and the
//! process-wide cache keyed by type identity.
//!
//! `#[derive(WireCodec)]` (in the sibling `wire_codec_derive` crate) produces,
//! for each annotated struct, an implementation of [`WireCodec`] whose
//! `build_spec()` returns the [`StructSpec`] described here. It is
//! mostly consumed by the [`crate::describe`] module and by
//! [`layout_of`]'s validation pass; the actual field-by-field decode/encode
//! walk is generated straight-line code (see [`crate::decode`] /
//! [`crate::encode`]) that performs the same traversal this data describes.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::error::{CodecError, CodecResult};

/// One field's wire-level shape. Order corresponds 1:1 to declaration order
/// in the annotated struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDirective {
    BigEndianInt { bytes: u8 },
    LittleEndianInt { bytes: u8 },
    PartialBits { bits: u8 },
    ByteArrayFixed { bytes: usize },
    AsciiStringFixed { bytes: usize },
    ByteArrayVariable { length_source: &'static str },
    ByteArrayTerminated { stop: u8 },
    RemainingBytes,
    Child,
    ChildSpecialised,
    ChildFixedRepeat { count: usize },
    ChildVariableRepeat { count_source: &'static str },
}

/// A declared literal constraint on a field's wire bytes (big-endian order;
/// the encoder reverses it for little-endian directives).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedValue(pub Vec<u8>);

/// Metadata describing one field: its name, directive, and optional fixed
/// value constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub order: usize,
    pub name: &'static str,
    pub directive: FieldDirective,
    pub fixed: Option<FixedValue>,
}

/// Ordered field metadata for one structure, plus an optional specialiser
/// hook name (informational — the actual dispatch is the [`crate::decode::Specialise`]
/// trait, resolved at compile time rather than by name lookup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructSpec {
    pub type_name: &'static str,
    pub fields: Vec<FieldSpec>,
    pub specialise_with: Option<&'static str>,
}

impl StructSpec {
    /// Validates invariants that are not already enforced by construction
    /// (order uniqueness and "unrecognised directive" are compile-time
    /// guarantees of the derive macro, so they are not re-checked here).
    pub fn validate(&self) -> CodecResult<()> {
        self.validate_fixed_value_lengths()?;
        self.validate_partial_bit_runs()?;
        self.validate_remaining_bytes_position()?;
        Ok(())
    }

    fn validate_fixed_value_lengths(&self) -> CodecResult<()> {
        for field in &self.fields {
            if let Some(FixedValue(bytes)) = &field.fixed {
                let declared = match field.directive {
                    FieldDirective::BigEndianInt { bytes } | FieldDirective::LittleEndianInt { bytes } => {
                        bytes as usize
                    }
                    FieldDirective::ByteArrayFixed { bytes } | FieldDirective::AsciiStringFixed { bytes } => bytes,
                    _ => {
                        return Err(CodecError::configuration(format!(
                            "{}::{} has a fixed value constraint but its directive does not support one",
                            self.type_name, field.name
                        )))
                    }
                };
                if bytes.len() != declared {
                    return Err(CodecError::configuration(format!(
                        "{}::{} fixed value is {} bytes but its directive declares {} bytes",
                        self.type_name,
                        field.name,
                        bytes.len(),
                        declared
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_partial_bit_runs(&self) -> CodecResult<()> {
        let mut run_bits: u32 = 0;
        for field in &self.fields {
            match field.directive {
                FieldDirective::PartialBits { bits } => run_bits += bits as u32,
                _ => {
                    if run_bits % 8 != 0 {
                        return Err(CodecError::configuration(format!(
                            "{} has a run of partial-bit fields totalling {} bits before field {}, which is not byte-aligned",
                            self.type_name, run_bits, field.name
                        )));
                    }
                    run_bits = 0;
                }
            }
        }
        if run_bits % 8 != 0 {
            return Err(CodecError::configuration(format!(
                "{} ends with a run of partial-bit fields totalling {} bits, which is not byte-aligned",
                self.type_name, run_bits
            )));
        }
        Ok(())
    }

    fn validate_remaining_bytes_position(&self) -> CodecResult<()> {
        let remaining_positions: Vec<usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| matches!(f.directive, FieldDirective::RemainingBytes))
            .map(|(i, _)| i)
            .collect();
        match remaining_positions.as_slice() {
            [] => Ok(()),
            [only] if *only == self.fields.len() - 1 => Ok(()),
            [only] => Err(CodecError::configuration(format!(
                "{} has a RemainingBytes field ({}) that is not the last field by order",
                self.type_name, self.fields[*only].name
            ))),
            _ => Err(CodecError::configuration(format!(
                "{} declares more than one RemainingBytes field",
                self.type_name
            ))),
        }
    }
}

/// Implemented by every `#[derive(WireCodec)]` type. `build_spec` is cheap
/// and pure (it allocates a fresh `StructSpec` describing the static
/// layout); callers should go through [`layout_of`] to get the cached,
/// validated copy instead of calling this directly.
pub trait HasLayout: Any {
    fn build_spec() -> StructSpec
    where
        Self: Sized;
}

type LayoutCache = Mutex<HashMap<TypeId, Arc<StructSpec>>>;

fn layout_cache() -> &'static LayoutCache {
    static CACHE: OnceLock<LayoutCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the validated, process-wide-cached [`StructSpec`] for `T`,
/// building and publishing it on first use. Subsequent calls are a map
/// lookup under a short-lived lock plus an `Arc` clone — no further
/// allocation or validation.
///
/// Panics if `T`'s layout fails validation (a `ConfigurationError`):
/// configuration errors are schema defects, not recoverable runtime
/// conditions, so they surface immediately rather than being threaded
/// through every caller's `Result`.
pub fn layout_of<T: HasLayout + 'static>() -> Arc<StructSpec> {
    let type_id = TypeId::of::<T>();
    {
        let cache = layout_cache().lock().expect("layout cache poisoned");
        if let Some(spec) = cache.get(&type_id) {
            return spec.clone();
        }
    }

    let spec = T::build_spec();
    log::debug!("publishing layout for {}", spec.type_name);
    if let Err(e) = spec.validate() {
        panic!("invalid layout for {}: {}", spec.type_name, e);
    }
    let spec = Arc::new(spec);

    let mut cache = layout_cache().lock().expect("layout cache poisoned");
    cache.entry(type_id).or_insert(spec).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with(fields: Vec<FieldSpec>) -> StructSpec {
        StructSpec { type_name: "Test", fields, specialise_with: None }
    }

    #[test]
    fn fixed_value_length_mismatch_is_configuration_error() {
        let spec = spec_with(vec![FieldSpec {
            order: 0,
            name: "a",
            directive: FieldDirective::BigEndianInt { bytes: 2 },
            fixed: Some(FixedValue(vec![0x7F])),
        }]);
        assert!(matches!(spec.validate(), Err(CodecError::Configuration(_))));
    }

    #[test]
    fn fixed_value_length_match_is_ok() {
        let spec = spec_with(vec![FieldSpec {
            order: 0,
            name: "a",
            directive: FieldDirective::BigEndianInt { bytes: 2 },
            fixed: Some(FixedValue(vec![0x7F, 0x80])),
        }]);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn partial_bits_run_must_be_byte_aligned() {
        let spec = spec_with(vec![
            FieldSpec { order: 0, name: "a", directive: FieldDirective::PartialBits { bits: 3 }, fixed: None },
            FieldSpec { order: 1, name: "b", directive: FieldDirective::PartialBits { bits: 4 }, fixed: None },
        ]);
        assert!(matches!(spec.validate(), Err(CodecError::Configuration(_))));
    }

    #[test]
    fn partial_bits_run_byte_aligned_is_ok() {
        let spec = spec_with(vec![
            FieldSpec { order: 0, name: "a", directive: FieldDirective::PartialBits { bits: 3 }, fixed: None },
            FieldSpec { order: 1, name: "b", directive: FieldDirective::PartialBits { bits: 2 }, fixed: None },
            FieldSpec { order: 2, name: "c", directive: FieldDirective::PartialBits { bits: 3 }, fixed: None },
        ]);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn remaining_bytes_must_be_last() {
        let spec = spec_with(vec![
            FieldSpec { order: 0, name: "a", directive: FieldDirective::RemainingBytes, fixed: None },
            FieldSpec {
                order: 1,
                name: "b",
                directive: FieldDirective::BigEndianInt { bytes: 1 },
                fixed: None,
            },
        ]);
        assert!(matches!(spec.validate(), Err(CodecError::Configuration(_))));
    }
}
