//! Describer: renders a decoded value as a human-readable tree.
//!
//! `#[derive(WireCodec)]` generates `describe_fields` for every annotated
//! type, returning a flat list of `(name, DescribedValue)` pairs; this
//! module turns that into the indented tree text.

const MAX_DEPTH: usize = 10;

/// A single field's rendered shape, produced by the generated
/// `describe_fields` method. Integer widths carry their bit width so the hex
/// form can be padded to 2/4/8/16 digits.
#[derive(Debug, Clone, PartialEq)]
pub enum DescribedValue {
    Int { bits: u8, value: u64 },
    Bytes(Vec<u8>),
    Text(String),
    Nested(Vec<(&'static str, DescribedValue)>),
    NestedSeq(Vec<Vec<(&'static str, DescribedValue)>>),
    Null,
}

fn hex_digits_for(bits: u8) -> usize {
    match bits {
        0..=8 => 2,
        9..=16 => 4,
        17..=32 => 8,
        _ => 16,
    }
}

fn render_value(name: &str, value: &DescribedValue, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    if depth >= MAX_DEPTH {
        out.push_str(&format!("{indent}{name}: <max depth reached>\n"));
        return;
    }
    match value {
        DescribedValue::Int { bits, value } => {
            let digits = hex_digits_for(*bits);
            out.push_str(&format!("{indent}{name}: 0x{value:0digits$X} ({value})\n"));
        }
        DescribedValue::Bytes(bytes) => {
            if bytes.is_empty() {
                // Null sequences are suppressed entirely.
                return;
            }
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            out.push_str(&format!("{indent}{name}: 0x[{hex}]\n"));
        }
        DescribedValue::Text(s) => {
            out.push_str(&format!("{indent}{name}: \"{s}\"\n"));
        }
        DescribedValue::Nested(fields) => {
            out.push_str(&format!("{indent}{name}:\n"));
            for (field_name, field_value) in fields {
                render_value(field_name, field_value, depth + 1, out);
            }
        }
        DescribedValue::NestedSeq(items) => {
            if items.is_empty() {
                // Null sequences are suppressed entirely.
                return;
            }
            out.push_str(&format!("{indent}{name}:\n"));
            for (i, fields) in items.iter().enumerate() {
                let item_indent = "  ".repeat(depth + 1);
                out.push_str(&format!("{item_indent}[{i}]:\n"));
                for (field_name, field_value) in fields {
                    render_value(field_name, field_value, depth + 2, out);
                }
            }
        }
        DescribedValue::Null => {
            out.push_str(&format!("{indent}{name}: <null>\n"));
        }
    }
}

/// Renders the top-level field list of a decoded value as an indented tree.
pub fn describe_fields(fields: &[(&'static str, DescribedValue)]) -> String {
    let mut out = String::new();
    for (name, value) in fields {
        render_value(name, value, 0, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_renders_hex_and_decimal() {
        let fields = vec![("width", DescribedValue::Int { bits: 16, value: 3 })];
        assert_eq!(describe_fields(&fields), "width: 0x0003 (3)\n");
    }

    #[test]
    fn byte_array_renders_hex_brackets() {
        let fields = vec![("payload", DescribedValue::Bytes(vec![0xDE, 0xAD]))];
        assert_eq!(describe_fields(&fields), "payload: 0x[DEAD]\n");
    }

    #[test]
    fn empty_sequence_is_suppressed() {
        let fields = vec![("payload", DescribedValue::Bytes(vec![]))];
        assert_eq!(describe_fields(&fields), "");
    }

    #[test]
    fn null_scalar_renders_placeholder() {
        let fields = vec![("maybe", DescribedValue::Null)];
        assert_eq!(describe_fields(&fields), "maybe: <null>\n");
    }

    #[test]
    fn nested_struct_indents_by_two_spaces_per_depth() {
        let fields = vec![(
            "child",
            DescribedValue::Nested(vec![("b", DescribedValue::Int { bits: 8, value: 5 })]),
        )];
        assert_eq!(describe_fields(&fields), "child:\n  b: 0x05 (5)\n");
    }

    #[test]
    fn string_renders_quoted() {
        let fields = vec![("name", DescribedValue::Text("GOOD".to_string()))];
        assert_eq!(describe_fields(&fields), "name: \"GOOD\"\n");
    }
}
