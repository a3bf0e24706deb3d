use wire_codec::*;

#[derive(WireCodec, Debug, Default, PartialEq, Clone)]
struct MixedEndianFrame {
    #[wire(fixed = [0x7F, 0x80])]
    magic: u16,
    #[wire(big = 3)]
    start: u32,
    #[wire(little = 3)]
    end: u32,
    #[wire(fixed = [0x55, 0xAA])]
    trailer: u16,
}

#[derive(WireCodec, Debug, Default, PartialEq)]
struct Packed3Bits {
    #[wire(bits = 3)]
    a: u8,
    #[wire(bits = 2)]
    b: u8,
    #[wire(bits = 3)]
    c: u8,
}

#[derive(WireCodec, Debug, Default, PartialEq, Clone)]
struct Block {
    #[wire(fixed = [0x7F, 0x80])]
    magic: u16,
    #[wire(big = 3)]
    start: u32,
    #[wire(little = 3)]
    end: u32,
    #[wire(fixed = [0xAA, 0x55])]
    trailer: u16,
}

#[derive(WireCodec, Debug, Default, PartialEq)]
struct Batch {
    #[wire(fixed = [0x55])]
    start: u8,
    #[wire(big = 2)]
    how_many: u16,
    #[wire(count_with = "block_count")]
    blocks: Vec<Block>,
    #[wire(fixed = [0xAA])]
    end: u8,
}

impl Batch {
    fn block_count(&self) -> usize {
        self.how_many as usize
    }
}

#[derive(WireCodec, Debug, Default, PartialEq)]
struct Message {
    #[wire(fixed = [0x12, 0x34])]
    header: u16,
    #[wire(terminator = 0)]
    body: Vec<u8>,
    #[wire(fixed = [0x56, 0x78])]
    trailer: u16,
}

#[derive(WireCodec, Debug, Default, PartialEq, Clone)]
#[wire(specialise_with = "is_special", variant = "SpecialParent")]
struct GenericParent {
    #[wire(big = 2)]
    type_number: u16,
    #[wire(big = 2)]
    generic_data: u16,
}

impl GenericParent {
    fn is_special(&self) -> bool {
        self.type_number == 3
    }
}

#[derive(WireCodec, Debug, Default, PartialEq, Clone)]
struct SpecialParent {
    #[wire(big = 2)]
    type_number: u16,
    #[wire(big = 2)]
    generic_data: u16,
    #[wire(ascii = 4)]
    fixed_string: String,
}

#[derive(WireCodec, Debug, Default, PartialEq)]
struct Envelope {
    #[wire(child, specialised)]
    parent: Specialised<GenericParent, SpecialParent>,
    #[wire(big = 1)]
    checksum: u8,
}

#[derive(WireCodec, Debug, Default, PartialEq)]
struct FixedAcrossDirectives {
    #[wire(little = 2, fixed = [0x55, 0xAA])]
    little_fixed: u16,
    #[wire(bytes = 3, fixed = [1, 2, 3])]
    bytes_fixed: Vec<u8>,
    #[wire(ascii = 2, fixed = [b'O', b'K'])]
    ascii_fixed: String,
}

#[derive(WireCodec, Debug, Default, PartialEq)]
struct LenPrefixedPayload {
    #[wire(big = 1)]
    len: u8,
    #[wire(len_with = "payload_len")]
    payload: Vec<u8>,
}

impl LenPrefixedPayload {
    fn payload_len(&self) -> usize {
        self.len as usize
    }
}

#[test]
fn mixed_endian_frame_round_trips_and_matches_reference_bytes() {
    // Fixed fields are written as their declared constant regardless of the
    // in-memory value, so a faithful round trip sets them to that constant.
    let frame = MixedEndianFrame { magic: 0x7F80, start: 0x123456, end: 0x234567, trailer: 0x55AA };
    let bytes = to_bytes(&frame);
    assert_eq!(bytes, vec![0x7F, 0x80, 0x12, 0x34, 0x56, 0x67, 0x45, 0x23, 0x55, 0xAA]);

    let (decoded, ok) = from_bytes::<MixedEndianFrame>(&bytes);
    assert!(ok);
    assert_eq!(decoded, frame);
}

#[test]
fn fixed_fields_are_tolerated_on_read() {
    let data = [0xAB, 0xCD, 0x12, 0x34, 0x56, 0x67, 0x45, 0x23, 0xBC, 0xDE];
    let (decoded, ok) = from_bytes::<MixedEndianFrame>(&data);
    assert!(ok);
    assert_eq!(decoded.magic, 0xABCD);
    assert_eq!(decoded.start, 0x123456);
    assert_eq!(decoded.end, 0x234567);
    assert_eq!(decoded.trailer, 0xBCDE);
}

#[test]
fn fixed_value_is_written_regardless_of_in_memory_value() {
    let frame = MixedEndianFrame { magic: 0xFFFF, start: 0, end: 0, trailer: 0x1111 };
    let bytes = to_bytes(&frame);
    assert_eq!(&bytes[0..2], &[0x7F, 0x80]);
    assert_eq!(&bytes[8..10], &[0x55, 0xAA]);
}

#[test]
fn sub_byte_packing_matches_reference_byte() {
    let packed = Packed3Bits { a: 2, b: 1, c: 1 };
    let bytes = to_bytes(&packed);
    assert_eq!(bytes, vec![0x49]);

    let (decoded, ok) = from_bytes::<Packed3Bits>(&bytes);
    assert!(ok);
    assert_eq!(decoded, packed);
}

#[test]
fn variable_repeat_with_markers_matches_reference_bytes() {
    let block = Block { magic: 0, start: 0x123456, end: 0x234567, trailer: 0 };
    let batch = Batch { start: 0, how_many: 3, blocks: vec![block.clone(), block.clone(), block], end: 0 };
    let bytes = to_bytes(&batch);

    let mut expected = vec![0x55, 0x00, 0x03];
    for _ in 0..3 {
        expected.extend_from_slice(&[0x7F, 0x80, 0x12, 0x34, 0x56, 0x67, 0x45, 0x23, 0xAA, 0x55]);
    }
    expected.push(0xAA);
    assert_eq!(bytes, expected);
    assert_eq!(bytes.len(), 34);

    let (decoded, ok) = from_bytes::<Batch>(&bytes);
    assert!(ok);
    assert_eq!(decoded.blocks.len(), 3);
    assert_eq!(decoded.how_many, 3);
}

#[test]
fn terminator_bounded_string_round_trips() {
    let message = Message { header: 0, body: b"Hello, world!".to_vec(), trailer: 0 };
    let bytes = to_bytes(&message);

    let mut expected = vec![0x12, 0x34];
    expected.extend_from_slice(b"Hello, world!");
    expected.push(0x00);
    expected.extend_from_slice(&[0x56, 0x78]);
    assert_eq!(bytes, expected);

    let (decoded, ok) = from_bytes::<Message>(&bytes);
    assert!(ok);
    assert_eq!(decoded.body, b"Hello, world!\0".to_vec());
}

#[test]
fn terminator_insertion_does_not_duplicate_existing_stop() {
    let with_stop = Message { header: 0, body: b"Hi\0".to_vec(), trailer: 0 };
    let bytes = to_bytes(&with_stop);
    assert_eq!(&bytes[2..6], b"Hi\0\x56");
}

#[test]
fn specialisation_redirects_to_variant_on_type_match() {
    let data = [0x00, 0x03, 0x12, 0x34, b'G', b'O', b'O', b'D'];
    let (outcome, ok) = from_bytes_specialised::<GenericParent>(&data);
    assert!(ok);
    match outcome {
        Specialised::Variant(special) => {
            assert_eq!(special.type_number, 3);
            assert_eq!(special.generic_data, 0x1234);
            assert_eq!(special.fixed_string, "GOOD");
        }
        Specialised::Base(_) => panic!("expected specialiser to redirect to SpecialParent"),
    }
}

#[test]
fn specialisation_keeps_base_when_type_does_not_match() {
    let data = [0x00, 0x01, 0x12, 0x34];
    let (outcome, ok) = from_bytes_specialised::<GenericParent>(&data);
    assert!(ok);
    match outcome {
        Specialised::Base(base) => {
            assert_eq!(base.type_number, 1);
            assert_eq!(base.generic_data, 0x1234);
        }
        Specialised::Variant(_) => panic!("did not expect specialiser to redirect"),
    }
}

#[test]
fn under_run_reports_not_ok_and_leaves_defaults() {
    let data = [0x7F, 0x80, 0x12, 0x34];
    let (decoded, ok) = from_bytes::<MixedEndianFrame>(&data);
    assert!(!ok);
    assert_eq!(decoded.magic, 0x7F80);
    // Only two of the three `start` bytes are present; the third reads as
    // zero once the reader runs past the end of the input.
    assert_eq!(decoded.start, 0x123400);
    assert_eq!(decoded.end, 0);
    assert_eq!(decoded.trailer, 0);
}

#[test]
fn variable_length_callback_round_trips_declared_count() {
    let payload = LenPrefixedPayload { len: 4, payload: vec![0xDE, 0xAD, 0xBE, 0xEF] };
    let bytes = to_bytes(&payload);
    assert_eq!(bytes, vec![4, 0xDE, 0xAD, 0xBE, 0xEF]);

    let (decoded, ok) = from_bytes::<LenPrefixedPayload>(&bytes);
    assert!(ok);
    assert_eq!(decoded.payload, vec![0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn variable_length_mismatch_between_declared_count_and_array_errors_on_encode() {
    let payload = LenPrefixedPayload { len: 4, payload: vec![0xDE, 0xAD] };
    let result = try_to_bytes(&payload);
    assert!(result.is_err());
}

#[test]
fn length_is_deterministic_from_layout() {
    let a = MixedEndianFrame { magic: 1, start: 2, end: 3, trailer: 4 };
    let b = MixedEndianFrame { magic: 5, start: 6, end: 7, trailer: 8 };
    assert_eq!(to_bytes(&a).len(), to_bytes(&b).len());
    assert_eq!(to_bytes(&a).len(), 10);
}

#[test]
fn specialised_child_field_redirects_to_variant_at_its_own_position() {
    let mut data = vec![0x00, 0x03, 0x12, 0x34];
    data.extend_from_slice(b"GOOD");
    data.push(0xFF);

    let (envelope, ok) = from_bytes::<Envelope>(&data);
    assert!(ok);
    assert_eq!(envelope.checksum, 0xFF);
    match envelope.parent {
        Specialised::Variant(special) => {
            assert_eq!(special.type_number, 3);
            assert_eq!(special.generic_data, 0x1234);
            assert_eq!(special.fixed_string, "GOOD");
        }
        Specialised::Base(_) => panic!("expected the child specialiser to redirect to SpecialParent"),
    }
}

#[test]
fn specialised_child_field_keeps_base_when_type_does_not_match() {
    let data = vec![0x00, 0x01, 0x12, 0x34, 0xFF];
    let (envelope, ok) = from_bytes::<Envelope>(&data);
    assert!(ok);
    assert_eq!(envelope.checksum, 0xFF);
    match envelope.parent {
        Specialised::Base(base) => {
            assert_eq!(base.type_number, 1);
            assert_eq!(base.generic_data, 0x1234);
        }
        Specialised::Variant(_) => panic!("did not expect the child specialiser to redirect"),
    }
}

#[test]
fn specialised_child_field_encodes_whichever_variant_it_holds() {
    let envelope = Envelope {
        parent: Specialised::Base(GenericParent { type_number: 1, generic_data: 0x1234 }),
        checksum: 0xFF,
    };
    assert_eq!(to_bytes(&envelope), vec![0x00, 0x01, 0x12, 0x34, 0xFF]);

    let envelope = Envelope {
        parent: Specialised::Variant(SpecialParent {
            type_number: 3,
            generic_data: 0x1234,
            fixed_string: "GOOD".to_string(),
        }),
        checksum: 0xFF,
    };
    let mut expected = vec![0x00, 0x03, 0x12, 0x34];
    expected.extend_from_slice(b"GOOD");
    expected.push(0xFF);
    assert_eq!(to_bytes(&envelope), expected);
}

#[test]
fn fixed_value_is_written_exactly_for_little_bytes_and_ascii_directives() {
    let value = FixedAcrossDirectives {
        little_fixed: 0xFFFF,
        bytes_fixed: vec![0, 0, 0],
        ascii_fixed: String::new(),
    };
    let bytes = to_bytes(&value);
    // little=2 reverses the declared constant's byte order on the wire.
    assert_eq!(&bytes[0..2], &[0xAA, 0x55]);
    assert_eq!(&bytes[2..5], &[1, 2, 3]);
    assert_eq!(&bytes[5..7], b"OK");
}

#[test]
fn describe_renders_a_readable_tree() {
    let frame = MixedEndianFrame { magic: 0x7F80, start: 0x123456, end: 0x234567, trailer: 0x55AA };
    let text = describe(&frame);
    assert!(text.contains("magic: 0x7F80"));
    assert!(text.contains("start: ") && text.contains("(1193046)"));
}
