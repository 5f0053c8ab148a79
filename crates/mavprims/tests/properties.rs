use std::sync::Arc;

use mavprims::frame::{
    decode_message, encode_to_bytes, DecodeError, Message, Session, StreamParser,
};
use mavprims::schema::{FieldDef, MessageDescriptor, MessageRegistry};
use mavprims::wire::{FieldKind, ProtocolVersion, Scalar, Value};
use proptest::prelude::*;

#[derive(Clone, Debug)]
struct Case {
    version: ProtocolVersion,
    registry: Arc<MessageRegistry>,
    message: Message,
    sequence: u8,
    system_id: u8,
    component_id: u8,
}

impl Case {
    fn session(&self) -> Session {
        let mut session = Session::new(self.system_id, self.component_id);
        session.set_sequence(self.sequence);
        session
    }

    fn frame(&self) -> Vec<u8> {
        encode_to_bytes(self.version, &self.message, &self.session())
            .unwrap()
            .to_vec()
    }
}

/// Finite floats only, so decoded values compare equal.
fn scalar(kind: FieldKind, bits: u64) -> Scalar {
    match kind {
        FieldKind::Char => Scalar::Char(bits as u8),
        FieldKind::U8 => Scalar::U8(bits as u8),
        FieldKind::I8 => Scalar::I8(bits as i8),
        FieldKind::U16 => Scalar::U16(bits as u16),
        FieldKind::I16 => Scalar::I16(bits as i16),
        FieldKind::U32 => Scalar::U32(bits as u32),
        FieldKind::I32 => Scalar::I32(bits as i32),
        FieldKind::U64 => Scalar::U64(bits),
        FieldKind::I64 => Scalar::I64(bits as i64),
        FieldKind::F32 => Scalar::F32((bits as i32) as f32 / 8.0),
        FieldKind::F64 => Scalar::F64((bits as i64) as f64 / 1024.0),
    }
}

fn kind_strategy() -> impl Strategy<Value = FieldKind> {
    prop::sample::select(FieldKind::ALL.to_vec())
}

/// v2 ids cover the full 24-bit range, with narrow ids still drawn often.
fn version_and_id_strategy() -> impl Strategy<Value = (ProtocolVersion, u32)> {
    prop_oneof![Just(ProtocolVersion::V1), Just(ProtocolVersion::V2)].prop_flat_map(|version| {
        let max = version.max_message_id();
        let id = if max > 0xFF {
            prop_oneof![0u32..=0xFF, 0x100..=max].boxed()
        } else {
            (0u32..=max).boxed()
        };
        (Just(version), id)
    })
}

/// Up to 8 fields of up to 3 elements keeps every layout under 255 bytes.
fn case_strategy() -> impl Strategy<Value = Case> {
    prop::collection::vec((kind_strategy(), 0usize..=3), 1..8).prop_flat_map(|shape| {
        let count = shape.len();
        let elements: usize = shape.iter().map(|(_, len)| (*len).max(1)).sum();
        (
            Just(shape),
            Just((0..count).collect::<Vec<usize>>()).prop_shuffle(),
            prop::collection::vec(prop_oneof![Just(0u64), any::<u64>()], elements),
            version_and_id_strategy(),
            any::<u8>(),
            any::<(u8, u8, u8)>(),
        )
            .prop_map(
                |(shape, order, bits, (version, id), salt, (sequence, system_id, component_id))| {
                    let fields: Vec<FieldDef> = shape
                        .iter()
                        .enumerate()
                        .map(|(i, &(kind, len))| {
                            if len == 0 {
                                FieldDef::new(format!("f{i}"), kind)
                            } else {
                                FieldDef::array(format!("f{i}"), kind, len)
                            }
                        })
                        .collect();

                    let mut bits = bits.into_iter();
                    let values: Vec<Value> = fields
                        .iter()
                        .map(|field| {
                            let slot = field.slot();
                            let items: Vec<Scalar> = bits
                                .by_ref()
                                .take(slot.element_count())
                                .map(|b| scalar(field.kind, b))
                                .collect();
                            if slot.is_array() {
                                Value::Array(items)
                            } else {
                                Value::Scalar(items[0])
                            }
                        })
                        .collect();

                    let descriptor =
                        MessageDescriptor::new(id, "GENERATED", salt, fields, order, None).unwrap();
                    let mut registry = MessageRegistry::new();
                    let descriptor = registry.register(descriptor).unwrap();
                    let message = Message::from_values(descriptor, values).unwrap();

                    Case {
                        version,
                        registry: Arc::new(registry),
                        message,
                        sequence,
                        system_id,
                        component_id,
                    }
                },
            )
    })
}

/// Byte positions covered by the checksum other than the length byte and id.
fn flippable_positions(version: ProtocolVersion, frame: &[u8]) -> Vec<usize> {
    let (fixed, header_len) = match version {
        ProtocolVersion::V1 => (2..5, 6),
        ProtocolVersion::V2 => (2..7, 10),
    };
    let payload = header_len..frame.len() - 2;
    fixed.chain(payload).collect()
}

proptest! {
    #[test]
    fn prop_encode_decode_roundtrip(case in case_strategy()) {
        let frame = case.frame();
        let received = decode_message(case.version, &case.registry, &frame).unwrap();

        prop_assert_eq!(&received.message, &case.message);
        prop_assert_eq!(received.header.sequence, case.sequence);
        prop_assert_eq!(received.header.system_id, case.system_id);
        prop_assert_eq!(received.header.component_id, case.component_id);
        prop_assert_eq!(received.header.message_id, case.message.id());
        prop_assert!(case.message.id() <= case.version.max_message_id());
    }

    #[test]
    fn prop_reencode_is_stable(case in case_strategy()) {
        let frame = case.frame();
        let received = decode_message(case.version, &case.registry, &frame).unwrap();
        let again = encode_to_bytes(case.version, &received.message, &case.session()).unwrap();
        prop_assert_eq!(again.as_ref(), frame.as_slice());
    }

    #[test]
    fn prop_v2_payload_never_longer_than_layout(case in case_strategy()) {
        let frame = case.frame();
        let layout = case.message.descriptor().payload_len();
        let carried = usize::from(frame[1]);
        match case.version {
            ProtocolVersion::V1 => prop_assert_eq!(carried, layout),
            ProtocolVersion::V2 => {
                prop_assert!(carried >= 1);
                prop_assert!(carried <= layout.max(1));
                if carried > 1 {
                    prop_assert_ne!(frame[frame.len() - 3], 0);
                }
            }
        }
    }

    #[test]
    fn prop_single_bit_flip_fails_checksum(
        case in case_strategy(),
        pick in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut frame = case.frame();
        let positions = flippable_positions(case.version, &frame);
        let position = positions[pick.index(positions.len())];
        frame[position] ^= 1 << bit;

        let err = decode_message(case.version, &case.registry, &frame).unwrap_err();
        let is_checksum_mismatch = matches!(err, DecodeError::ChecksumMismatch { .. });
        prop_assert!(is_checksum_mismatch, "unexpected error: {:?}", err);
    }

    #[test]
    fn prop_fragmentation_independent(
        case in case_strategy(),
        repeat in 1usize..4,
        cuts in prop::collection::vec(1usize..16, 1..32),
    ) {
        let single = case.frame();
        let wire: Vec<u8> = std::iter::repeat(single).take(repeat).flatten().collect();

        let mut whole = StreamParser::new(case.version, Arc::clone(&case.registry));
        let expected = whole.feed(&wire);

        let mut pieces = StreamParser::new(case.version, Arc::clone(&case.registry));
        let mut events = Vec::new();
        let mut rest = wire.as_slice();
        let mut sizes = cuts.iter().cycle();
        while !rest.is_empty() {
            let size = sizes.next().copied().unwrap_or(1).min(rest.len());
            let (chunk, tail) = rest.split_at(size);
            events.extend(pieces.feed(chunk));
            rest = tail;
        }

        prop_assert_eq!(events.len(), repeat);
        prop_assert_eq!(&events, &expected);
        prop_assert_eq!(pieces.stats(), whole.stats());
    }

    #[test]
    fn prop_resync_after_garbage(
        case in case_strategy(),
        garbage in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let marker = case.version.marker();
        let garbage: Vec<u8> = garbage.into_iter().filter(|&b| b != marker).collect();
        let mut wire = garbage.clone();
        wire.extend_from_slice(&case.frame());

        let mut parser = StreamParser::new(case.version, Arc::clone(&case.registry));
        let events = parser.feed(&wire);

        prop_assert_eq!(events.len(), garbage.len() + 1);
        for (event, byte) in events.iter().zip(&garbage) {
            let bad = event.as_malformed().unwrap();
            prop_assert_eq!(&bad.reason, &DecodeError::BadPrefix(*byte));
        }
        let last = events.last().and_then(|event| event.as_message()).unwrap();
        prop_assert_eq!(&last.message, &case.message);
        prop_assert_eq!(parser.stats().receive_errors, garbage.len() as u64);
    }
}
