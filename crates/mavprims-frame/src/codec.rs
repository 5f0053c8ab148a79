use std::borrow::Cow;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use mavprims_schema::MessageRegistry;
use mavprims_wire::{
    decode_values, encode_values, salted_checksum, Header, ProtocolVersion, Value,
    CHECKSUM_LEN,
};

use crate::error::{DecodeError, Result};
use crate::message::{Message, ReceivedMessage};
use crate::session::Session;

/// Encode `message` as one frame, appending it to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────────────────┬──────────────────┬──────────────┐
/// │ Header (6B / 10B)    │ Payload          │ Checksum     │
/// │ marker first         │ (len bytes)      │ (2B LE)      │
/// └──────────────────────┴──────────────────┴──────────────┘
/// ```
///
/// The header carries the session's current sequence and source ids. The
/// session is not advanced; call [`Session::record_sent`] once the frame
/// has actually gone out. Returns the number of bytes appended. Nothing is
/// appended on error.
pub fn encode_message(
    version: ProtocolVersion,
    message: &Message,
    session: &Session,
    dst: &mut BytesMut,
) -> Result<usize> {
    let descriptor = message.descriptor();
    let declared = message.values();
    let wire_order = descriptor
        .inverse_order_map()
        .iter()
        .map(|&index| &declared[index]);

    let mut payload = BytesMut::with_capacity(descriptor.payload_len());
    encode_values(descriptor.wire_slots(), wire_order, &mut payload)?;

    if version.truncates_payload() {
        let keep = payload
            .iter()
            .rposition(|&byte| byte != 0)
            .map_or(1, |last| last + 1);
        payload.truncate(keep.min(payload.len()));
    }

    let header = Header::new(
        version,
        descriptor.id(),
        payload.len() as u8,
        session.sequence(),
        session.system_id(),
        session.component_id(),
    );

    let start = dst.len();
    dst.reserve(version.header_len() + payload.len() + CHECKSUM_LEN);
    header.encode(version, dst)?;
    dst.put_slice(&payload);
    let crc = salted_checksum(&dst[start + 1..], descriptor.crc_extra());
    dst.put_u16_le(crc);

    Ok(dst.len() - start)
}

/// Encode `message` as one standalone frame.
pub fn encode_to_bytes(
    version: ProtocolVersion,
    message: &Message,
    session: &Session,
) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(version.max_frame_len());
    encode_message(version, message, session, &mut dst)?;
    Ok(dst.freeze())
}

/// Decode one candidate frame.
///
/// `candidate` must hold exactly one frame; the stream parser sizes it from
/// the length byte. The checksum covers the payload as received, so v2
/// frames are verified before their trimmed trailing zeros are restored.
pub fn decode_message(
    version: ProtocolVersion,
    registry: &MessageRegistry,
    candidate: &[u8],
) -> std::result::Result<ReceivedMessage, DecodeError> {
    let header_len = version.header_len();
    let header =
        Header::decode(version, candidate).map_err(|_| DecodeError::HeaderUnderrun {
            needed: header_len,
            available: candidate.len(),
        })?;

    if header.marker != version.marker() {
        return Err(DecodeError::BadMarker(header.marker));
    }

    let declared = usize::from(header.payload_len);
    let carried = candidate.len().saturating_sub(header_len + CHECKSUM_LEN);
    if candidate.len() < header_len + CHECKSUM_LEN || declared != carried {
        return Err(DecodeError::LengthMismatch {
            declared,
            actual: carried,
        });
    }

    let descriptor = registry
        .get(header.message_id)
        .ok_or(DecodeError::UnknownMessageId(header.message_id))?;

    let body_end = header_len + declared;
    let expected = salted_checksum(&candidate[1..body_end], descriptor.crc_extra());
    let received = u16::from_le_bytes([candidate[body_end], candidate[body_end + 1]]);
    if expected != received {
        return Err(DecodeError::ChecksumMismatch { expected, received });
    }

    let full_len = descriptor.payload_len();
    let mut payload = Cow::Borrowed(&candidate[header_len..body_end]);
    if version.truncates_payload() && payload.len() < full_len {
        payload.to_mut().resize(full_len, 0);
    }

    let wire_values =
        decode_values(descriptor.wire_slots(), &payload).map_err(|_| {
            DecodeError::TruncatedPayload {
                needed: full_len,
                available: payload.len(),
            }
        })?;

    let mut by_declared: Vec<Option<Value>> = vec![None; wire_values.len()];
    for (wire, value) in wire_values.into_iter().enumerate() {
        by_declared[descriptor.inverse_order_map()[wire]] = Some(value);
    }
    let values = by_declared.into_iter().flatten().collect();

    Ok(ReceivedMessage {
        header,
        message: Message::from_decoded(Arc::clone(descriptor), values),
        checksum: received,
    })
}

#[cfg(test)]
mod tests {
    use mavprims_schema::MessageDescriptor;
    use mavprims_schema::SchemaError;
    use mavprims_wire::{FieldKind, Scalar};

    use super::*;
    use crate::error::FrameError;

    fn registry() -> MessageRegistry {
        MessageRegistry::from_descriptors([
            MessageDescriptor::builder(0, "PING_LIKE")
                .crc_extra(50)
                .field("value", FieldKind::U8)
                .build()
                .unwrap(),
            MessageDescriptor::builder(300, "STATUS_LIKE")
                .crc_extra(17)
                .field("mode", FieldKind::U8)
                .field("load", FieldKind::U16)
                .field("uptime", FieldKind::U32)
                .array("name", FieldKind::Char, 8)
                .build()
                .unwrap(),
        ])
        .unwrap()
    }

    fn ping(registry: &MessageRegistry, value: u8) -> Message {
        Message::new(Arc::clone(registry.find("PING_LIKE").unwrap()))
            .with("value", value)
            .unwrap()
    }

    #[test]
    fn v1_known_frame() {
        let registry = registry();
        let session = Session::new(42, 150);
        let frame = encode_to_bytes(ProtocolVersion::V1, &ping(&registry, 7), &session).unwrap();

        assert_eq!(&frame[..6], &[0xFE, 0x01, 0x00, 42, 150, 0]);
        assert_eq!(frame[6], 7);
        let crc = salted_checksum(&frame[1..7], 50);
        assert_eq!(crc, 0x3AAF);
        assert_eq!(&frame[7..], &crc.to_le_bytes());

        let received = decode_message(ProtocolVersion::V1, &registry, &frame).unwrap();
        assert_eq!(received.message.get("value"), Some(&Value::from(7u8)));
        assert_eq!(received.system_id(), 42);
        assert_eq!(received.component_id(), 150);
        assert_eq!(received.sequence(), 0);
        assert_eq!(received.checksum, 0x3AAF);
    }

    #[test]
    fn encode_does_not_advance_session() {
        let registry = registry();
        let session = Session::new(1, 1);
        let mut dst = BytesMut::new();
        let written =
            encode_message(ProtocolVersion::V2, &ping(&registry, 1), &session, &mut dst).unwrap();
        assert_eq!(written, dst.len());
        assert_eq!(session.sequence(), 0);
        assert_eq!(session.stats().packets_sent, 0);
    }

    #[test]
    fn encode_appends_after_existing_bytes() {
        let registry = registry();
        let session = Session::default();
        let mut dst = BytesMut::from(&b"xx"[..]);
        let written =
            encode_message(ProtocolVersion::V2, &ping(&registry, 9), &session, &mut dst).unwrap();
        assert_eq!(&dst[..2], b"xx");
        let received = decode_message(ProtocolVersion::V2, &registry, &dst[2..]).unwrap();
        assert_eq!(written, dst.len() - 2);
        assert_eq!(received.message.get("value"), Some(&Value::from(9u8)));
    }

    #[test]
    fn v2_truncates_trailing_zeros() {
        let registry = registry();
        let status = Message::new(Arc::clone(registry.find("STATUS_LIKE").unwrap()))
            .with("uptime", 0x0102_0304u32)
            .unwrap();
        let full_len = status.descriptor().payload_len();
        let frame = encode_to_bytes(ProtocolVersion::V2, &status, &Session::default()).unwrap();

        // uptime leads the wire layout, everything after it is zero.
        assert_eq!(frame[1], 4);
        assert!(usize::from(frame[1]) < full_len);

        let received = decode_message(ProtocolVersion::V2, &registry, &frame).unwrap();
        assert_eq!(received.message, status);
        assert_eq!(received.message.get("name"), Some(&Value::chars(&[0; 8])));
    }

    #[test]
    fn v2_all_zero_payload_keeps_one_byte() {
        let registry = registry();
        let frame =
            encode_to_bytes(ProtocolVersion::V2, &ping(&registry, 0), &Session::default())
                .unwrap();
        assert_eq!(frame[1], 1);
        assert_eq!(frame.len(), 10 + 1 + 2);
        let received = decode_message(ProtocolVersion::V2, &registry, &frame).unwrap();
        assert_eq!(received.message.get("value"), Some(&Value::from(0u8)));
    }

    #[test]
    fn v1_keeps_full_payload() {
        let registry = MessageRegistry::from_descriptors([MessageDescriptor::builder(7, "COUNTER")
            .crc_extra(4)
            .field("count", FieldKind::U32)
            .build()
            .unwrap()])
        .unwrap();
        let counter = Message::new(Arc::clone(registry.get(7).unwrap()));
        let frame = encode_to_bytes(ProtocolVersion::V1, &counter, &Session::default()).unwrap();
        assert_eq!(frame[1], 4);
        assert_eq!(&frame[6..10], &[0, 0, 0, 0]);

        let v2 = encode_to_bytes(ProtocolVersion::V2, &counter, &Session::default()).unwrap();
        assert_eq!(v2[1], 1);
    }

    #[test]
    fn largest_layout_fills_length_byte() {
        let blob = MessageDescriptor::builder(9, "BLOB")
            .crc_extra(3)
            .array("data", FieldKind::U8, 255)
            .build()
            .unwrap();
        let mut registry = MessageRegistry::new();
        let blob = registry.register(blob).unwrap();
        let msg =
            Message::from_values(blob, vec![Value::Array(vec![Scalar::U8(0xFF); 255])]).unwrap();

        for version in [ProtocolVersion::V1, ProtocolVersion::V2] {
            let frame = encode_to_bytes(version, &msg, &Session::default()).unwrap();
            assert_eq!(frame[1], 255);
            assert_eq!(frame.len(), version.max_frame_len());
            let received = decode_message(version, &registry, &frame).unwrap();
            assert_eq!(received.message, msg);
        }

        let err = MessageDescriptor::builder(10, "TOO_BIG")
            .array("data", FieldKind::U8, 256)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::PayloadTooLong { .. }));
    }

    #[test]
    fn v1_rejects_wide_message_id() {
        let registry = registry();
        let status = Message::new(Arc::clone(registry.find("STATUS_LIKE").unwrap()));
        let err = encode_to_bytes(ProtocolVersion::V1, &status, &Session::default()).unwrap_err();
        assert!(matches!(err, FrameError::Wire(_)));
    }

    #[test]
    fn v2_message_id_is_24_bit_le() {
        let registry = registry();
        let status = Message::new(Arc::clone(registry.find("STATUS_LIKE").unwrap()));
        let frame = encode_to_bytes(ProtocolVersion::V2, &status, &Session::default()).unwrap();
        assert_eq!(&frame[7..10], &[0x2C, 0x01, 0x00]);
        let received = decode_message(ProtocolVersion::V2, &registry, &frame).unwrap();
        assert_eq!(received.header.message_id, 300);
    }

    #[test]
    fn failed_encode_leaves_dst_untouched() {
        let registry = registry();
        let status = Message::new(Arc::clone(registry.find("STATUS_LIKE").unwrap()));
        let mut dst = BytesMut::from(&b"abc"[..]);
        assert!(encode_message(ProtocolVersion::V1, &status, &Session::default(), &mut dst).is_err());
        assert_eq!(&dst[..], b"abc");
    }

    #[test]
    fn decode_rejects_short_candidate() {
        let err = decode_message(ProtocolVersion::V2, &registry(), &[0xFD, 1, 0]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::HeaderUnderrun {
                needed: 10,
                available: 3
            }
        );
    }

    #[test]
    fn decode_rejects_wrong_marker() {
        let registry = registry();
        let mut frame = encode_to_bytes(ProtocolVersion::V1, &ping(&registry, 3), &Session::default())
            .unwrap()
            .to_vec();
        frame[0] = 0xFD;
        let err = decode_message(ProtocolVersion::V1, &registry, &frame).unwrap_err();
        assert_eq!(err, DecodeError::BadMarker(0xFD));
    }

    #[test]
    fn decode_rejects_length_mismatch() {
        let registry = registry();
        let mut frame = encode_to_bytes(ProtocolVersion::V1, &ping(&registry, 3), &Session::default())
            .unwrap()
            .to_vec();
        frame.push(0);
        let err = decode_message(ProtocolVersion::V1, &registry, &frame).unwrap_err();
        assert_eq!(
            err,
            DecodeError::LengthMismatch {
                declared: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn decode_rejects_unknown_id() {
        let registry = registry();
        let frame = encode_to_bytes(ProtocolVersion::V1, &ping(&registry, 3), &Session::default())
            .unwrap();
        let err = decode_message(ProtocolVersion::V1, &MessageRegistry::new(), &frame).unwrap_err();
        assert_eq!(err, DecodeError::UnknownMessageId(0));
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        let registry = registry();
        let mut frame = encode_to_bytes(ProtocolVersion::V1, &ping(&registry, 3), &Session::default())
            .unwrap()
            .to_vec();
        frame[6] ^= 0x01;
        let err = decode_message(ProtocolVersion::V1, &registry, &frame).unwrap_err();
        assert!(matches!(err, DecodeError::ChecksumMismatch { .. }));
    }

    #[test]
    fn v1_short_payload_is_truncated_payload() {
        // A v1 frame whose payload is shorter than the layout cannot be padded.
        let registry = MessageRegistry::from_descriptors([MessageDescriptor::builder(5, "WIDE")
            .crc_extra(1)
            .field("a", FieldKind::U32)
            .build()
            .unwrap()])
        .unwrap();
        let mut frame = vec![0xFE, 2, 0, 1, 1, 5, 0xAA, 0xBB];
        let crc = salted_checksum(&frame[1..], 1);
        frame.extend_from_slice(&crc.to_le_bytes());

        let err = decode_message(ProtocolVersion::V1, &registry, &frame).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedPayload {
                needed: 4,
                available: 2
            }
        );
    }

    #[test]
    fn decode_reorders_wire_to_declared() {
        let descriptor = MessageDescriptor::new(
            9,
            "SWAPPED",
            3,
            vec![
                mavprims_schema::FieldDef::new("small", FieldKind::U8),
                mavprims_schema::FieldDef::array("pair", FieldKind::I16, 2),
                mavprims_schema::FieldDef::new("big", FieldKind::U32),
            ],
            vec![2, 1, 0],
            None,
        )
        .unwrap();
        let registry = MessageRegistry::from_descriptors([descriptor]).unwrap();
        let msg = Message::new(Arc::clone(registry.get(9).unwrap()))
            .with("small", 0x11u8)
            .unwrap()
            .with("pair", [-1i16, 2])
            .unwrap()
            .with("big", 0xAABB_CCDDu32)
            .unwrap();

        let frame = encode_to_bytes(ProtocolVersion::V1, &msg, &Session::default()).unwrap();
        // Wire order: big, pair, small.
        assert_eq!(&frame[6..10], &0xAABB_CCDDu32.to_le_bytes());
        assert_eq!(&frame[10..14], &[0xFF, 0xFF, 0x02, 0x00]);
        assert_eq!(frame[14], 0x11);

        let received = decode_message(ProtocolVersion::V1, &registry, &frame).unwrap();
        assert_eq!(received.message, msg);
        assert_eq!(
            received.message.get("pair").and_then(Value::as_array),
            Some(&[Scalar::I16(-1), Scalar::I16(2)][..])
        );
    }
}
