use super::*;
use proptest::prelude::*;

#[test]
fn test_decode_unmasked_hello() {
    let bytes = [0x81, 0x05, b'H', b'e', b'l', b'l', b'o'];
    let (frame, consumed) = decode(&bytes).unwrap().unwrap();
    assert_eq!(consumed, 7);
    assert!(frame.fin);
    assert_eq!(frame.opcode, OpCode::Text);
    assert!(!frame.is_masked());
    assert_eq!(frame.payload, b"Hello");
}

#[test]
fn test_decode_masked_hello() {
    let bytes = [
        0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58,
    ];
    let (frame, consumed) = decode(&bytes).unwrap().unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(frame.mask_key, Some([0x37, 0xfa, 0x21, 0x3d]));
    assert_eq!(frame.payload, b"Hello");
}

#[test]
fn test_decode_incomplete_at_every_prefix() {
    let bytes = Frame::text(&"x".repeat(300)).masked([1, 2, 3, 4]).encode();
    for cut in 0..bytes.len() {
        assert_eq!(decode(&bytes[..cut]).unwrap(), None, "prefix of {cut} bytes");
    }
    assert!(decode(&bytes).unwrap().is_some());
}

#[test]
fn test_decode_64bit_length_rejected() {
    let bytes = [0x81, 0x7F, 0, 0, 0, 0, 0, 1, 0, 0];
    assert_eq!(decode(&bytes), Err(FrameError::UnsupportedPayloadLength));
}

#[test]
fn test_decode_64bit_length_rejected_before_length_bytes_arrive() {
    assert_eq!(decode(&[0x81, 0xFF]), Err(FrameError::UnsupportedPayloadLength));
}

#[test]
fn test_decode_coalesced_frames() {
    let mut bytes = Frame::text("one").masked([9, 9, 9, 9]).encode();
    bytes.extend(Frame::text("two").masked([7, 7, 7, 7]).encode());

    let (first, used) = decode(&bytes).unwrap().unwrap();
    let (second, rest) = decode(&bytes[used..]).unwrap().unwrap();
    assert_eq!(first.payload, b"one");
    assert_eq!(second.payload, b"two");
    assert_eq!(used + rest, bytes.len());
}

#[test]
fn test_encode_header_sizes() {
    assert_eq!(encode_text("").len(), 2);
    assert_eq!(encode_text(&"a".repeat(125)).len(), 2 + 125);
    assert_eq!(encode_text(&"a".repeat(126)).len(), 4 + 126);
    assert_eq!(encode_text(&"a".repeat(65535)).len(), 4 + 65535);
    assert_eq!(encode_text(&"a".repeat(65536)).len(), 10 + 65536);
}

#[test]
fn test_encode_header_bytes() {
    let short = encode_text("hi");
    assert_eq!(&short[..2], &[0x81, 0x02]);

    let medium = encode_text(&"a".repeat(300));
    assert_eq!(&medium[..4], &[0x81, 126, 0x01, 0x2C]);

    let long = encode_text(&"a".repeat(65536));
    assert_eq!(&long[..10], &[0x81, 127, 0, 0, 0, 0, 0, 1, 0, 0]);
}

#[test]
fn test_encode_never_masks_server_frames() {
    let bytes = encode_text(&"z".repeat(200));
    assert_eq!(bytes[1] & 0x80, 0);
}

#[test]
fn test_round_trip_length_boundaries() {
    for len in [0usize, 1, 125, 126, 65535] {
        let text = "q".repeat(len);
        let (frame, consumed) = decode(&encode_text(&text)).unwrap().unwrap();
        assert_eq!(consumed, encode_text(&text).len());
        assert_eq!(frame.payload, text.as_bytes(), "length {len}");
    }
}

#[test]
fn test_round_trip_beyond_16bit_is_a_known_limitation() {
    let encoded = encode_text(&"q".repeat(65536));
    assert_eq!(decode(&encoded), Err(FrameError::UnsupportedPayloadLength));
}

#[test]
fn test_into_message() {
    let text = Frame::text("hello").into_message().unwrap();
    assert_eq!(text, Message::Text(b"hello".to_vec()));

    let close = Frame {
        fin: true,
        opcode: OpCode::Close,
        mask_key: None,
        payload: vec![0x03, 0xE8],
    };
    assert_eq!(close.into_message().unwrap(), Message::Close);

    for opcode in [OpCode::Ping, OpCode::Pong, OpCode::Binary, OpCode::Continuation, OpCode::Reserved(3)] {
        let frame = Frame {
            fin: true,
            opcode,
            mask_key: None,
            payload: Vec::new(),
        };
        assert_eq!(frame.into_message().unwrap(), Message::Ignored(opcode));
    }
}

#[test]
fn test_fragmented_text_rejected() {
    let mut frame = Frame::text("part");
    frame.fin = false;
    assert_eq!(frame.into_message(), Err(FrameError::Fragmented));
}

#[test]
fn test_opcode_conversions() {
    for raw in 0u8..16 {
        assert_eq!(u8::from(OpCode::from(raw)), raw);
    }
    assert_eq!(OpCode::from(0x89), OpCode::Ping);
}

proptest! {
    #[test]
    fn prop_masked_frames_decode_to_payload(
        payload in proptest::collection::vec(any::<u8>(), 0..2048),
        key in any::<u32>(),
    ) {
        let key = key.to_be_bytes();
        let frame = Frame {
            fin: true,
            opcode: OpCode::Text,
            mask_key: Some(key),
            payload: payload.clone(),
        };
        let (decoded, consumed) = decode(&frame.encode()).unwrap().unwrap();
        prop_assert_eq!(consumed, frame.encode().len());
        prop_assert_eq!(decoded.payload, payload);
        prop_assert_eq!(decoded.mask_key, Some(key));
    }

    #[test]
    fn prop_mask_is_an_involution(
        payload in proptest::collection::vec(any::<u8>(), 0..512),
        key in any::<[u8; 4]>(),
    ) {
        let mut data = payload.clone();
        apply_mask(&mut data, key);
        apply_mask(&mut data, key);
        prop_assert_eq!(data, payload);
    }

    #[test]
    fn prop_text_round_trip(text in "\\PC{0,400}") {
        let (frame, _) = decode(&encode_text(&text)).unwrap().unwrap();
        prop_assert_eq!(String::from_utf8(frame.payload).unwrap(), text);
    }
}
