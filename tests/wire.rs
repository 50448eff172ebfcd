use bytes::BytesMut;
use cubeserv::network::frame::FrameCodec;
use cubeserv::network::wire::{self, var, ToWire, Wire};
use proptest::prelude::*;

fn encoded(value: impl ToWire) -> BytesMut {
    let mut buf = BytesMut::new();
    value.encode(&mut buf);
    buf
}

proptest! {
    #[test]
    fn varints_round_trip(n in any::<i32>()) {
        let buf = encoded(var(n));
        prop_assert_eq!(buf.len(), wire::var_len(n));
        prop_assert!(buf.len() <= 5);
        let (decoded, rest) = wire::varint(&buf).unwrap();
        prop_assert_eq!(decoded, n);
        prop_assert!(rest.is_empty());
    }

    #[test]
    fn varlongs_round_trip(n in any::<i64>()) {
        let buf = encoded(var(n));
        prop_assert!(buf.len() <= 10);
        let (decoded, rest) = wire::varlong(&buf).unwrap();
        prop_assert_eq!(decoded, n);
        prop_assert!(rest.is_empty());
    }

    #[test]
    fn strings_round_trip(s in ".{0,64}", tail in any::<u8>()) {
        let mut buf = encoded(s.as_str());
        buf.extend_from_slice(&[tail]);
        let (decoded, rest) = <&str>::decode(&buf).unwrap();
        prop_assert_eq!(decoded, s.as_str());
        prop_assert_eq!(rest, &[tail][..]);
    }

    #[test]
    fn truncated_varints_ask_for_more(n in 128..i32::MAX) {
        let buf = encoded(var(n));
        let err = wire::varint(&buf[..buf.len() - 1]).unwrap_err();
        prop_assert!(err.is_incomplete());
    }

    #[test]
    fn frames_survive_arbitrary_splits(
        payload in proptest::collection::vec(any::<u8>(), 0..600),
        threshold in prop_oneof![Just(-1), 0..300i32],
        split in any::<prop::sample::Index>(),
    ) {
        let mut codec = FrameCodec::new(1 << 20);
        codec.set_compression(threshold);
        let frame = codec.encode(&payload).unwrap();
        let at = split.index(frame.len() + 1);

        let mut inbound = BytesMut::from(&frame[..at]);
        if at < frame.len() {
            prop_assert_eq!(codec.decode(&mut inbound).unwrap(), None);
        }
        inbound.extend_from_slice(&frame[at..]);
        let decoded = codec.decode(&mut inbound).unwrap().unwrap();
        prop_assert_eq!(&decoded[..], &payload[..]);
        prop_assert!(inbound.is_empty());
    }
}

#[test]
fn known_varint_encodings() {
    assert_eq!(&encoded(var(0i32))[..], &[0x00]);
    assert_eq!(&encoded(var(300i32))[..], &[0xac, 0x02]);
    assert_eq!(&encoded(var(-1i32))[..], &[0xff, 0xff, 0xff, 0xff, 0x0f]);
    assert_eq!(encoded(var(-1i64)).len(), 10);
}

#[test]
fn oversized_varints_are_rejected() {
    let err = wire::varint(&[0xff; 6]).unwrap_err();
    assert!(!err.is_incomplete());
}

#[test]
fn string_lengths_past_the_buffer_are_errors() {
    let mut buf = encoded(var(10i32));
    buf.extend_from_slice(b"abc");
    assert!(wire::str(&buf).unwrap_err().is_incomplete());
}
