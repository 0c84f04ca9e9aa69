use super::*;

// -------------------- Fixed-width integers --------------------

#[test]
fn fixed32_roundtrip() {
    let mut buf = Vec::new();
    put_fixed32(&mut buf, 0xDEAD_BEEF);
    assert_eq!(buf, vec![0xEF, 0xBE, 0xAD, 0xDE]);

    let mut view = buf.as_slice();
    assert_eq!(get_fixed32(&mut view), Some(0xDEAD_BEEF));
    assert!(view.is_empty());
}

#[test]
fn fixed64_roundtrip() {
    let mut buf = Vec::new();
    put_fixed64(&mut buf, 0x0102_0304_0506_0708);
    assert_eq!(buf, vec![0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);

    let mut view = buf.as_slice();
    assert_eq!(get_fixed64(&mut view), Some(0x0102_0304_0506_0708));
    assert!(view.is_empty());
}

#[test]
fn fixed_decode_truncated() {
    let mut view: &[u8] = &[1, 2, 3];
    assert_eq!(get_fixed32(&mut view), None);

    let mut view: &[u8] = &[1, 2, 3, 4, 5, 6, 7];
    assert_eq!(get_fixed64(&mut view), None);
}

#[test]
fn fixed_decode_consumes_in_sequence() {
    let mut buf = Vec::new();
    put_fixed32(&mut buf, 7);
    put_fixed64(&mut buf, 9);
    put_fixed32(&mut buf, 11);

    let mut view = buf.as_slice();
    assert_eq!(get_fixed32(&mut view), Some(7));
    assert_eq!(get_fixed64(&mut view), Some(9));
    assert_eq!(get_fixed32(&mut view), Some(11));
    assert!(view.is_empty());
}

// -------------------- Varint32 --------------------

#[test]
fn varint_single_byte_values() {
    for v in [0u32, 1, 42, 127] {
        let mut buf = Vec::new();
        put_varint32(&mut buf, v);
        assert_eq!(buf.len(), 1, "value {} should encode in one byte", v);

        let mut view = buf.as_slice();
        assert_eq!(get_varint32(&mut view), Some(v));
        assert!(view.is_empty());
    }
}

#[test]
fn varint_boundary_lengths() {
    // Each boundary is the smallest value requiring one more byte.
    let cases: &[(u32, usize)] = &[
        (127, 1),
        (128, 2),
        (16_383, 2),
        (16_384, 3),
        (2_097_151, 3),
        (2_097_152, 4),
        (268_435_455, 4),
        (268_435_456, 5),
        (u32::MAX, 5),
    ];
    for &(v, expected_len) in cases {
        let mut buf = Vec::new();
        put_varint32(&mut buf, v);
        assert_eq!(buf.len(), expected_len, "encoded length of {}", v);

        let mut view = buf.as_slice();
        assert_eq!(get_varint32(&mut view), Some(v));
        assert!(view.is_empty());
    }
}

#[test]
fn varint_truncated_input() {
    // A lone continuation byte has no terminator.
    let mut view: &[u8] = &[0x80];
    assert_eq!(get_varint32(&mut view), None);

    let mut view: &[u8] = &[0x80, 0x80, 0x80];
    assert_eq!(get_varint32(&mut view), None);

    let mut view: &[u8] = &[];
    assert_eq!(get_varint32(&mut view), None);
}

#[test]
fn varint_overlong_encoding_rejected() {
    // Six bytes all with the continuation bit set: more than MAX_VARINT32_LEN.
    let mut view: &[u8] = &[0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
    assert_eq!(get_varint32(&mut view), None);
}

#[test]
fn varint_leaves_trailing_bytes() {
    let mut buf = Vec::new();
    put_varint32(&mut buf, 300);
    buf.extend_from_slice(b"tail");

    let mut view = buf.as_slice();
    assert_eq!(get_varint32(&mut view), Some(300));
    assert_eq!(view, b"tail");
}

// -------------------- CRC32 --------------------

#[test]
fn crc32_known_vector() {
    // The canonical IEEE 802.3 check value.
    assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
}

#[test]
fn crc32_empty_input() {
    assert_eq!(crc32(b""), 0);
}

#[test]
fn crc32_detects_single_bit_flip() {
    let data = b"the quick brown fox".to_vec();
    let original = crc32(&data);
    for byte in 0..data.len() {
        for bit in 0..8 {
            let mut flipped = data.clone();
            flipped[byte] ^= 1 << bit;
            assert_ne!(crc32(&flipped), original, "flip at byte {} bit {}", byte, bit);
        }
    }
}

// -------------------- Shared prefix --------------------

#[test]
fn shared_prefix_cases() {
    assert_eq!(shared_prefix_len(b"", b""), 0);
    assert_eq!(shared_prefix_len(b"", b"abc"), 0);
    assert_eq!(shared_prefix_len(b"abc", b"abc"), 3);
    assert_eq!(shared_prefix_len(b"apple", b"apples"), 5);
    assert_eq!(shared_prefix_len(b"apple", b"apply"), 4);
    assert_eq!(shared_prefix_len(b"banana", b"carrot"), 0);
}
